//! Runs the authentication gate for every request and leaves a `SecurityContext`
//! in request extensions.
//!
//! - Never rejects. Handlers that need a caller use `AuthCtxExtractor` (401 when unbound).
//! - If a `SecurityContext` is already present (the layer applied twice, or an outer
//!   layer bound one), it is reused so the first binding wins.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::SecurityContext;
use crate::state::AppState;

/// Apply the authentication gate to every route of `router`.
///
/// Example:
/// ```ignore
/// let app = Router::new().nest("/api/v1", api::v1::routes());
/// let app = middleware::auth::access::apply(app, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8's from_fn cannot take a State extractor, so pass state explicitly with from_fn_with_state
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut ctx = req
        .extensions_mut()
        .remove::<SecurityContext>()
        .unwrap_or_default();

    // Public paths are classified on the full (pre-nesting) path.
    let outcome = state
        .gate
        .evaluate(original_uri.path(), req.headers(), &mut ctx)
        .await;

    tracing::debug!(
        path = %original_uri.path(),
        outcome = ?outcome,
        "authentication gate"
    );

    // middleware -> extractor hand-off
    req.extensions_mut().insert(ctx);

    next.run(req).await
}
