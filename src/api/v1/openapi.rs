//! OpenAPI document for the whole service, derived from the handler annotations.
//!
//! - JSON at `DOCS_PATH`, Swagger UI under `SWAGGER_UI_PATH`.
//! - Both sit under public prefixes, so the gate never inspects them.

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub const DOCS_PATH: &str = "/api/v1/authentications/docs";
pub const SWAGGER_UI_PATH: &str = "/api/v1/authentications/swagger-ui";

/// Bearer JWT scheme; the Authorization cookie set at sign-in is equivalent.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Access token from POST /api/v1/authentications/signin. \
                         Also accepted as the `Authorization` cookie.",
                    ))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "user-service",
        description = "User management API. Callers are identified by an Ed25519-signed JWT."
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        crate::api::v1::handlers::authentications::sign_up,
        crate::api::v1::handlers::authentications::sign_in,
        crate::api::v1::handlers::authentications::me,
        crate::api::v1::handlers::users::list_users,
        crate::api::v1::handlers::users::create_user,
        crate::api::v1::handlers::users::get_user,
        crate::api::v1::handlers::users::search_users,
        crate::api::v1::handlers::users::get_user_id_by_name,
        crate::api::v1::handlers::users::update_user,
        crate::api::v1::handlers::users::delete_user,
        crate::api::v1::handlers::health::health,
        crate::api::v1::handlers::health::info,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
            crate::services::auth::Role,
            crate::api::v1::dto::authentications::SignUpRequest,
            crate::api::v1::dto::authentications::SignInRequest,
            crate::api::v1::dto::authentications::TokenResponse,
            crate::api::v1::dto::authentications::PrincipalResponse,
            crate::api::v1::dto::users::CreateUserRequest,
            crate::api::v1::dto::users::UpdateUserRequest,
            crate::api::v1::dto::users::UserResponse,
            crate::api::v1::dto::users::UserSummary,
            crate::api::v1::dto::users::UserIdResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentications", description = "Sign-up, sign-in and the current caller"),
        (name = "users", description = "User management"),
        (name = "actuator", description = "Liveness and build info"),
    )
)]
pub struct ApiDoc;

/// Full paths; merge into the top-level router, not under a nest.
pub fn router() -> Router<AppState> {
    SwaggerUi::new(SWAGGER_UI_PATH)
        .url(DOCS_PATH, ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::public_routes::is_public;

    #[test]
    fn every_route_is_documented() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/v1/authentications/signup",
            "/api/v1/authentications/signin",
            "/api/v1/authentications/me",
            "/api/v1/users",
            "/api/v1/users/search",
            "/api/v1/users/by-name/{user_name}",
            "/api/v1/users/{user_id}",
            "/actuator/health",
            "/actuator/info",
        ] {
            assert!(spec.paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let spec = ApiDoc::openapi();
        let components = spec.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("UserResponse"));
    }

    #[test]
    fn docs_and_ui_are_public() {
        assert!(is_public(DOCS_PATH));
        assert!(is_public(SWAGGER_UI_PATH));
        assert!(is_public(&format!("{SWAGGER_UI_PATH}/index.html")));
    }
}
