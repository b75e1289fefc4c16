/*
 * Responsibility
 * - /actuator 配下 (liveness / build info)
 * - public: authentication gate は何も検査しない
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/actuator/health",
    responses((status = 200, description = "Service is up")),
    security(()),
    tag = "actuator"
)]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

#[utoipa::path(
    get,
    path = "/actuator/info",
    responses((status = 200, description = "Service name and version")),
    security(()),
    tag = "actuator"
)]
pub async fn info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
