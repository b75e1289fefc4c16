/*
 * Responsibility
 * - v1 の URL 構造を定義 (+ version なしの /actuator)
 * - 認証を skip する path は middleware::auth::public_routes で決める (ここではない)
 *   caller が必要な handler は AuthCtxExtractor を取る
 * - docs / swagger-ui は api::v1::openapi::router() が full path で持つ
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    authentications::{me, sign_in, sign_up},
    health::{health, info},
    users::{
        create_user, delete_user, get_user, get_user_id_by_name, list_users, search_users,
        update_user,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/authentications/signup", post(sign_up))
        .route("/authentications/signin", post(sign_in))
        .route("/authentications/me", get(me))
        .route("/users", get(list_users).post(create_user))
        .route("/users/search", get(search_users))
        .route("/users/by-name/{user_name}", get(get_user_id_by_name))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

pub fn actuator_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
}
