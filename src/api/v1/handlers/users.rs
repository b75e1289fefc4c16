/*
 * Responsibility
 * - /users 系 CRUD handler
 * - 全 handler が AuthCtxExtractor を取る (gate が誰も bind していなければ 401)
 * - role ルール: create/delete は ADMIN のみ、update は ADMIN か本人
 */
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::users::{
            CreateUserRequest, SearchQuery, UpdateUserRequest, UserIdResponse, UserResponse,
            UserSummary,
        },
        extractors::AuthCtxExtractor,
    },
    error::{AppError, ErrorResponse},
    repos::user_repo::NewUser,
    services::auth::Role,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthCtxExtractor(_caller): AuthCtxExtractor,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = state.users.list().await?;
    tracing::debug!(count = rows.len(), "listed users");

    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
        (status = 403, description = "Caller is not ADMIN", body = ErrorResponse),
        (status = 409, description = "User name already taken", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthCtxExtractor(caller): AuthCtxExtractor,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    caller.require_admin()?;
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_USER", msg))?;

    let row = state
        .users
        .create(NewUser {
            password_hash: state.passwords.hash(&req.password).await?,
            user_name: req.user_name,
            role: req.role.unwrap_or(Role::User).to_string(),
            address: req.address,
            gender: req.gender,
            birth_date: req.birth_date,
        })
        .await?;

    tracing::info!(user_id = row.id, created_by = %caller.subject(), "user created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthCtxExtractor(_caller): AuthCtxExtractor,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let row = state
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Users whose name contains the fragment", body = Vec<UserSummary>),
        (status = 400, description = "Missing or empty name", body = ErrorResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<AppState>,
    AuthCtxExtractor(_caller): AuthCtxExtractor,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let Some(name) = query.name.filter(|n| !n.trim().is_empty()) else {
        return Err(AppError::bad_request("INVALID_QUERY", "name is required"));
    };

    let rows = state.users.search_by_name(&name).await?;
    tracing::debug!(count = rows.len(), "user search");

    Ok(Json(rows.into_iter().map(UserSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/by-name/{user_name}",
    params(("user_name" = String, Path, description = "Exact user name")),
    responses(
        (status = 200, description = "Id of the user", body = UserIdResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_user_id_by_name(
    State(state): State<AppState>,
    AuthCtxExtractor(_caller): AuthCtxExtractor,
    Path(user_name): Path<String>,
) -> Result<Json<UserIdResponse>, AppError> {
    let row = state
        .users
        .find_by_user_name(&user_name)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(UserIdResponse { user_id: row.id }))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
        (status = 403, description = "Caller is neither ADMIN nor the user", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthCtxExtractor(caller): AuthCtxExtractor,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    caller.require_self_or_admin(user_id)?;
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_USER", msg))?;

    let row = state
        .users
        .update_profile(user_id, req.into_update())
        .await?
        .ok_or(AppError::not_found("user"))?;

    tracing::info!(user_id, updated_by = %caller.subject(), "user updated");
    Ok(Json(row.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
        (status = 403, description = "Caller is not ADMIN", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthCtxExtractor(caller): AuthCtxExtractor,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    caller.require_admin()?;

    if state.users.delete(user_id).await? {
        tracing::info!(user_id, deleted_by = %caller.subject(), "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user"))
    }
}
