/*
 * Responsibility
 * - /authentications 系 handler: sign-up, sign-in (token 発行), me
 * - signup / signin は public (middleware::auth::public_routes を参照)
 * - docs / swagger-ui は api::v1::openapi が配信する
 */
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use cookie::{Cookie, SameSite};

use crate::{
    api::v1::{
        dto::{
            authentications::{PrincipalResponse, SignInRequest, SignUpRequest, TokenResponse},
            users::UserResponse,
        },
        extractors::AuthCtxExtractor,
    },
    error::{AppError, ErrorResponse},
    middleware::auth::carrier::{BEARER_PREFIX, CARRIER_NAME},
    repos::user_repo::NewUser,
    services::auth::Role,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/authentications/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User registered with role USER", body = UserResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "User name already taken", body = ErrorResponse),
    ),
    security(()),
    tag = "authentications"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_SIGNUP", msg))?;

    // 自己登録は常に USER。ADMIN は POST /users で作る
    let row = state
        .users
        .create(NewUser {
            password_hash: state.passwords.hash(&req.password).await?,
            user_name: req.user_name,
            role: Role::User.to_string(),
            address: req.address,
            gender: req.gender,
            birth_date: req.birth_date,
        })
        .await?;

    tracing::info!(user_id = row.id, "user signed up");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/authentications/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Access token issued; also set as the Authorization cookie", body = TokenResponse),
        (status = 401, description = "Unknown user or wrong password", body = ErrorResponse),
    ),
    security(()),
    tag = "authentications"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 存在しない user と password 誤りはクライアントから区別できない (応答も所要時間も)
    let Some(row) = state.users.find_by_user_name(&req.user_name).await? else {
        state.passwords.verify_absent(&req.password).await?;
        return Err(AppError::Unauthorized);
    };

    if !state.passwords.verify(&req.password, &row.password_hash).await? {
        tracing::info!(user_id = row.id, "sign-in rejected");
        return Err(AppError::Unauthorized);
    }

    let role = row.role.parse::<Role>().map_err(|e| {
        tracing::error!(user_id = row.id, error = %e, "stored role is not a known role");
        AppError::Internal
    })?;

    let issued = state.tokens.issue(&row.user_name, role)?;

    // cookie には生の token。Bearer prefix は gate 側で補う
    let cookie = Cookie::build((CARRIER_NAME, issued.token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Strict)
        .max_age(cookie::time::Duration::seconds(issued.expires_in as i64))
        .build();

    tracing::info!(user_id = row.id, role = %role, "access token issued");

    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(TokenResponse {
            token: issued.token,
            token_type: BEARER_PREFIX.trim_end().to_string(),
            expires_in: issued.expires_in,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/authentications/me",
    responses(
        (status = 200, description = "The authenticated caller", body = PrincipalResponse),
        (status = 401, description = "No authenticated caller", body = ErrorResponse),
    ),
    tag = "authentications"
)]
pub async fn me(AuthCtxExtractor(caller): AuthCtxExtractor) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(&caller))
}
