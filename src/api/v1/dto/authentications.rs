/*
 * Responsibility
 * - sign-up / sign-in の request/response DTO
 */
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::v1::dto::users::{validate_password, validate_profile, validate_user_name};
use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::Role;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub user_name: String,
    pub password: String,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_user_name(&self.user_name)?;
        validate_password(&self.password)?;
        validate_profile(self.address.as_deref(), self.gender.as_deref())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    pub user_id: i64,
    pub user_name: String,
    pub role: Role,
}

impl From<&AuthCtx> for PrincipalResponse {
    fn from(ctx: &AuthCtx) -> Self {
        Self {
            user_id: ctx.user_id(),
            user_name: ctx.subject().to_string(),
            role: ctx.role,
        }
    }
}
