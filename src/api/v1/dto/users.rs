/*
 * Responsibility
 * - Users の request/response DTO
 * - validate() は形式チェックのみ (DB は見ない)
 */
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::repos::user_repo::{ProfileUpdate, UserRow};
use crate::services::auth::Role;
use crate::services::auth::credentials::MAX_PASSWORD_BYTES;

pub const USER_NAME_MAX_LEN: usize = 64;
pub const PASSWORD_MIN_LEN: usize = 8;
const ADDRESS_MAX_LEN: usize = 256;
const GENDER_MAX_LEN: usize = 32;

pub fn validate_user_name(user_name: &str) -> Result<(), &'static str> {
    if user_name.trim().is_empty() {
        return Err("user_name is required");
    }
    if user_name.len() > USER_NAME_MAX_LEN {
        return Err("user_name must be <= 64 chars");
    }
    if user_name.chars().any(char::is_whitespace) {
        return Err("user_name must not contain whitespace");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err("password must be >= 8 chars");
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err("password must be <= 72 bytes");
    }
    Ok(())
}

pub fn validate_profile(address: Option<&str>, gender: Option<&str>) -> Result<(), &'static str> {
    if let Some(address) = address
        && address.len() > ADDRESS_MAX_LEN
    {
        return Err("address must be <= 256 chars");
    }
    if let Some(gender) = gender
        && gender.len() > GENDER_MAX_LEN
    {
        return Err("gender must be <= 32 chars");
    }
    Ok(())
}

// Distinguishes a missing field (None, via #[serde(default)]) from an explicit null (Some(None)).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Admin-side creation; unlike sign-up the role can be chosen.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_user_name(&self.user_name)?;
        validate_password(&self.password)?;
        validate_profile(self.address.as_deref(), self.gender.as_deref())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    // Tri-state:
    // - None: field missing (do not update)
    // - Some(None): null (set NULL)
    // - Some(Some(v)): set value
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date, nullable)]
    pub birth_date: Option<Option<NaiveDate>>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_profile(
            self.address.as_ref().and_then(|a| a.as_deref()),
            self.gender.as_ref().and_then(|g| g.as_deref()),
        )
    }

    pub fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            address: self.address,
            gender: self.gender,
            birth_date: self.birth_date,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Fragment the user name must contain.
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub user_name: String,
    pub role: String,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            role: row.role,
            address: row.address,
            gender: row.gender,
            birth_date: row.birth_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub user_id: i64,
    pub user_name: String,
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.id,
            user_name: row.user_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserIdResponse {
    pub user_id: i64,
}
