//! Subject → identity resolution used by the authentication gate.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::repos::user_repo::{UserRepo, UserRow};
use crate::services::auth::Role;

/// A user as seen by authentication: everything except credential material.
///
/// `subject` is the user name, unique and stable for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub subject: String,
    pub role: Role,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Identity {
    type Error = LookupError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|e| {
            LookupError::Backend(format!("user {} has invalid role: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            subject: row.user_name,
            role,
            address: row.address,
            gender: row.gender,
            birth_date: row.birth_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no identity for subject")]
    NotFound,
    #[error("identity backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn resolve(&self, subject: &str) -> Result<Identity, LookupError>;
}

/// `IdentityLookup` backed by the user repository (subject = user name).
#[derive(Clone)]
pub struct RepoIdentityLookup {
    users: Arc<dyn UserRepo>,
}

impl RepoIdentityLookup {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityLookup for RepoIdentityLookup {
    async fn resolve(&self, subject: &str) -> Result<Identity, LookupError> {
        let row = self
            .users
            .find_by_user_name(subject)
            .await
            .map_err(|e| LookupError::Backend(e.to_string()))?
            .ok_or(LookupError::NotFound)?;

        Identity::try_from(row)
    }
}
