//! Password hashing for sign-up / sign-in (bcrypt).
//!
//! bcrypt is CPU-bound, so every hash / verify runs on the blocking pool.
//! The stored value is the bcrypt string itself (algorithm, cost and salt included).
use bcrypt::{hash, verify};
use tokio::sync::OnceCell;

use crate::error::AppError;

pub use bcrypt::DEFAULT_COST;

/// Cost accepted by bcrypt.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug)]
pub struct PasswordHasher {
    cost: u32,
    // Hash compared against when the user does not exist, so both sign-in
    // failures cost one bcrypt verification.
    decoy: OnceCell<String>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: OnceCell::new(),
        }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_password(password, self.cost).await
    }

    pub async fn verify(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        verify_password(password, stored).await
    }

    /// Same work as `verify` for a user name that has no stored hash. Always `false`.
    pub async fn verify_absent(&self, password: &str) -> Result<bool, AppError> {
        let decoy = self
            .decoy
            .get_or_try_init(|| hash_password("decoy-password", self.cost))
            .await?;
        verify_password(password, decoy).await?;
        Ok(false)
    }
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hash task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "bcrypt hash failed");
            AppError::Internal
        })
}

/// `Ok(false)` for a wrong password. A stored value bcrypt cannot parse is an error.
pub async fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let stored = stored.to_string();

    tokio::task::spawn_blocking(move || verify(password, &stored))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verify task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "stored password hash is unreadable");
            AppError::Internal
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let stored = hash_password("s3cret-pw", MIN_COST).await.unwrap();
        assert!(stored.starts_with("$2"));
        assert!(verify_password("s3cret-pw", &stored).await.unwrap());
        assert!(!verify_password("S3cret-pw", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn cost_is_recorded_in_the_stored_hash() {
        let stored = hash_password("s3cret-pw", 5).await.unwrap();
        assert_eq!(&stored[4..6], "05");
    }

    #[tokio::test]
    async fn same_password_gets_a_fresh_salt() {
        let a = hash_password("pw", MIN_COST).await.unwrap();
        let b = hash_password("pw", MIN_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unreadable_stored_value_is_an_error() {
        assert!(verify_password("pw", "").await.is_err());
        assert!(verify_password("pw", "abcd$ef01").await.is_err());
    }

    #[tokio::test]
    async fn absent_user_never_verifies() {
        let hasher = PasswordHasher::new(MIN_COST);
        assert!(!hasher.verify_absent("decoy-password").await.unwrap());
        assert!(!hasher.verify_absent("anything").await.unwrap());
    }
}
