//! Access-token contract consumed by the authentication gate and sign-in.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::auth::{Identity, Role};

#[derive(Debug, Error)]
pub enum TokenError {
    /// Claims could not be read (not a JWT, bad encoding, missing/empty claim, unknown role).
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Result of a successful issuance; handlers map this into the HTTP DTO.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Signs and inspects access tokens.
///
/// - `extract_subject` / `extract_role` read claims WITHOUT verifying the signature;
///   they only produce a lookup key and must never be trusted on their own.
/// - `is_valid` is the authoritative check and never fails loudly: any problem
///   (signature, expiry, issuer, audience, subject mismatch) is just `false`.
pub trait TokenService: Send + Sync {
    fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, TokenError>;

    fn extract_subject(&self, token: &str) -> Result<String, TokenError>;

    fn extract_role(&self, token: &str) -> Result<Role, TokenError>;

    fn is_valid(&self, token: &str, identity: &Identity) -> bool;
}
