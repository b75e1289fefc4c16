use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::auth::token::{AccessTokenClaims, IssuedToken, TokenError, TokenService};
use crate::services::auth::{Identity, Role};

// Lenient view of the payload used before the signature is checked.
#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// EdDSA (Ed25519) access-token signer and verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtTokenService {
    issuer: String,
    audience: String,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    // Full check: signature + exp/leeway + iss + aud.
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtTokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtTokenService {
    /// `private_key_pem` must be an Ed25519 PKCS#8 PEM, `public_key_pem` the matching SPKI PEM.
    pub fn new(
        private_key_pem: &str,
        public_key_pem: &str,
        issuer: &str,
        audience: &str,
        ttl_seconds: u64,
        leeway_seconds: u64,
    ) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_ed_pem(private_key_pem.as_bytes()).map_err(|e| {
            warn!(error = %e, "failed to parse access JWT private key PEM (expected Ed25519 PKCS#8 PEM)");
            TokenError::Signing(format!("invalid ed25519 private key pem: {e}"))
        })?;
        let decoding_key = DecodingKey::from_ed_pem(public_key_pem.as_bytes()).map_err(|e| {
            warn!(error = %e, "failed to parse access JWT public key PEM");
            TokenError::Signing(format!("invalid ed25519 public key pem: {e}"))
        })?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = leeway_seconds;

        Ok(Self {
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl_seconds,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn sign(&self, claims: &AccessTokenClaims) -> Result<String, TokenError> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    // Claims only, no signature / exp / aud check: used by extract_subject / extract_role.
    fn inspect(&self, token: &str) -> Result<UnverifiedClaims, TokenError> {
        jsonwebtoken::dangerous::insecure_decode::<UnverifiedClaims>(token)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::Signing("empty subject".to_string()));
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_seconds as i64,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_in: self.ttl_seconds,
        })
    }

    fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        match self.inspect(token)?.sub {
            Some(sub) if !sub.trim().is_empty() => Ok(sub),
            _ => Err(TokenError::Malformed("missing or empty 'sub' claim".to_string())),
        }
    }

    fn extract_role(&self, token: &str) -> Result<Role, TokenError> {
        let raw = self
            .inspect(token)?
            .role
            .ok_or_else(|| TokenError::Malformed("missing 'role' claim".to_string()))?;

        raw.parse::<Role>()
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }

    fn is_valid(&self, token: &str, identity: &Identity) -> bool {
        match self.verify(token) {
            Ok(claims) if claims.sub == identity.subject => true,
            Ok(claims) => {
                debug!(token_sub = %claims.sub, identity = %identity.subject, "token subject mismatch");
                false
            }
            Err(err) => {
                debug!(error = %err, "access token verification failed");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) const TEST_PRIVATE_KEY_PEM: &str = include_str!("../../../testdata/ed25519_private.pem");
#[cfg(test)]
pub(crate) const TEST_PUBLIC_KEY_PEM: &str = include_str!("../../../testdata/ed25519_public.pem");

#[cfg(test)]
pub(crate) fn test_token_service() -> JwtTokenService {
    JwtTokenService::new(
        TEST_PRIVATE_KEY_PEM,
        TEST_PUBLIC_KEY_PEM,
        "user-service-test",
        "user-service-api",
        600,
        0,
    )
    .expect("test key pair must load")
}
