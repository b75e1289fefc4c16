/// Factory: build the token service from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwtTokenService, TokenError};

pub fn build_token_service(config: &Config) -> Result<Arc<JwtTokenService>, TokenError> {
    let tokens = JwtTokenService::new(
        &config.access_jwt_private_key_pem,
        &config.access_jwt_public_key_pem,
        &config.auth_issuer,
        &config.auth_audience,
        config.access_token_ttl_seconds,
        config.access_token_leeway_seconds,
    )?;

    Ok(Arc::new(tokens))
}
