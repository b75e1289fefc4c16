//! Locating the bearer token on an incoming request.
//!
//! - `Authorization` header first.
//! - Only if that header is absent: a cookie named `Authorization` whose value is the
//!   raw token (browser clients after sign-in), treated as `Bearer <value>`.
use axum::http::{HeaderMap, header};
use cookie::Cookie;

/// Name shared by the carrier header and the fallback cookie.
pub const CARRIER_NAME: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// Raw token (prefix stripped), or `None` when no `Bearer ` candidate exists.
pub fn candidate_token(headers: &HeaderMap) -> Option<String> {
    let carrier = match headers.get(header::AUTHORIZATION) {
        // A present header wins even when it is not usable (e.g. `Basic ...`).
        Some(value) => value.to_str().ok().map(str::to_owned),
        None => carrier_cookie(headers).map(|raw| format!("{BEARER_PREFIX}{raw}")),
    }?;

    carrier.strip_prefix(BEARER_PREFIX).map(str::to_owned)
}

fn carrier_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == CARRIER_NAME)
        .map(|c| c.value().to_string())
}
