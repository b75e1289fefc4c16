//! Paths that never go through the authentication gate.

/// Case-sensitive prefixes; a request whose path starts with any of these is public.
pub const PUBLIC_PATH_PREFIXES: [&str; 5] = [
    "/api/v1/authentications/signin",
    "/api/v1/authentications/signup",
    "/api/v1/authentications/docs",
    "/api/v1/authentications/swagger-ui",
    "/actuator",
];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_ops_endpoints_are_public() {
        assert!(is_public("/api/v1/authentications/signin"));
        assert!(is_public("/api/v1/authentications/signup"));
        assert!(is_public("/api/v1/authentications/docs"));
        assert!(is_public("/api/v1/authentications/swagger-ui/index.html"));
        assert!(is_public("/actuator"));
        assert!(is_public("/actuator/health"));
    }

    #[test]
    fn everything_else_is_protected() {
        assert!(!is_public("/api/v1/users"));
        assert!(!is_public("/api/v1/users/5"));
        assert!(!is_public("/api/v1/authentications/me"));
        assert!(!is_public("/"));
        assert!(!is_public(""));
    }

    #[test]
    fn match_is_a_case_sensitive_prefix_match() {
        assert!(!is_public("/API/v1/authentications/signin"));
        assert!(!is_public("/Actuator/health"));
        // prefix, not segment, semantics
        assert!(is_public("/api/v1/authentications/signinX"));
        assert!(!is_public("/v1/actuator"));
    }
}
