//! Per-request authentication decision.
//!
//! The gate establishes *who* is calling when it can and otherwise lets the request
//! through untouched. It never rejects: "authentication required" and role checks are
//! made later by handlers (`AuthCtxExtractor`, `AuthCtx::require_*`).
//!
//! Order of work for a protected path:
//! 1. find a `Bearer` candidate (header, then `Authorization` cookie)
//! 2. read the subject claim (unverified; lookup key only)
//! 3. stop if the context is already bound (re-entry)
//! 4. read the role claim, resolve the identity
//! 5. verify the token against that identity, then bind
use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{debug, warn};

use crate::api::v1::extractors::SecurityContext;
use crate::middleware::auth::{carrier, public_routes};
use crate::services::auth::{IdentityLookup, LookupError, TokenService};

/// Why a request left the gate without a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    NoCandidate,
    MalformedToken,
    IdentityNotFound,
    IdentityBackend,
    InvalidToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Public path; nothing was inspected.
    Public,
    /// A principal was already bound before this evaluation.
    AlreadyAuthenticated,
    /// This evaluation bound a principal.
    Bound,
    PassThrough(PassReason),
}

#[derive(Clone)]
pub struct AuthenticationGate {
    tokens: Arc<dyn TokenService>,
    identities: Arc<dyn IdentityLookup>,
}

impl AuthenticationGate {
    pub fn new(tokens: Arc<dyn TokenService>, identities: Arc<dyn IdentityLookup>) -> Self {
        Self { tokens, identities }
    }

    pub async fn evaluate(
        &self,
        path: &str,
        headers: &HeaderMap,
        ctx: &mut SecurityContext,
    ) -> GateOutcome {
        if public_routes::is_public(path) {
            return GateOutcome::Public;
        }

        let Some(token) = carrier::candidate_token(headers) else {
            return GateOutcome::PassThrough(PassReason::NoCandidate);
        };

        let subject = match self.tokens.extract_subject(&token) {
            Ok(subject) => subject,
            Err(err) => {
                debug!(error = %err, "unusable bearer token");
                return GateOutcome::PassThrough(PassReason::MalformedToken);
            }
        };

        if ctx.is_bound() {
            return GateOutcome::AlreadyAuthenticated;
        }

        let role = match self.tokens.extract_role(&token) {
            Ok(role) => role,
            Err(err) => {
                debug!(error = %err, subject = %subject, "unusable role claim");
                return GateOutcome::PassThrough(PassReason::MalformedToken);
            }
        };

        let identity = match self.identities.resolve(&subject).await {
            Ok(identity) => identity,
            Err(LookupError::NotFound) => {
                debug!(subject = %subject, "token subject has no identity");
                return GateOutcome::PassThrough(PassReason::IdentityNotFound);
            }
            Err(err) => {
                warn!(error = %err, subject = %subject, "identity lookup failed");
                return GateOutcome::PassThrough(PassReason::IdentityBackend);
            }
        };

        if !self.tokens.is_valid(&token, &identity) {
            return GateOutcome::PassThrough(PassReason::InvalidToken);
        }

        if ctx.bind(identity, role) {
            GateOutcome::Bound
        } else {
            GateOutcome::AlreadyAuthenticated
        }
    }
}
