/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - users: UserRepo, tokens: TokenService, gate, passwords
 * - Clone 前提で持つ (内部は Arc で cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::AuthenticationGate;
use crate::repos::user_repo::UserRepo;
use crate::services::auth::{PasswordHasher, RepoIdentityLookup, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub tokens: Arc<dyn TokenService>,
    pub gate: Arc<AuthenticationGate>,
    pub passwords: Arc<PasswordHasher>,
    // `Secure` attribute on the sign-in cookie (production only)
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepo>,
        tokens: Arc<dyn TokenService>,
        passwords: PasswordHasher,
        secure_cookies: bool,
    ) -> Self {
        let identities = Arc::new(RepoIdentityLookup::new(users.clone()));
        let gate = Arc::new(AuthenticationGate::new(tokens.clone(), identities));

        Self {
            users,
            tokens,
            gate,
            passwords: Arc::new(passwords),
            secure_cookies,
        }
    }
}
