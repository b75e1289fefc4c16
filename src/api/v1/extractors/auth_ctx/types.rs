/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - authentication gate が request extensions の SecurityContext を埋め、
 *   handler は AuthCtx だけを受け取る
 *
 * Notes
 * - token の解析/検証は middleware/services 側の責務
 * - role ルール (認可) は handler が AuthCtx の上で判定する
 */
use crate::error::AppError;
use crate::services::auth::{Identity, Role};

/// Authenticated principal bound to one request.
///
/// - `identity` comes from the user store (resolved by token subject)
/// - `role` comes from the verified token
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
    pub role: Role,
}

impl AuthCtx {
    pub fn new(identity: Identity, role: Role) -> Self {
        Self { identity, role }
    }

    pub fn user_id(&self) -> i64 {
        self.identity.id
    }

    pub fn subject(&self) -> &str {
        &self.identity.subject
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Admins may act on anyone; everyone else only on themselves.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.role.is_admin() || self.user_id() == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Per-request slot for at most one authenticated principal.
///
/// Created empty when the request enters the gate, lives in the request's
/// extensions, dropped with the request. First writer wins.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<AuthCtx>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `(identity, role)` unless something is already bound.
    /// Returns `true` only when this call did the binding.
    pub fn bind(&mut self, identity: Identity, role: Role) -> bool {
        if self.principal.is_some() {
            return false;
        }
        self.principal = Some(AuthCtx::new(identity, role));
        true
    }

    pub fn current(&self) -> Option<&AuthCtx> {
        self.principal.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.principal.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn identity(id: i64, subject: &str) -> Identity {
        let now = Utc::now();
        Identity {
            id,
            subject: subject.to_string(),
            role: Role::User,
            address: None,
            gender: None,
            birth_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_bind_wins() {
        let mut ctx = SecurityContext::new();
        assert!(ctx.current().is_none());

        assert!(ctx.bind(identity(1, "alice"), Role::Admin));
        assert!(!ctx.bind(identity(2, "bob"), Role::User));

        let bound = ctx.current().unwrap();
        assert_eq!(bound.subject(), "alice");
        assert_eq!(bound.role, Role::Admin);
    }

    #[test]
    fn role_rules() {
        let user = AuthCtx::new(identity(7, "carol"), Role::User);
        assert!(user.require_self_or_admin(7).is_ok());
        assert!(matches!(
            user.require_self_or_admin(8),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden)));

        let admin = AuthCtx::new(identity(1, "root"), Role::Admin);
        assert!(admin.require_self_or_admin(8).is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
