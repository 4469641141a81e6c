//! Authorization Context
//!
//! Role-based access control. The acting user is resolved from the bearer
//! token by the middleware and carried through the request as an
//! `AuthContext`; admin-gated handlers call `checks::require_admin`.

use crate::user::entity::{Role, User};

/// Authorization context for a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Acting user ID
    pub user_id: String,

    /// Username for attribution and logging
    pub username: String,

    /// Email address
    pub email: String,

    /// Role, resolved from the user document (not trusted from the token)
    pub role: Role,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    /// Exact enumerated comparison; never a substring test.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub mod checks {
    use super::AuthContext;
    use crate::shared::error::{PlatformError, Result};

    /// Require the acting user to hold the admin role.
    pub fn require_admin(ctx: &AuthContext) -> Result<()> {
        if !ctx.is_admin() {
            return Err(PlatformError::forbidden("Admin role required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::entity::User;

    #[test]
    fn plain_user_is_not_admin() {
        let user = User::new("alice", "alice@example.com", "$argon2id$stub");
        let ctx = AuthContext::from_user(&user);
        assert!(!ctx.is_admin());
        assert!(checks::require_admin(&ctx).is_err());
    }

    #[test]
    fn admin_passes_the_gate() {
        let mut user = User::new("root", "root@example.com", "$argon2id$stub");
        user.role = Role::Admin;
        let ctx = AuthContext::from_user(&user);
        assert!(ctx.is_admin());
        assert!(checks::require_admin(&ctx).is_ok());
    }
}
