//! Caller authorization context.
//!
//! Every public operation on the notification store receives an explicit
//! [`AuthContext`] describing the caller. Internal components (the
//! dispatcher, the alert engine, carrier adapters) run under
//! [`AuthContext::system`]; request handlers construct user contexts from
//! the authenticated session. There is no ambient or global elevation.

use crate::error::CoreError;
use crate::types::DbId;

/// Role claim attached to a user principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// The identity an operation runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// An internal component. Not a user; carries no user id.
    System,
    /// An authenticated end user.
    User { id: DbId, role: Role },
}

/// Caller context threaded through every store operation.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    principal: Principal,
}

impl AuthContext {
    /// Context for internal components (dispatcher, engine, adapters).
    pub fn system() -> Self {
        AuthContext {
            principal: Principal::System,
        }
    }

    /// Context for an authenticated user without elevated claims.
    pub fn user(id: DbId) -> Self {
        AuthContext {
            principal: Principal::User {
                id,
                role: Role::User,
            },
        }
    }

    /// Context for an authenticated administrator.
    pub fn admin(id: DbId) -> Self {
        AuthContext {
            principal: Principal::User {
                id,
                role: Role::Admin,
            },
        }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// The caller's user id, if the caller is a user.
    pub fn user_id(&self) -> Option<DbId> {
        match self.principal {
            Principal::User { id, .. } => Some(id),
            Principal::System => None,
        }
    }

    /// Accept only internal components.
    pub fn require_system(&self) -> Result<(), CoreError> {
        match self.principal {
            Principal::System => Ok(()),
            Principal::User { .. } => Err(CoreError::PermissionDenied("system access required")),
        }
    }

    /// Accept any authenticated user (including admins).
    pub fn require_user(&self) -> Result<(), CoreError> {
        match self.principal {
            Principal::User { .. } => Ok(()),
            Principal::System => Err(CoreError::PermissionDenied("user access required")),
        }
    }

    /// Accept only administrators.
    pub fn require_admin(&self) -> Result<(), CoreError> {
        match self.principal {
            Principal::User {
                role: Role::Admin, ..
            } => Ok(()),
            _ => Err(CoreError::PermissionDenied("admin access required")),
        }
    }

    /// Accept an admin, or the user identified by `user_id`.
    pub fn require_self_or_admin(&self, user_id: DbId) -> Result<(), CoreError> {
        if self.require_admin().is_ok() {
            return Ok(());
        }
        match self.principal {
            Principal::User { id, .. } if id == user_id => Ok(()),
            _ => Err(CoreError::PermissionDenied("admin or matching user required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> DbId {
        DbId::from_u128(n)
    }

    #[test]
    fn system_passes_system_check() {
        assert!(AuthContext::system().require_system().is_ok());
    }

    #[test]
    fn user_fails_system_check() {
        assert!(AuthContext::user(id(1)).require_system().is_err());
        assert!(AuthContext::admin(id(1)).require_system().is_err());
    }

    #[test]
    fn system_fails_user_check() {
        assert!(AuthContext::system().require_user().is_err());
    }

    #[test]
    fn any_user_passes_user_check() {
        assert!(AuthContext::user(id(1)).require_user().is_ok());
        assert!(AuthContext::admin(id(2)).require_user().is_ok());
    }

    #[test]
    fn only_admins_pass_admin_check() {
        assert!(AuthContext::admin(id(1)).require_admin().is_ok());
        assert!(AuthContext::user(id(1)).require_admin().is_err());
        assert!(AuthContext::system().require_admin().is_err());
    }

    #[test]
    fn matching_user_passes_self_check() {
        assert!(AuthContext::user(id(7)).require_self_or_admin(id(7)).is_ok());
    }

    #[test]
    fn other_user_fails_self_check() {
        assert!(AuthContext::user(id(7)).require_self_or_admin(id(8)).is_err());
    }

    #[test]
    fn admin_passes_self_check_for_any_user() {
        assert!(AuthContext::admin(id(1)).require_self_or_admin(id(8)).is_ok());
    }

    #[test]
    fn system_fails_self_check() {
        assert!(AuthContext::system().require_self_or_admin(id(1)).is_err());
    }

    #[test]
    fn user_id_exposed_only_for_users() {
        assert_eq!(AuthContext::user(id(3)).user_id(), Some(id(3)));
        assert_eq!(AuthContext::system().user_id(), None);
    }
}
