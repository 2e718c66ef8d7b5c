//! Authorization checks for an authenticated caller.

use parkhub_entity::user::UserRole;

use super::policies::RbacPolicies;
use crate::context::AuthContext;
use crate::error::{AuthError, AuthResult};

/// Evaluates role membership, permissions, and role level.
///
/// The `require_*` variants take an optional caller so that a missing
/// identity is reported as [`AuthError::Unauthenticated`] and a present
/// but insufficient one as [`AuthError::InsufficientPermissions`].
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer {
    policies: RbacPolicies,
}

impl RbacEnforcer {
    pub fn new() -> Self {
        Self {
            policies: RbacPolicies::new(),
        }
    }

    pub fn with_policies(policies: RbacPolicies) -> Self {
        Self { policies }
    }

    /// Exact role membership.
    pub fn authorize(&self, role: UserRole, allowed: &[UserRole]) -> bool {
        allowed.contains(&role)
    }

    pub fn has_permission(&self, role: UserRole, key: &str) -> bool {
        self.policies.has_permission(role, key)
    }

    /// Whether `role` is at or above `required` in the role order.
    pub fn has_role_level(&self, role: UserRole, required: UserRole) -> bool {
        role.has_at_least(&required)
    }

    pub fn require_role(
        &self,
        caller: Option<&AuthContext>,
        allowed: &[UserRole],
    ) -> AuthResult<()> {
        let caller = caller.ok_or(AuthError::Unauthenticated)?;
        if self.authorize(caller.role, allowed) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    pub fn require_permission(&self, caller: Option<&AuthContext>, key: &str) -> AuthResult<()> {
        let caller = caller.ok_or(AuthError::Unauthenticated)?;
        if self.has_permission(caller.role, key) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    pub fn require_role_level(
        &self,
        caller: Option<&AuthContext>,
        required: UserRole,
    ) -> AuthResult<()> {
        let caller = caller.ok_or(AuthError::Unauthenticated)?;
        if self.has_role_level(caller.role, required) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    pub fn policies(&self) -> &RbacPolicies {
        &self.policies
    }
}
