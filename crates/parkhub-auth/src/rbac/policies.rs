//! Role-to-permission table.
//!
//! Permission keys are namespaced `resource:action` strings. The table is
//! static and built once at startup.

use std::collections::{HashMap, HashSet};

use parkhub_entity::user::UserRole;

/// Permission keys known to the policy table.
pub mod permissions {
    pub const PROFILE_READ: &str = "profile:read";
    pub const PROFILE_UPDATE: &str = "profile:update";
    pub const LOTS_VIEW: &str = "lots:view";
    pub const BOOKINGS_CREATE: &str = "bookings:create";
    pub const BOOKINGS_VIEW_OWN: &str = "bookings:view_own";
    pub const BOOKINGS_VIEW_ALL: &str = "bookings:view_all";
    pub const BOOKINGS_MANAGE: &str = "bookings:manage";
    pub const SPOTS_MANAGE: &str = "spots:manage";
    pub const LOTS_MANAGE: &str = "lots:manage";
    pub const REPORTS_VIEW: &str = "reports:view";
    pub const USERS_VIEW: &str = "users:view";
    pub const USERS_MANAGE: &str = "users:manage";
    pub const SESSIONS_VIEW: &str = "sessions:view";
    pub const SESSIONS_MANAGE: &str = "sessions:manage";
    pub const SYSTEM_CONFIGURE: &str = "system:configure";
}

use permissions::*;

const USER_PERMISSIONS: &[&str] = &[
    PROFILE_READ,
    PROFILE_UPDATE,
    LOTS_VIEW,
    BOOKINGS_CREATE,
    BOOKINGS_VIEW_OWN,
];

const OPERATOR_PERMISSIONS: &[&str] = &[BOOKINGS_VIEW_ALL, BOOKINGS_MANAGE, SPOTS_MANAGE];

const MANAGER_PERMISSIONS: &[&str] = &[LOTS_MANAGE, REPORTS_VIEW, USERS_VIEW, SESSIONS_VIEW];

const ADMIN_PERMISSIONS: &[&str] = &[USERS_MANAGE, SESSIONS_MANAGE, SYSTEM_CONFIGURE];

/// Maps each role to its permission set.
///
/// Each role inherits every permission of the roles below it.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    policies: HashMap<UserRole, HashSet<&'static str>>,
}

impl RbacPolicies {
    pub fn new() -> Self {
        let mut policies = HashMap::new();
        let mut granted: HashSet<&'static str> = HashSet::new();

        for role in UserRole::ALL {
            let own = match role {
                UserRole::User => USER_PERMISSIONS,
                UserRole::Operator => OPERATOR_PERMISSIONS,
                UserRole::Manager => MANAGER_PERMISSIONS,
                UserRole::Admin => ADMIN_PERMISSIONS,
            };
            granted.extend(own.iter().copied());
            policies.insert(role, granted.clone());
        }

        Self { policies }
    }

    /// Permissions granted to `role`.
    pub fn permissions_for_role(&self, role: UserRole) -> HashSet<&'static str> {
        self.policies.get(&role).cloned().unwrap_or_default()
    }

    pub fn has_permission(&self, role: UserRole, key: &str) -> bool {
        self.policies
            .get(&role)
            .is_some_and(|perms| perms.contains(key))
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}
