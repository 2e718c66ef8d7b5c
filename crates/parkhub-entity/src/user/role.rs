//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the RBAC system.
///
/// Roles are totally ordered by privilege: User < Operator < Manager < Admin.
/// [`UserRole::level`] is the single source of that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// A regular customer account.
    User,
    /// Lot staff handling day-to-day operations.
    Operator,
    /// Manages a site, its staff, and reports.
    Manager,
    /// Full system administrator.
    Admin,
}

impl UserRole {
    /// Every role, lowest privilege first.
    pub const ALL: [UserRole; 4] = [Self::User, Self::Operator, Self::Manager, Self::Admin];

    /// Privilege level (higher = more privileged).
    pub fn level(&self) -> u8 {
        match self {
            Self::User => 1,
            Self::Operator => 2,
            Self::Manager => 3,
            Self::Admin => 4,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &UserRole) -> bool {
        self.level() >= other.level()
    }

    /// Return the role as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Operator => "OPERATOR",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = parkhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "OPERATOR" => Ok(Self::Operator),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(parkhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: USER, OPERATOR, MANAGER, ADMIN"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserRole::Admin.has_at_least(&UserRole::User));
        assert!(UserRole::Admin.has_at_least(&UserRole::Admin));
        assert!(UserRole::Manager.has_at_least(&UserRole::Operator));
        assert!(UserRole::Operator.has_at_least(&UserRole::User));
        assert!(!UserRole::User.has_at_least(&UserRole::Operator));
        assert!(!UserRole::Operator.has_at_least(&UserRole::Manager));
    }

    #[test]
    fn test_all_is_sorted_by_level() {
        let levels: Vec<u8> = UserRole::ALL.iter().map(UserRole::level).collect();
        assert_eq!(levels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("OPERATOR".parse::<UserRole>().unwrap(), UserRole::Operator);
        assert!("viewer".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serializes_uppercase() {
        let json = serde_json::to_string(&UserRole::Manager).unwrap();
        assert_eq!(json, "\"MANAGER\"");
    }
}
