//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered ParkHub account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address, stored lowercase.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// User role (RBAC).
    pub role: UserRole,
    /// Deactivated accounts cannot log in or refresh.
    pub is_active: bool,
    /// Number of consecutive failed login attempts.
    #[serde(skip_serializing)]
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    #[serde(skip_serializing)]
    pub locked_until: Option<DateTime<Utc>>,
    /// TOTP secret, reserved for two-factor enrollment.
    #[serde(skip_serializing)]
    pub two_factor_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the account is locked at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Project the user into the shape returned to clients.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Client-safe view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address; normalized to lowercase by the repository.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Assigned role.
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "driver@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: Some("Dana".to_string()),
            last_name: None,
            role: UserRole::User,
            is_active: true,
            failed_login_attempts: 2,
            locked_until: None,
            two_factor_secret: Some("JBSWY3DPEHPK3PXP".to_string()),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    #[test]
    fn test_serialization_omits_secrets() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("two_factor_secret").is_none());
        assert!(json.get("failed_login_attempts").is_none());
        assert!(json.get("locked_until").is_none());
        assert_eq!(json["email"], "driver@example.com");
    }

    #[test]
    fn test_lock_window() {
        let now = Utc::now();
        let mut u = user();
        assert!(!u.is_locked_at(now));
        u.locked_until = Some(now + Duration::minutes(5));
        assert!(u.is_locked_at(now));
        assert!(!u.is_locked_at(now + Duration::minutes(6)));
    }
}
