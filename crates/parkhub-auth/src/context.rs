//! Typed request identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use parkhub_entity::user::UserRole;

use crate::digest::sha256_hex;

/// Client device details captured at login.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceInfo {
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub accept_encoding: Option<String>,
    pub ip_address: Option<String>,
}

impl DeviceInfo {
    /// Stable hash of the device details.
    ///
    /// Advisory only: every input is client-controlled or shared behind NAT.
    pub fn fingerprint(&self) -> String {
        let parts = [
            self.user_agent.as_deref().unwrap_or(""),
            self.accept_language.as_deref().unwrap_or(""),
            self.accept_encoding.as_deref().unwrap_or(""),
            self.ip_address.as_deref().unwrap_or(""),
        ];
        sha256_hex(parts.join("\u{1f}").as_bytes())
    }
}

/// The authenticated caller, produced by `AuthManager::authenticate`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Id of the access token presented.
    pub token_id: Uuid,
    /// Refresh family of the session.
    pub family_id: Uuid,
    /// Expiry of the access token presented.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_changes_with_user_agent() {
        let a = DeviceInfo {
            user_agent: Some("Mozilla/5.0".into()),
            ip_address: Some("10.0.0.1".into()),
            ..DeviceInfo::default()
        };
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.user_agent = Some("curl/8.0".into());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
