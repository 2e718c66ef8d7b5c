//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::user::UserRole;

/// A login session, keyed by the id (`jti`) of its current access token.
///
/// Sessions are created on login, re-keyed on refresh, and revoked on
/// logout, eviction, or credential change. `Expired` is derived from
/// `expires_at`, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Id of the access token currently bound to this session.
    pub token_id: Uuid,
    /// Refresh family the session was issued under.
    pub family_id: Uuid,
    pub user_id: Uuid,
    /// Role at login time.
    pub role: UserRole,
    /// Email at login time.
    pub email: String,
    /// Hash of the client's user agent, accept headers, and IP.
    pub device_fingerprint: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    /// End of the refresh family's lifetime.
    pub expires_at: DateTime<Utc>,
    /// Monotonic insertion order; breaks `created_at` ties on eviction.
    pub seq: i64,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoke_reason: Option<String>,
}

impl Session {
    /// Active means neither revoked nor past `expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.family_id,
            user_agent: self.user_agent.clone(),
            ip_address: self.ip_address.clone(),
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            expires_at: self.expires_at,
        }
    }
}

/// Data required to create a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub email: String,
    pub device_fingerprint: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Client-facing session listing entry.
///
/// Exposes the stable family id rather than the rotating access-token id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
