//! Token value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An issued access/refresh pair as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Access token TTL in seconds.
    pub expires_in: u64,
    /// Refresh token TTL in seconds.
    pub refresh_expires_in: u64,
}

/// A revoked token id, kept until the token would have expired anyway.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}
