//! Persisted refresh-token records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side record of an issued refresh token.
///
/// A record may be consumed at most once. A family is the chain of refresh
/// tokens descending from one login; revoking the family invalidates every
/// member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// The refresh token's `jti`.
    pub jti: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set when the token is exchanged for a new pair.
    pub consumed_at: Option<DateTime<Utc>>,
    /// Set when the whole family is revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Data required to persist a newly issued refresh token.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub jti: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
