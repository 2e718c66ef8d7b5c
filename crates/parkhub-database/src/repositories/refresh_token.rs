//! Refresh-token record interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use parkhub_core::result::AppResult;
use parkhub_entity::session::{NewRefreshToken, RefreshTokenRecord};

/// Outcome of trying to consume a refresh token.
#[derive(Debug, Clone)]
pub enum RefreshConsume {
    /// This caller consumed the token.
    Consumed(RefreshTokenRecord),
    /// The token had already been consumed.
    AlreadyConsumed(RefreshTokenRecord),
    /// The token's family was revoked before it was used.
    Revoked(RefreshTokenRecord),
    /// No record exists for the token id.
    NotFound,
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    async fn insert(&self, data: &NewRefreshToken) -> AppResult<()>;

    /// Atomically mark the token consumed. At most one caller ever observes
    /// [`RefreshConsume::Consumed`] for a given `jti`.
    async fn consume(&self, jti: Uuid, now: DateTime<Utc>) -> AppResult<RefreshConsume>;

    /// Revoke every record in a family. Returns the number of records touched.
    async fn revoke_family(&self, family_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Revoke every family of a user, optionally sparing one.
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
