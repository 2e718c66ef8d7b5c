//! Durable token blacklist interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use parkhub_core::result::AppResult;

#[async_trait]
pub trait RevocationRepository: Send + Sync + 'static {
    /// Record a revoked token id. Returns `false` if it was already present.
    async fn insert(&self, token_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<bool>;

    async fn contains(&self, token_id: Uuid) -> AppResult<bool>;

    /// Remove entries whose token would have expired by `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
