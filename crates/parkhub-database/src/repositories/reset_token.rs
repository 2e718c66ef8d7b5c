//! Password-reset token interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use parkhub_core::result::AppResult;
use parkhub_entity::reset::{NewResetToken, PasswordResetToken};

/// Outcome of trying to redeem a reset token.
#[derive(Debug, Clone)]
pub enum ResetConsume {
    Consumed(PasswordResetToken),
    AlreadyConsumed,
    Expired,
    NotFound,
}

#[async_trait]
pub trait ResetTokenRepository: Send + Sync + 'static {
    /// Discard the user's outstanding token, if any, and store a new one.
    async fn replace_for_user(&self, data: &NewResetToken) -> AppResult<PasswordResetToken>;

    /// Consume the token with the given hash and store `password_hash` for
    /// its user as one atomic step. On error the token stays redeemable.
    async fn redeem(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ResetConsume>;

    /// Delete tokens that expired before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
