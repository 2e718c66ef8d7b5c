//! Delivery of reset tokens to their owners.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use parkhub_core::result::AppResult;
use parkhub_entity::user::User;

/// Delivers a raw reset token to the account owner, for example by email.
#[async_trait]
pub trait ResetNotifier: Send + Sync + std::fmt::Debug + 'static {
    async fn send_reset_token(
        &self,
        user: &User,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Records that a token was issued. Never logs the token itself.
#[derive(Debug, Clone, Default)]
pub struct LoggingResetNotifier;

#[async_trait]
impl ResetNotifier for LoggingResetNotifier {
    async fn send_reset_token(
        &self,
        user: &User,
        _raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        info!(user_id = %user.id, expires_at = %expires_at, "Password reset token issued");
        Ok(())
    }
}
