//! User store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use parkhub_core::result::AppResult;
use parkhub_entity::user::{CreateUser, User};

/// Field-level access to user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user. Fails with a conflict error when the email is taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Replace the password hash and clear any lockout.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Increment the failed-login counter, setting `locked_until` to
    /// `lock_until` once the counter reaches `max_attempts`. A lock that
    /// expired before `now` is cleared and the count restarts from zero.
    /// Returns the new counter value.
    async fn record_failed_login(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<i32>;

    /// Reset the failed-login counter and stamp `last_login_at`.
    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Soft (de)activation.
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()>;
}
