//! Session store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use parkhub_core::result::AppResult;
use parkhub_entity::session::{NewSession, Session};

/// Result of an atomic insert-and-trim.
#[derive(Debug, Clone)]
pub struct SessionInsert {
    /// The session that was inserted.
    pub session: Session,
    /// Sessions revoked to make room, oldest first.
    pub evicted: Vec<Session>,
}

/// Persistence of login sessions.
///
/// Every mutation is serialized per user by the implementation, so
/// concurrent logins can never leave more than `max_active` active sessions
/// and a rotation never revives a revoked session.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Revoke the oldest active sessions (by `created_at`, then `seq`) until
    /// fewer than `max_active` remain, then insert `data`.
    async fn insert_and_trim(
        &self,
        data: &NewSession,
        max_active: u32,
        now: DateTime<Utc>,
    ) -> AppResult<SessionInsert>;

    async fn find_by_token_id(&self, token_id: Uuid) -> AppResult<Option<Session>>;

    /// Update `last_accessed_at`.
    async fn touch(&self, token_id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Rebind the active session of `family_id` to `new_token_id`. Returns
    /// the previous token id, or `None` if the family has no active session.
    async fn rekey(
        &self,
        family_id: Uuid,
        new_token_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>>;

    /// Revoke the session of a refresh family, whichever access token it is
    /// currently bound to. Serialized with `rekey`. Returns it if it was
    /// active.
    async fn revoke_family(
        &self,
        family_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Revoke a single session. Returns it if it was active.
    async fn revoke(
        &self,
        token_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Revoke every active session of a user, optionally sparing one refresh
    /// family. Returns the sessions revoked.
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>>;

    /// Active sessions, oldest first.
    async fn list_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>)
    -> AppResult<Vec<Session>>;

    async fn count_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Delete rows that expired or were revoked before `cutoff`.
    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
