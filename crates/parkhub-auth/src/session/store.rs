//! Session store enforcing the per-user concurrent-session limit.
//!
//! One session per issued access token. Creating a session beyond the
//! limit revokes the oldest active sessions for that user, blacklisting
//! their access tokens and closing their refresh families.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use parkhub_core::config::SessionConfig;
use parkhub_core::result::AppResult;
use parkhub_database::deadline;
use parkhub_database::repositories::{RefreshTokenRepository, SessionRepository};
use parkhub_entity::session::{NewSession, Session};

use crate::revocation::RevocationRegistry;

/// Per-login session policy.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// Maximum simultaneously active sessions per user.
    pub max_concurrent_sessions: u32,
    /// Flag logins from a device that differs from the user's other sessions.
    pub require_device_consistency: bool,
}

impl From<&SessionConfig> for SessionPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            max_concurrent_sessions: config.max_concurrent_sessions,
            require_device_consistency: config.require_device_consistency,
        }
    }
}

/// Outcome of creating a session.
#[derive(Debug, Clone)]
pub struct SessionCreated {
    pub session: Session,
    /// Sessions revoked to make room, oldest first.
    pub evicted: Vec<Session>,
    /// The device differs from at least one other active session.
    pub device_mismatch: bool,
}

/// Session operations over the session and refresh-token stores.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<dyn SessionRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    revocations: RevocationRegistry,
    access_ttl: chrono::Duration,
    io_timeout: Duration,
}

impl SessionStore {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        revocations: RevocationRegistry,
        access_ttl: chrono::Duration,
        io_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            refresh_tokens,
            revocations,
            access_ttl,
            io_timeout,
        }
    }

    /// Record a new session, evicting the oldest if over the limit.
    pub async fn create_session(
        &self,
        data: NewSession,
        policy: SessionPolicy,
    ) -> AppResult<SessionCreated> {
        let now = Utc::now();

        let device_mismatch = if policy.require_device_consistency {
            let active = deadline::within(
                self.io_timeout,
                "session list",
                self.sessions.list_active_for_user(data.user_id, now),
            )
            .await?;
            active
                .iter()
                .any(|s| s.device_fingerprint != data.device_fingerprint)
        } else {
            false
        };

        let inserted = deadline::within(
            self.io_timeout,
            "session insert",
            self.sessions
                .insert_and_trim(&data, policy.max_concurrent_sessions.max(1), now),
        )
        .await?;

        for evicted in &inserted.evicted {
            self.retire(evicted, now).await?;
        }

        if !inserted.evicted.is_empty() {
            info!(
                user_id = %data.user_id,
                evicted = inserted.evicted.len(),
                limit = policy.max_concurrent_sessions,
                "Session limit reached, evicted oldest sessions"
            );
        }
        if device_mismatch {
            warn!(
                user_id = %data.user_id,
                ip = data.ip_address.as_deref().unwrap_or("unknown"),
                "Login from a device that differs from other active sessions"
            );
        }

        Ok(SessionCreated {
            session: inserted.session,
            evicted: inserted.evicted,
            device_mismatch,
        })
    }

    /// Look up a session by its access token id.
    pub async fn find(&self, token_id: Uuid) -> AppResult<Option<Session>> {
        deadline::within(
            self.io_timeout,
            "session lookup",
            self.sessions.find_by_token_id(token_id),
        )
        .await
    }

    /// Refresh `last_accessed_at`. Failures are logged, never surfaced.
    pub async fn touch(&self, token_id: Uuid) {
        let result = deadline::within(
            self.io_timeout,
            "session touch",
            self.sessions.touch(token_id, Utc::now()),
        )
        .await;
        if let Err(e) = result {
            debug!(token_id = %token_id, error = %e, "Failed to touch session");
        }
    }

    /// Move the session of `family_id` onto a new access token id.
    ///
    /// The previous access token is blacklisted. Returns `false` when the
    /// family has no active session.
    pub async fn rekey(&self, family_id: Uuid, new_token_id: Uuid) -> AppResult<bool> {
        let now = Utc::now();
        let previous = deadline::within(
            self.io_timeout,
            "session rekey",
            self.sessions.rekey(family_id, new_token_id, now),
        )
        .await?;

        match previous {
            Some(old_token_id) => {
                self.revocations
                    .revoke(old_token_id, now + self.access_ttl)
                    .await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// End one session by its access token id. Returns `false` if it was
    /// not active under that id.
    pub async fn delete_session(&self, token_id: Uuid, reason: &str) -> AppResult<bool> {
        let now = Utc::now();
        let revoked = deadline::within(
            self.io_timeout,
            "session revoke",
            self.sessions.revoke(token_id, reason, now),
        )
        .await?;
        self.finish_revoke(revoked, reason, now).await
    }

    /// End the session of a refresh family, whichever access token it is
    /// bound to after rotation. Returns `false` if it was not active.
    pub async fn end_family(&self, family_id: Uuid, reason: &str) -> AppResult<bool> {
        let now = Utc::now();
        let revoked = deadline::within(
            self.io_timeout,
            "session revoke",
            self.sessions.revoke_family(family_id, reason, now),
        )
        .await?;
        self.finish_revoke(revoked, reason, now).await
    }

    /// End every session of `user_id`, optionally sparing one refresh family.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        reason: &str,
    ) -> AppResult<u64> {
        let now = Utc::now();
        let revoked = deadline::within(
            self.io_timeout,
            "session revoke all",
            self.sessions
                .revoke_all_for_user(user_id, except_family, reason, now),
        )
        .await?;

        for session in &revoked {
            self.revocations
                .revoke(session.token_id, now + self.access_ttl)
                .await?;
        }

        // Families whose session already expired still hold refresh tokens.
        deadline::within(
            self.io_timeout,
            "refresh revoke all",
            self.refresh_tokens
                .revoke_all_for_user(user_id, except_family, now),
        )
        .await?;

        info!(user_id = %user_id, count = revoked.len(), reason, "Sessions revoked");
        Ok(revoked.len() as u64)
    }

    /// Close one refresh family and its session.
    pub async fn revoke_family(&self, family_id: Uuid) -> AppResult<()> {
        deadline::within(
            self.io_timeout,
            "refresh revoke family",
            self.refresh_tokens.revoke_family(family_id, Utc::now()),
        )
        .await?;
        Ok(())
    }

    pub async fn list_active(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        deadline::within(
            self.io_timeout,
            "session list",
            self.sessions.list_active_for_user(user_id, Utc::now()),
        )
        .await
    }

    pub async fn count_active(&self, user_id: Uuid) -> AppResult<u64> {
        deadline::within(
            self.io_timeout,
            "session count",
            self.sessions.count_active_for_user(user_id, Utc::now()),
        )
        .await
    }

    /// Delete sessions that ended or expired before `now - retention`, and
    /// refresh records past their expiry.
    pub async fn sweep(&self, retention: chrono::Duration) -> AppResult<(u64, u64)> {
        let now = Utc::now();
        let sessions = deadline::within(
            self.io_timeout,
            "session sweep",
            self.sessions.delete_stale(now - retention),
        )
        .await?;
        let refresh = deadline::within(
            self.io_timeout,
            "refresh sweep",
            self.refresh_tokens.delete_expired(now),
        )
        .await?;
        Ok((sessions, refresh))
    }

    async fn finish_revoke(
        &self,
        revoked: Option<Session>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        match revoked {
            Some(session) => {
                self.retire(&session, now).await?;
                info!(user_id = %session.user_id, reason, "Session ended");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn retire(&self, session: &Session, now: DateTime<Utc>) -> AppResult<()> {
        self.revocations
            .revoke(session.token_id, now + self.access_ttl)
            .await?;
        deadline::within(
            self.io_timeout,
            "refresh revoke family",
            self.refresh_tokens.revoke_family(session.family_id, now),
        )
        .await?;
        Ok(())
    }
}
