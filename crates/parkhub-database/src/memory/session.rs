//! In-memory session store.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use parkhub_core::result::AppResult;
use parkhub_entity::session::{NewSession, Session};

use crate::repositories::{SessionInsert, SessionRepository};

#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    /// Sessions keyed by current access-token id.
    sessions: DashMap<Uuid, Session>,
    user_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    seq: AtomicI64,
}

impl MemorySessionRepository {
    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().clone()
    }

    fn active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Vec<Session> {
        let mut active: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active_at(now))
            .map(|s| s.clone())
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
        active
    }

    fn owner_of(&self, pred: impl Fn(&Session) -> bool) -> Option<Uuid> {
        self.sessions.iter().find(|s| pred(s)).map(|s| s.user_id)
    }

    fn mark_revoked(&self, token_id: Uuid, reason: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut session = self.sessions.get_mut(&token_id)?;
        if session.revoked_at.is_some() {
            return None;
        }
        session.revoked_at = Some(now);
        session.revoke_reason = Some(reason.to_string());
        Some(session.clone())
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert_and_trim(
        &self,
        data: &NewSession,
        max_active: u32,
        now: DateTime<Utc>,
    ) -> AppResult<SessionInsert> {
        let lock = self.user_lock(data.user_id);
        let _guard = lock.lock().await;

        let active = self.active_for_user(data.user_id, now);
        let excess = (active.len() + 1).saturating_sub(max_active.max(1) as usize);
        let evicted: Vec<Session> = active
            .iter()
            .take(excess)
            .filter_map(|s| self.mark_revoked(s.token_id, "evicted", now))
            .collect();

        let session = Session {
            token_id: data.token_id,
            family_id: data.family_id,
            user_id: data.user_id,
            role: data.role,
            email: data.email.clone(),
            device_fingerprint: data.device_fingerprint.clone(),
            user_agent: data.user_agent.clone(),
            ip_address: data.ip_address.clone(),
            created_at: now,
            last_accessed_at: now,
            expires_at: data.expires_at,
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
            revoked_at: None,
            revoke_reason: None,
        };
        self.sessions.insert(session.token_id, session.clone());

        Ok(SessionInsert { session, evicted })
    }

    async fn find_by_token_id(&self, token_id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(&token_id).map(|s| s.clone()))
    }

    async fn touch(&self, token_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut session) = self.sessions.get_mut(&token_id) {
            session.last_accessed_at = at;
        }
        Ok(())
    }

    async fn rekey(
        &self,
        family_id: Uuid,
        new_token_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let Some(user_id) = self.owner_of(|s| s.family_id == family_id) else {
            return Ok(None);
        };

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let old_token_id = match self
            .sessions
            .iter()
            .find(|s| s.family_id == family_id && s.is_active_at(now))
            .map(|s| s.token_id)
        {
            Some(id) => id,
            None => return Ok(None),
        };

        let Some((_, mut session)) = self.sessions.remove(&old_token_id) else {
            return Ok(None);
        };
        if session.revoked_at.is_some() {
            self.sessions.insert(old_token_id, session);
            return Ok(None);
        }
        session.token_id = new_token_id;
        session.last_accessed_at = now;
        self.sessions.insert(new_token_id, session);
        Ok(Some(old_token_id))
    }

    async fn revoke_family(
        &self,
        family_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let Some(user_id) = self.owner_of(|s| s.family_id == family_id) else {
            return Ok(None);
        };

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let target = self
            .sessions
            .iter()
            .find(|s| s.family_id == family_id && s.revoked_at.is_none())
            .map(|s| s.token_id);
        Ok(target.and_then(|id| self.mark_revoked(id, reason, now)))
    }

    async fn revoke(
        &self,
        token_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let Some(user_id) = self.owner_of(|s| s.token_id == token_id) else {
            return Ok(None);
        };

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        Ok(self.mark_revoked(token_id, reason, now))
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let targets: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|s| {
                s.user_id == user_id
                    && s.revoked_at.is_none()
                    && Some(s.family_id) != except_family
            })
            .map(|s| s.token_id)
            .collect();

        Ok(targets
            .into_iter()
            .filter_map(|id| self.mark_revoked(id, reason, now))
            .collect())
    }

    async fn list_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        Ok(self.active_for_user(user_id, now))
    }

    async fn count_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active_at(now))
            .count() as u64)
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.sessions.retain(|_, s| {
            let stale = s.expires_at < cutoff || s.revoked_at.is_some_and(|at| at < cutoff);
            if stale {
                removed += 1;
            }
            !stale
        });
        Ok(removed)
    }
}
