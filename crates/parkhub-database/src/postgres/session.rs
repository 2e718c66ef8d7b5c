//! Session repository backed by PostgreSQL.
//!
//! Per-user serialization uses a transaction-scoped advisory lock keyed on
//! the user id, so concurrent logins for one user queue behind each other
//! while logins for different users proceed in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use parkhub_core::error::{AppError, ErrorKind};
use parkhub_core::result::AppResult;
use parkhub_entity::session::{NewSession, Session};

use crate::repositories::{SessionInsert, SessionRepository};

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin_locked(&self, user_id: Uuid) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to acquire session lock", e)
            })?;
        Ok(tx)
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e))
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert_and_trim(
        &self,
        data: &NewSession,
        max_active: u32,
        now: DateTime<Utc>,
    ) -> AppResult<SessionInsert> {
        let mut tx = self.begin_locked(data.user_id).await?;

        let active: Vec<Uuid> = sqlx::query_scalar(
            "SELECT token_id FROM sessions \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2 \
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(data.user_id)
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active sessions", e)
        })?;

        let excess = (active.len() + 1).saturating_sub(max_active.max(1) as usize);
        let victims: Vec<Uuid> = active.into_iter().take(excess).collect();

        let mut evicted = if victims.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, Session>(
                "UPDATE sessions SET revoked_at = $2, revoke_reason = 'evicted' \
                 WHERE token_id = ANY($1) RETURNING *",
            )
            .bind(&victims)
            .bind(now)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to evict sessions", e)
            })?
        };
        evicted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));

        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token_id, family_id, user_id, role, email, device_fingerprint, \
             user_agent, ip_address, created_at, last_accessed_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10) RETURNING *",
        )
        .bind(data.token_id)
        .bind(data.family_id)
        .bind(data.user_id)
        .bind(data.role)
        .bind(&data.email)
        .bind(&data.device_fingerprint)
        .bind(&data.user_agent)
        .bind(&data.ip_address)
        .bind(now)
        .bind(data.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))?;

        commit(tx).await?;
        debug!(user_id = %data.user_id, evicted = evicted.len(), "Session inserted");
        Ok(SessionInsert { session, evicted })
    }

    async fn find_by_token_id(&self, token_id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_id = $1")
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn touch(&self, token_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET last_accessed_at = $2 WHERE token_id = $1")
            .bind(token_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch session", e))?;
        Ok(())
    }

    async fn rekey(
        &self,
        family_id: Uuid,
        new_token_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar(
            "WITH prev AS ( \
                 SELECT token_id FROM sessions \
                 WHERE family_id = $1 AND revoked_at IS NULL AND expires_at > $3 \
                 FOR UPDATE \
             ) \
             UPDATE sessions s SET token_id = $2, last_accessed_at = $3 \
             FROM prev WHERE s.token_id = prev.token_id \
             RETURNING prev.token_id",
        )
        .bind(family_id)
        .bind(new_token_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rekey session", e))
    }

    async fn revoke_family(
        &self,
        family_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        // Row locks order this against `rekey`: whichever commits second
        // sees the other's row version.
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET revoked_at = $2, revoke_reason = $3 \
             WHERE family_id = $1 AND revoked_at IS NULL RETURNING *",
        )
        .bind(family_id)
        .bind(now)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke session family", e)
        })
    }

    async fn revoke(
        &self,
        token_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET revoked_at = $2, revoke_reason = $3 \
             WHERE token_id = $1 AND revoked_at IS NULL RETURNING *",
        )
        .bind(token_id)
        .bind(now)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke session", e))
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        let mut tx = self.begin_locked(user_id).await?;
        let revoked = sqlx::query_as::<_, Session>(
            "UPDATE sessions SET revoked_at = $3, revoke_reason = $4 \
             WHERE user_id = $1 AND revoked_at IS NULL \
             AND ($2::uuid IS NULL OR family_id <> $2) RETURNING *",
        )
        .bind(user_id)
        .bind(except_family)
        .bind(now)
        .bind(reason)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user sessions", e)
        })?;
        commit(tx).await?;
        Ok(revoked)
    }

    async fn list_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2 \
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active sessions", e)
        })
    }

    async fn count_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count active sessions", e)
        })?;
        Ok(count.max(0) as u64)
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE expires_at < $1 OR revoked_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete stale sessions", e)
        })?;
        Ok(result.rows_affected())
    }
}
