//! Token blacklist backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use parkhub_core::error::{AppError, ErrorKind};
use parkhub_core::result::AppResult;

use crate::repositories::RevocationRepository;

#[derive(Debug, Clone)]
pub struct PgRevocationRepository {
    pool: PgPool,
}

impl PgRevocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationRepository for PgRevocationRepository {
    async fn insert(&self, token_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO revoked_tokens (token_id, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_id) DO NOTHING",
        )
        .bind(token_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke token", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn contains(&self, token_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_id = $1)")
            .bind(token_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check revocation", e)
            })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to prune revoked tokens", e)
            })?;
        Ok(result.rows_affected())
    }
}
