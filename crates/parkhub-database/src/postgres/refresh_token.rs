//! Refresh-token records backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use parkhub_core::error::{AppError, ErrorKind};
use parkhub_core::result::AppResult;
use parkhub_entity::session::{NewRefreshToken, RefreshTokenRecord};

use crate::repositories::{RefreshConsume, RefreshTokenRepository};

#[derive(Debug, Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, data: &NewRefreshToken) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (jti, family_id, user_id, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(data.jti)
        .bind(data.family_id)
        .bind(data.user_id)
        .bind(data.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store refresh token", e)
        })?;
        Ok(())
    }

    async fn consume(&self, jti: Uuid, now: DateTime<Utc>) -> AppResult<RefreshConsume> {
        let consumed = sqlx::query_as::<_, RefreshTokenRecord>(
            "UPDATE refresh_tokens SET consumed_at = $2 \
             WHERE jti = $1 AND consumed_at IS NULL AND revoked_at IS NULL RETURNING *",
        )
        .bind(jti)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to consume refresh token", e)
        })?;

        if let Some(record) = consumed {
            return Ok(RefreshConsume::Consumed(record));
        }

        let existing =
            sqlx::query_as::<_, RefreshTokenRecord>("SELECT * FROM refresh_tokens WHERE jti = $1")
                .bind(jti)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load refresh token", e)
                })?;

        Ok(match existing {
            None => RefreshConsume::NotFound,
            Some(record) if record.consumed_at.is_some() => RefreshConsume::AlreadyConsumed(record),
            Some(record) => RefreshConsume::Revoked(record),
        })
    }

    async fn revoke_family(&self, family_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 \
             WHERE family_id = $1 AND revoked_at IS NULL",
        )
        .bind(family_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke refresh family", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $3 \
             WHERE user_id = $1 AND revoked_at IS NULL \
             AND ($2::uuid IS NULL OR family_id <> $2)",
        )
        .bind(user_id)
        .bind(except_family)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke refresh tokens", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete refresh tokens", e)
            })?;
        Ok(result.rows_affected())
    }
}
