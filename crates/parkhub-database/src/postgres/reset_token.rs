//! Password-reset tokens backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use parkhub_core::error::{AppError, ErrorKind};
use parkhub_core::result::AppResult;
use parkhub_entity::reset::{NewResetToken, PasswordResetToken};

use crate::repositories::{ResetConsume, ResetTokenRepository};

#[derive(Debug, Clone)]
pub struct PgResetTokenRepository {
    pool: PgPool,
}

impl PgResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenRepository for PgResetTokenRepository {
    async fn replace_for_user(&self, data: &NewResetToken) -> AppResult<PasswordResetToken> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1 AND consumed_at IS NULL")
            .bind(data.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to discard reset token", e)
            })?;

        let token = sqlx::query_as::<_, PasswordResetToken>(
            "INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store reset token", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;
        Ok(token)
    }

    async fn redeem(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ResetConsume> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let consumed = sqlx::query_as::<_, PasswordResetToken>(
            "UPDATE password_reset_tokens SET consumed_at = $2 \
             WHERE token_hash = $1 AND consumed_at IS NULL AND expires_at > $2 RETURNING *",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to consume reset token", e)
        })?;

        if let Some(token) = consumed {
            sqlx::query(
                "UPDATE users SET password_hash = $2, failed_login_attempts = 0, \
                 locked_until = NULL, updated_at = NOW() WHERE id = $1",
            )
            .bind(token.user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update password", e)
            })?;

            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
            })?;
            return Ok(ResetConsume::Consumed(token));
        }
        drop(tx);

        let existing = sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load reset token", e))?;

        Ok(match existing {
            None => ResetConsume::NotFound,
            Some(token) if token.consumed_at.is_some() => ResetConsume::AlreadyConsumed,
            Some(_) => ResetConsume::Expired,
        })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete reset tokens", e)
            })?;
        Ok(result.rows_affected())
    }
}
