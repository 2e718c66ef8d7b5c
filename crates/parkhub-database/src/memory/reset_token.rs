//! In-memory password-reset tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use parkhub_core::result::AppResult;
use parkhub_entity::reset::{NewResetToken, PasswordResetToken};

use crate::repositories::{ResetConsume, ResetTokenRepository, UserRepository};

pub struct MemoryResetTokenRepository {
    /// Tokens keyed by hash.
    tokens: DashMap<String, PasswordResetToken>,
    /// Serializes issue and redemption, so a user never holds two open
    /// tokens and a token is spent only with its password write.
    issue_lock: Mutex<()>,
    users: Arc<dyn UserRepository>,
}

impl MemoryResetTokenRepository {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            tokens: DashMap::new(),
            issue_lock: Mutex::new(()),
            users,
        }
    }
}

#[async_trait]
impl ResetTokenRepository for MemoryResetTokenRepository {
    async fn replace_for_user(&self, data: &NewResetToken) -> AppResult<PasswordResetToken> {
        let _guard = self.issue_lock.lock().await;
        self.tokens
            .retain(|_, t| !(t.user_id == data.user_id && t.consumed_at.is_none()));

        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            token_hash: data.token_hash.clone(),
            issued_at: Utc::now(),
            expires_at: data.expires_at,
            consumed_at: None,
        };
        self.tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn redeem(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ResetConsume> {
        let _guard = self.issue_lock.lock().await;

        let Some(token) = self.tokens.get(token_hash).map(|t| t.clone()) else {
            return Ok(ResetConsume::NotFound);
        };
        if token.consumed_at.is_some() {
            return Ok(ResetConsume::AlreadyConsumed);
        }
        if token.is_expired_at(now) {
            return Ok(ResetConsume::Expired);
        }

        self.users
            .update_password(token.user_id, password_hash)
            .await?;

        let Some(mut stored) = self.tokens.get_mut(token_hash) else {
            return Ok(ResetConsume::NotFound);
        };
        stored.consumed_at = Some(now);
        Ok(ResetConsume::Consumed(stored.clone()))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.tokens.retain(|_, t| {
            let keep = !t.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
