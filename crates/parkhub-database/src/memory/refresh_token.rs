//! In-memory refresh-token records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use parkhub_core::error::AppError;
use parkhub_core::result::AppResult;
use parkhub_entity::session::{NewRefreshToken, RefreshTokenRecord};

use crate::repositories::{RefreshConsume, RefreshTokenRepository};

#[derive(Debug, Default)]
pub struct MemoryRefreshTokenRepository {
    records: DashMap<Uuid, RefreshTokenRecord>,
}

impl MemoryRefreshTokenRepository {
    fn revoke_where<F>(&self, now: DateTime<Utc>, matches: F) -> u64
    where
        F: Fn(&RefreshTokenRecord) -> bool,
    {
        let mut touched = 0u64;
        for mut record in self.records.iter_mut() {
            if record.revoked_at.is_none() && matches(record.value()) {
                record.revoked_at = Some(now);
                touched += 1;
            }
        }
        touched
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, data: &NewRefreshToken) -> AppResult<()> {
        let record = RefreshTokenRecord {
            jti: data.jti,
            family_id: data.family_id,
            user_id: data.user_id,
            issued_at: Utc::now(),
            expires_at: data.expires_at,
            consumed_at: None,
            revoked_at: None,
        };
        match self.records.entry(data.jti) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Refresh token {} already recorded",
                data.jti
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn consume(&self, jti: Uuid, now: DateTime<Utc>) -> AppResult<RefreshConsume> {
        let Some(mut record) = self.records.get_mut(&jti) else {
            return Ok(RefreshConsume::NotFound);
        };
        if record.consumed_at.is_some() {
            return Ok(RefreshConsume::AlreadyConsumed(record.clone()));
        }
        if record.revoked_at.is_some() {
            return Ok(RefreshConsume::Revoked(record.clone()));
        }
        record.consumed_at = Some(now);
        Ok(RefreshConsume::Consumed(record.clone()))
    }

    async fn revoke_family(&self, family_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.revoke_where(now, |r| r.family_id == family_id))
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_family: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        Ok(self.revoke_where(now, |r| {
            r.user_id == user_id && Some(r.family_id) != except_family
        }))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.records.retain(|_, r| {
            let keep = r.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(family_id: Uuid) -> NewRefreshToken {
        NewRefreshToken {
            jti: Uuid::new_v4(),
            family_id,
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let repo = MemoryRefreshTokenRepository::default();
        let data = record(Uuid::new_v4());
        repo.insert(&data).await.unwrap();

        let now = Utc::now();
        assert!(matches!(
            repo.consume(data.jti, now).await.unwrap(),
            RefreshConsume::Consumed(_)
        ));
        assert!(matches!(
            repo.consume(data.jti, now).await.unwrap(),
            RefreshConsume::AlreadyConsumed(_)
        ));
        assert!(matches!(
            repo.consume(Uuid::new_v4(), now).await.unwrap(),
            RefreshConsume::NotFound
        ));
    }

    #[tokio::test]
    async fn test_revoked_family_cannot_be_consumed() {
        let repo = MemoryRefreshTokenRepository::default();
        let family = Uuid::new_v4();
        let data = record(family);
        repo.insert(&data).await.unwrap();

        assert_eq!(repo.revoke_family(family, Utc::now()).await.unwrap(), 1);
        assert!(matches!(
            repo.consume(data.jti, Utc::now()).await.unwrap(),
            RefreshConsume::Revoked(_)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_consume_has_one_winner() {
        let repo = std::sync::Arc::new(MemoryRefreshTokenRepository::default());
        let data = record(Uuid::new_v4());
        repo.insert(&data).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let jti = data.jti;
            handles.push(tokio::spawn(async move {
                repo.consume(jti, Utc::now()).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), RefreshConsume::Consumed(_)) {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
