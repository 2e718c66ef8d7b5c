//! In-memory token blacklist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use parkhub_core::result::AppResult;

use crate::repositories::RevocationRepository;

#[derive(Debug, Default)]
pub struct MemoryRevocationRepository {
    entries: DashMap<Uuid, DateTime<Utc>>,
}

#[async_trait]
impl RevocationRepository for MemoryRevocationRepository {
    async fn insert(&self, token_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<bool> {
        match self.entries.entry(token_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                Ok(true)
            }
        }
    }

    async fn contains(&self, token_id: Uuid) -> AppResult<bool> {
        Ok(self.entries.contains_key(&token_id))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.entries.retain(|_, expires_at| {
            let keep = *expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
