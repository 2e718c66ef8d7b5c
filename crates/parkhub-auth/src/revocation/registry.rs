//! Revocation registry: durable blacklist with a positive cache in front.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use parkhub_cache::CacheManager;
use parkhub_cache::keys;
use parkhub_core::result::AppResult;
use parkhub_core::traits::CacheProvider;
use parkhub_database::deadline;
use parkhub_database::repositories::RevocationRepository;

/// Records revoked token ids until their natural expiry.
///
/// The durable store is authoritative. The cache only remembers positive
/// answers, so a cold or unreachable cache costs a store lookup, never a
/// resurrected token.
#[derive(Clone)]
pub struct RevocationRegistry {
    store: Arc<dyn RevocationRepository>,
    cache: CacheManager,
    io_timeout: Duration,
}

impl std::fmt::Debug for RevocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationRegistry")
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}

impl RevocationRegistry {
    pub fn new(
        store: Arc<dyn RevocationRepository>,
        cache: CacheManager,
        io_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            io_timeout,
        }
    }

    /// Revoke `token_id` until `natural_expiry`. Idempotent.
    pub async fn revoke(&self, token_id: Uuid, natural_expiry: DateTime<Utc>) -> AppResult<()> {
        let inserted = deadline::within(
            self.io_timeout,
            "revocation insert",
            self.store.insert(token_id, natural_expiry),
        )
        .await?;

        let remaining = (natural_expiry - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        if !remaining.is_zero() {
            if let Err(e) = self
                .cache
                .set(&keys::revoked_token(token_id), "1", remaining)
                .await
            {
                warn!(token_id = %token_id, error = %e, "Failed to cache revocation");
            }
        }

        if inserted {
            debug!(token_id = %token_id, "Token revoked");
        }
        Ok(())
    }

    /// Whether `token_id` has been revoked.
    pub async fn is_revoked(&self, token_id: Uuid) -> AppResult<bool> {
        match self.cache.exists(&keys::revoked_token(token_id)).await {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Revocation cache unavailable, using store"),
        }

        deadline::within(
            self.io_timeout,
            "revocation lookup",
            self.store.contains(token_id),
        )
        .await
    }

    /// Drop entries whose tokens have expired on their own.
    pub async fn prune(&self) -> AppResult<u64> {
        deadline::within(
            self.io_timeout,
            "revocation prune",
            self.store.delete_expired(Utc::now()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use parkhub_cache::memory::MemoryCacheProvider;
    use parkhub_core::config::MemoryCacheConfig;
    use parkhub_database::memory::MemoryRevocationRepository;

    fn registry() -> (RevocationRegistry, Arc<MemoryRevocationRepository>) {
        let store = Arc::new(MemoryRevocationRepository::default());
        let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::new(
            &MemoryCacheConfig::default(),
        )));
        (
            RevocationRegistry::new(store.clone(), cache, Duration::from_secs(1)),
            store,
        )
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (registry, _) = registry();
        let id = Uuid::new_v4();
        let exp = Utc::now() + ChronoDuration::minutes(15);

        assert!(!registry.is_revoked(id).await.unwrap());
        registry.revoke(id, exp).await.unwrap();
        registry.revoke(id, exp).await.unwrap();
        assert!(registry.is_revoked(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_answers_on_cache_miss() {
        let (registry, store) = registry();
        let id = Uuid::new_v4();
        store
            .insert(id, Utc::now() + ChronoDuration::minutes(5))
            .await
            .unwrap();
        assert!(registry.is_revoked(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_prune_removes_naturally_expired() {
        let (registry, _) = registry();
        let stale = Uuid::new_v4();
        let live = Uuid::new_v4();
        registry
            .revoke(stale, Utc::now() - ChronoDuration::seconds(1))
            .await
            .unwrap();
        registry
            .revoke(live, Utc::now() + ChronoDuration::minutes(5))
            .await
            .unwrap();

        assert_eq!(registry.prune().await.unwrap(), 1);
        assert!(!registry.is_revoked(stale).await.unwrap());
        assert!(registry.is_revoked(live).await.unwrap());
    }
}
