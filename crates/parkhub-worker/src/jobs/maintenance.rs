//! Blacklist pruning and expired-record cleanup.
//!
//! Both tasks are best effort: failures are logged and the next run retries.

use std::sync::Arc;

use tracing::{error, info};

use parkhub_auth::AuthManager;

/// Periodic cleanup over the auth stores.
#[derive(Debug, Clone)]
pub struct MaintenanceTasks {
    auth: Arc<AuthManager>,
}

impl MaintenanceTasks {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    /// Drop blacklist entries whose tokens have expired. Returns the count.
    pub async fn prune_blacklist(&self) -> u64 {
        match self.auth.prune_revocations().await {
            Ok(removed) => {
                info!(removed, "Revocation blacklist pruned");
                removed
            }
            Err(e) => {
                error!(error = %e, "Revocation blacklist prune failed");
                0
            }
        }
    }

    /// Delete ended sessions past retention and expired refresh/reset
    /// records. Returns the total number of rows removed.
    pub async fn sweep_expired(&self) -> u64 {
        match self.auth.sweep_expired().await {
            Ok((sessions, refresh_tokens, reset_tokens)) => {
                info!(sessions, refresh_tokens, reset_tokens, "Expired auth records swept");
                sessions + refresh_tokens + reset_tokens
            }
            Err(e) => {
                error!(error = %e, "Expired record sweep failed");
                0
            }
        }
    }
}
