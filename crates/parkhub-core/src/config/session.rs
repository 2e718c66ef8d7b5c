//! Session policy and maintenance configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of concurrently active sessions per user.
    #[serde(default = "default_max_sessions")]
    pub max_concurrent_sessions: u32,
    /// Whether to flag logins from a device that differs from the user's
    /// other active sessions.
    #[serde(default = "default_true")]
    pub require_device_consistency: bool,
    /// Hours a revoked or expired session row is retained before the sweep
    /// deletes it.
    #[serde(default = "default_retention")]
    pub retention_hours: u64,
    /// Cron expression for the expired session sweep.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
    /// Cron expression for pruning expired revocation entries.
    #[serde(default = "default_prune_cron")]
    pub blacklist_prune_cron: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: default_max_sessions(),
            require_device_consistency: true,
            retention_hours: default_retention(),
            cleanup_cron: default_cleanup_cron(),
            blacklist_prune_cron: default_prune_cron(),
        }
    }
}

fn default_max_sessions() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_retention() -> u64 {
    24
}

fn default_cleanup_cron() -> String {
    "0 */15 * * * *".to_string()
}

fn default_prune_cron() -> String {
    "0 */10 * * * *".to_string()
}
