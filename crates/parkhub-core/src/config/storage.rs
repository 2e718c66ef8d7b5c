//! Persistence backend configuration.

use serde::{Deserialize, Serialize};

/// Which repository implementation backs the auth stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// Process-local maps. Single node only.
    Memory,
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Repository backend.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Deadline applied to every store call, in milliseconds.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            io_timeout_ms: default_io_timeout(),
        }
    }
}

fn default_io_timeout() -> u64 {
    5_000
}
