//! Application state shared across all handlers.

use std::sync::Arc;

use parkhub_auth::AuthManager;
use parkhub_cache::CacheManager;
use parkhub_core::config::AppConfig;
use parkhub_database::DatabasePool;

/// Passed to every handler via `State<AppState>`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthManager>,
    pub cache: CacheManager,
    /// Absent when running on the in-memory backend.
    pub db: Option<DatabasePool>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        auth: Arc<AuthManager>,
        cache: CacheManager,
        db: Option<DatabasePool>,
    ) -> Self {
        Self {
            config,
            auth,
            cache,
            db,
        }
    }
}
