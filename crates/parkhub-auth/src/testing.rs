//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use parkhub_cache::CacheManager;
use parkhub_cache::memory::MemoryCacheProvider;
use parkhub_core::config::{AuthConfig, MemoryCacheConfig, SessionConfig};
use parkhub_database::Repositories;
use parkhub_entity::user::{User, UserRole};

pub(crate) fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "unit-test-secret-0123456789abcdef".into(),
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        ..AuthConfig::default()
    }
}

pub(crate) fn session_config() -> SessionConfig {
    SessionConfig::default()
}

pub(crate) fn cache() -> CacheManager {
    CacheManager::from_provider(Arc::new(MemoryCacheProvider::new(
        &MemoryCacheConfig::default(),
    )))
}

pub(crate) fn io_timeout() -> Duration {
    Duration::from_secs(2)
}

pub(crate) fn repositories() -> Repositories {
    Repositories::in_memory()
}

pub(crate) fn user(email: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: String::new(),
        first_name: None,
        last_name: None,
        role: UserRole::User,
        is_active: true,
        failed_login_attempts: 0,
        locked_until: None,
        two_factor_secret: None,
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}
