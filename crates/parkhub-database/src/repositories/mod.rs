//! Repository interfaces consumed by the auth core.

pub mod refresh_token;
pub mod reset_token;
pub mod revocation;
pub mod session;
pub mod user;

use std::sync::Arc;

use sqlx::PgPool;

pub use refresh_token::{RefreshConsume, RefreshTokenRepository};
pub use reset_token::{ResetConsume, ResetTokenRepository};
pub use revocation::RevocationRepository;
pub use session::{SessionInsert, SessionRepository};
pub use user::UserRepository;

use crate::{memory, postgres};

/// The full set of stores, shared behind `Arc`s.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub revocations: Arc<dyn RevocationRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub reset_tokens: Arc<dyn ResetTokenRepository>,
}

impl Repositories {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            sessions: Arc::new(postgres::PgSessionRepository::new(pool.clone())),
            revocations: Arc::new(postgres::PgRevocationRepository::new(pool.clone())),
            refresh_tokens: Arc::new(postgres::PgRefreshTokenRepository::new(pool.clone())),
            reset_tokens: Arc::new(postgres::PgResetTokenRepository::new(pool)),
        }
    }

    /// Process-local stores. State is lost on restart.
    pub fn in_memory() -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(memory::MemoryUserRepository::default());
        Self {
            reset_tokens: Arc::new(memory::MemoryResetTokenRepository::new(users.clone())),
            users,
            sessions: Arc::new(memory::MemorySessionRepository::default()),
            revocations: Arc::new(memory::MemoryRevocationRepository::default()),
            refresh_tokens: Arc::new(memory::MemoryRefreshTokenRepository::default()),
        }
    }
}
