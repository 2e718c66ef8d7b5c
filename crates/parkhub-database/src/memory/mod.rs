//! Process-local repository implementations.
//!
//! Atomicity matches the PostgreSQL implementations: check-and-set on a
//! single record happens under the map's shard lock, and per-user session
//! mutations are serialized by a per-user async mutex.

pub mod refresh_token;
pub mod reset_token;
pub mod revocation;
pub mod session;
pub mod user;

pub use refresh_token::MemoryRefreshTokenRepository;
pub use reset_token::MemoryResetTokenRepository;
pub use revocation::MemoryRevocationRepository;
pub use session::MemorySessionRepository;
pub use user::MemoryUserRepository;
