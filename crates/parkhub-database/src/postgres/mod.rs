//! PostgreSQL repository implementations.

pub mod refresh_token;
pub mod reset_token;
pub mod revocation;
pub mod session;
pub mod user;

pub use refresh_token::PgRefreshTokenRepository;
pub use reset_token::PgResetTokenRepository;
pub use revocation::PgRevocationRepository;
pub use session::PgSessionRepository;
pub use user::PgUserRepository;
