//! Session and token domain entities.

pub mod model;
pub mod refresh;
pub mod token;

pub use model::{NewSession, Session, SessionSummary};
pub use refresh::{NewRefreshToken, RefreshTokenRecord};
pub use token::{RevokedToken, TokenPair};
