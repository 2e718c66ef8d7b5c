//! JWT issuance, verification, and refresh rotation.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod rotation;

pub use claims::{AccessClaims, RefreshClaims, TokenType};
pub use decoder::JwtDecoder;
pub use encoder::{IssuedTokens, JwtEncoder};
pub use rotation::RefreshRotator;
