//! Custom Axum extractors.

pub mod auth;
pub mod device;
pub mod json;

pub use auth::{AuthUser, bearer_token};
pub use device::ClientDevice;
pub use json::ValidatedJson;
