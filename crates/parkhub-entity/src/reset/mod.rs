//! Password-reset entities.

pub mod model;

pub use model::{NewResetToken, PasswordResetToken};
