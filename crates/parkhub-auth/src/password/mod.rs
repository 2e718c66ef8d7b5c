//! Password hashing and strength rules.

pub mod hasher;
pub mod validator;

pub use hasher::PasswordHasher;
pub use validator::{PasswordStrength, PasswordValidator};
