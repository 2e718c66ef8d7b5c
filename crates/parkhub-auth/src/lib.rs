//! # parkhub-auth
//!
//! Authentication core for ParkHub.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing and strength rules
//! - `jwt`: access/refresh issuance, verification, and refresh rotation
//! - `revocation`: durable token blacklist with a cache in front
//! - `session`: per-user session policy and device fingerprints
//! - `rbac`: role membership, permission table, and role hierarchy
//! - `reset`: password-reset token lifecycle
//! - `manager`: the operations exposed to the HTTP layer

pub mod context;
mod digest;
pub mod error;
pub mod jwt;
pub mod manager;
pub mod password;
pub mod rbac;
pub mod reset;
pub mod revocation;
pub mod session;

pub use context::{AuthContext, DeviceInfo};
pub use error::{AuthError, AuthResult};
pub use jwt::{AccessClaims, JwtDecoder, JwtEncoder, RefreshClaims, RefreshRotator};
pub use manager::{AuthManager, AuthSession, Signup};
pub use password::{PasswordHasher, PasswordStrength, PasswordValidator};
pub use rbac::{RbacEnforcer, RbacPolicies};
pub use reset::{LoggingResetNotifier, PasswordResetFlow, ResetNotifier};
pub use revocation::RevocationRegistry;
pub use session::{SessionCreated, SessionPolicy, SessionStore};

#[cfg(test)]
pub(crate) mod testing;
