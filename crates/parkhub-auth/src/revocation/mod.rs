//! Token revocation.

pub mod registry;

pub use registry::RevocationRegistry;
