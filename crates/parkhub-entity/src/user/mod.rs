//! User domain entities.

pub mod model;
pub mod role;

pub use model::{CreateUser, PublicUser, User};
pub use role::UserRole;
