//! Session lifecycle and the concurrent-session policy.

pub mod store;

pub use store::{SessionCreated, SessionPolicy, SessionStore};
