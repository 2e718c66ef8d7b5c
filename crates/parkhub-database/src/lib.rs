//! # parkhub-database
//!
//! Connection management and repository implementations for the auth
//! stores. Every repository is an async trait with a PostgreSQL
//! implementation and a process-local one used for tests and single-node
//! development.

pub mod connection;
pub mod deadline;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::Repositories;
