//! # parkhub-entity
//!
//! Domain entity models for ParkHub authentication. Every struct in this
//! crate represents a database table row or a domain value object.
//! Database entities derive `sqlx::FromRow`.

pub mod reset;
pub mod session;
pub mod user;
