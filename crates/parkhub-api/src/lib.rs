//! # parkhub-api
//!
//! HTTP API layer for ParkHub built on Axum.
//!
//! Provides the `/api/auth` endpoints, the health probe, the `AuthUser`
//! extractor, request/response DTOs, and the mapping from auth errors to
//! HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
