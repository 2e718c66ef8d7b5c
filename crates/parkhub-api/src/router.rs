//! Route definitions for the ParkHub HTTP API.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route bound to `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth_routes())
        .route("/health", get(handlers::health::health))
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/logout-all", post(handlers::auth::logout_all))
        .route("/change-password", post(handlers::auth::change_password))
        .route(
            "/password-reset/request",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/password-reset/confirm",
            post(handlers::auth::confirm_password_reset),
        )
        .route("/sessions", get(handlers::auth::list_sessions))
}
