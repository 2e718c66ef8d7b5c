//! Health probe.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use parkhub_core::traits::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(true) => "ok",
            _ => "unavailable",
        },
        None => "in-memory",
    };
    let cache = match state.cache.health_check().await {
        Ok(true) => "ok",
        _ => "unavailable",
    };

    let healthy = database != "unavailable" && cache != "unavailable";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(
            if healthy { "healthy" } else { "degraded" },
            HealthResponse {
                status: if healthy { "ok" } else { "degraded" },
                version: env!("CARGO_PKG_VERSION"),
                database,
                cache,
            },
        )),
    )
}
