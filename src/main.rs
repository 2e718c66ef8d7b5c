//! ParkHub auth server.
//!
//! Loads configuration, wires the stores and the auth core together,
//! starts the maintenance scheduler and serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use parkhub_api::{AppState, build_app};
use parkhub_auth::{AuthManager, LoggingResetNotifier};
use parkhub_cache::CacheManager;
use parkhub_core::config::{AppConfig, StorageBackend};
use parkhub_database::{DatabasePool, Repositories};
use parkhub_worker::{MaintenanceScheduler, MaintenanceTasks};

#[tokio::main]
async fn main() {
    let env = std::env::var("PARKHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = ?e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` overrides the configured level.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting ParkHub v{}", env!("CARGO_PKG_VERSION"));

    let (repos, db) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DatabasePool::connect(&config.database)
                .await
                .context("database connection failed")?;
            parkhub_database::migration::run_migrations(db.pool())
                .await
                .context("migrations failed")?;
            (Repositories::postgres(db.pool().clone()), Some(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory stores; state is lost on restart");
            (Repositories::in_memory(), None)
        }
    };

    let cache = CacheManager::new(&config.cache)
        .await
        .context("cache initialization failed")?;

    let auth = Arc::new(
        AuthManager::new(&config, repos, cache.clone(), Arc::new(LoggingResetNotifier))
            .context("auth initialization failed")?,
    );

    let mut scheduler = MaintenanceScheduler::new(MaintenanceTasks::new(Arc::clone(&auth)))
        .await
        .context("scheduler creation failed")?;
    scheduler
        .register(&config.session)
        .await
        .context("scheduler registration failed")?;
    scheduler.start().await.context("scheduler start failed")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(config), auth, cache, db.clone());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "HTTP server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("Shutting down");
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }
    if let Some(db) = db {
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
