// src/lib.rs
use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use handlers::{
    api_latency, db_overview, db_trend, health_check, metrics_handler, page_views, record_activity,
    record_frontend_metric, recent_errors, root_handler, summary, track_api_timing,
};

// Public exports (visible outside this module)
pub mod dashboard;
pub mod domain;
pub mod telemetry;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;

#[cfg(test)]
mod testing;

pub use app_state::AppState;
pub use config::*;
pub use handlers::{ActivityRequest, FrontendMetricRequest};

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_memory_store, // ---
    create_noop_metrics,
    create_postgres_store,
    create_prom_metrics,
    create_redis_store,
    MemoryStore,
    PostgresStore,
    RedisStore,
};

/// Build the HTTP router with the store and metrics backends chosen by
/// environment variables.
pub async fn create_router() -> Result<Router> {
    // ---
    // Load all configuration from environment
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt::try_init().ok(); // Ignores if already initialized

    let metrics = match config.metrics {
        MetricsBackend::Prometheus => create_prom_metrics()?,
        MetricsBackend::Noop => create_noop_metrics()?,
    };

    let store: domain::TelemetryStorePtr = match &config.store {
        StoreConfig::Memory => create_memory_store(),
        StoreConfig::Postgres(database) => create_postgres_store(database).await?,
        StoreConfig::Redis(redis) => create_redis_store(redis)?,
    };

    let app_state = AppState::new(metrics, store, &config.telemetry);

    Ok(build_router(app_state))
}

/// Build the HTTP router around an already-assembled state.
///
/// Every route is timed by the API timing middleware.
pub fn build_router(app_state: AppState) -> Router {
    // ---
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/dashboard",
            Router::new()
                .route("/summary", get(summary))
                .route("/api-latency", get(api_latency))
                .route("/db-trend", get(db_trend))
                .route("/db-overview", get(db_overview))
                .route("/errors", get(recent_errors))
                .route("/page-views", get(page_views)),
        )
        .nest(
            "/telemetry",
            Router::new()
                .route("/activity", post(record_activity))
                .route("/frontend", post(record_frontend_metric)),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_api_timing,
        ))
        .with_state(app_state)
}
