//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` contains the
//! telemetry store, the recorder built on it and the process metrics.
//!
//! The state is cheaply cloneable (everything heavy sits behind `Arc`) so it
//! can be handed to each request without copying resources.

use crate::config::TelemetryConfig;
use crate::domain::{MetricsPtr, TelemetryStorePtr};
use crate::telemetry::TelemetryRecorder;

/// Shared application state passed to all Axum handlers.
///
/// This struct serves as the Dependency Injection container for the application.
///
/// # Design Principles
///
/// - **Dependency Inversion**: Handlers depend on abstractions (`TelemetryStore`,
///   `Metrics`), not concrete backends.
/// - **Immutable After Initialization**: State is built once at startup and
///   never mutated.
///
/// # Lifecycle
///
/// 1. Created once in `create_router()` (or by a test) during startup
/// 2. Attached to the Axum router via `.with_state(app_state)`
/// 3. Cloned automatically by Axum for each incoming HTTP request
/// 4. Handlers extract via `State(state): State<AppState>`
#[derive(Clone)]
pub struct AppState {
    /// Process metrics for the `/metrics` endpoint.
    ///
    /// Either Prometheus-backed (production) or no-op (testing/development).
    metrics: MetricsPtr,

    /// Append-only telemetry persistence, read by the dashboard queries.
    store: TelemetryStorePtr,

    /// Best-effort write path shared by the timing middleware and the
    /// ingestion handlers.
    recorder: TelemetryRecorder,
}

impl AppState {
    // ---

    pub fn new(metrics: MetricsPtr, store: TelemetryStorePtr, telemetry: &TelemetryConfig) -> Self {
        // ---
        let recorder = TelemetryRecorder::new(store.clone(), metrics.clone())
            .with_write_timeout(telemetry.write_timeout)
            .with_slow_query_threshold(telemetry.slow_query_threshold);

        AppState {
            metrics,
            store,
            recorder,
        }
    }

    /// Replace the recorder, keeping store and metrics.
    ///
    /// Used by tests that need a fresh cold-start flag.
    pub fn with_recorder(mut self, recorder: TelemetryRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    /// Get a reference to the metrics implementation.
    pub fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get a reference to the telemetry store.
    pub fn store(&self) -> &TelemetryStorePtr {
        // ---
        &self.store
    }

    /// Get a reference to the telemetry recorder.
    pub fn recorder(&self) -> &TelemetryRecorder {
        // ---
        &self.recorder
    }
}

#[cfg(test)]
mod tests {
    // ---

    use super::*;
    use crate::infrastructure::{create_memory_store, create_noop_metrics};
    use std::time::Duration;

    #[test]
    fn test_app_state_creation_and_clone() {
        // ---
        let metrics = create_noop_metrics().unwrap();
        let store = create_memory_store();
        let telemetry = TelemetryConfig {
            slow_query_threshold: Duration::from_millis(75),
            write_timeout: Duration::from_millis(500),
        };

        let app_state = AppState::new(metrics, store, &telemetry);
        let cloned = app_state.clone();

        // Verify accessors work
        let _metrics_ref = cloned.metrics();
        let _store_ref = cloned.store();
        assert_eq!(
            app_state.recorder().slow_query_threshold(),
            Duration::from_millis(75)
        );
    }

    #[tokio::test]
    async fn test_store_ping_through_state() {
        // ---
        let app_state = AppState::new(
            create_noop_metrics().unwrap(),
            create_memory_store(),
            &TelemetryConfig::default(),
        );

        assert!(app_state.store().ping().await.is_ok());
    }
}
