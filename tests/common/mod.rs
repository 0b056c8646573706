// Test helpers are intentionally partially used
#![allow(dead_code)]

use quill_telemetry::domain::MetricsPtr;
use quill_telemetry::{build_router, create_memory_store, create_noop_metrics, AppState, MemoryStore, TelemetryConfig};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

// ============================================================================
// Test Setup
// ============================================================================

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    // ---
    /// Server on an ephemeral port with an in-memory store and no-op metrics.
    pub async fn new() -> Self {
        // --
        Self::with_metrics(create_noop_metrics().expect("noop metrics")).await
    }

    pub async fn with_metrics(metrics: MetricsPtr) -> Self {
        // ---
        // Enable debug logging only when requested
        if std::env::var("TEST_DEBUG").is_ok() {
            tracing_subscriber::fmt().with_test_writer().try_init().ok();
        }

        let store = create_memory_store();
        let state = AppState::new(metrics, store.clone(), &TelemetryConfig::default());
        let app = build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client, store }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }
}

/// Poll until `condition` holds against the store, failing after two seconds.
pub async fn wait_for<F, Fut>(condition: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    // ---
    for _ in 0..400 {
        if condition().await {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within two seconds");
}
