//! Shared fixtures for unit tests.

use crate::domain::{
    ActivityLog, Metric, MetricKind, Metrics, NewActivityLog, NewMetric, TelemetryStore,
};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Process metrics that count telemetry writes and keep HTTP latency labels.
#[derive(Default)]
pub struct CountingMetrics {
    writes: AtomicUsize,
    dropped: AtomicUsize,
    http_paths: Mutex<Vec<String>>,
}

impl CountingMetrics {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// `path` labels passed to the HTTP latency histogram, in call order.
    pub fn http_paths(&self) -> Vec<String> {
        self.http_paths.lock().unwrap().clone()
    }
}

impl Metrics for CountingMetrics {
    fn render(&self) -> String {
        format!("writes {} dropped {}", self.writes(), self.dropped())
    }

    fn record_telemetry_write(&self, _: &'static str) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn record_dropped_write(&self, _: &'static str) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    fn record_http_request(&self, _: Instant, path: &str, _: &str, _: u16) {
        self.http_paths.lock().unwrap().push(path.to_string());
    }
}

/// A store that is always down.
pub struct FailingStore;

#[async_trait::async_trait]
impl TelemetryStore for FailingStore {
    async fn insert_metric(&self, _: NewMetric) -> Result<Metric> {
        bail!("connection refused")
    }
    async fn insert_activity(&self, _: NewActivityLog) -> Result<ActivityLog> {
        bail!("connection refused")
    }
    async fn metrics_since(&self, _: DateTime<Utc>, _: &[MetricKind]) -> Result<Vec<Metric>> {
        bail!("connection refused")
    }
    async fn activity_since(&self, _: DateTime<Utc>) -> Result<Vec<ActivityLog>> {
        bail!("connection refused")
    }
    async fn ping(&self) -> Result<()> {
        bail!("connection refused")
    }
}

/// A store whose writes never complete.
pub struct StalledStore;

#[async_trait::async_trait]
impl TelemetryStore for StalledStore {
    async fn insert_metric(&self, _: NewMetric) -> Result<Metric> {
        std::future::pending().await
    }
    async fn insert_activity(&self, _: NewActivityLog) -> Result<ActivityLog> {
        std::future::pending().await
    }
    async fn metrics_since(&self, _: DateTime<Utc>, _: &[MetricKind]) -> Result<Vec<Metric>> {
        Ok(Vec::new())
    }
    async fn activity_since(&self, _: DateTime<Utc>) -> Result<Vec<ActivityLog>> {
        Ok(Vec::new())
    }
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    // ---
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met before deadline"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
