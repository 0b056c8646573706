//! Prometheus metrics implementation.
//!
//! This module provides a concrete implementation of the `Metrics` trait using
//! the Prometheus text format. It delegates to utility functions in sibling
//! modules (`counters.rs`, `recorder.rs`) which register and update series on
//! the global `metrics` crate registry.

use crate::domain::Metrics;
use std::time::Instant;

/// Prometheus-based metrics implementation.
///
/// Holds no state: series live in the global `metrics` registry and the
/// `PrometheusHandle` stored in `recorder.rs` renders them.
pub struct PrometheusMetrics {}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_telemetry_write(&self, record: &'static str) {
        super::increment_telemetry_writes(record);
    }

    fn record_dropped_write(&self, record: &'static str) {
        tracing::debug!(record, "Recording dropped telemetry write");
        super::increment_dropped_writes(record);
    }

    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16) {
        super::track_http_request(start, path, method, status);
    }
}
