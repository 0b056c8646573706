use std::sync::Arc;
use std::time::Instant;

/// Abstraction for the service's own process metrics (counters, histograms).
///
/// These describe the health of the telemetry pipeline itself and are
/// unrelated to the `Metric` records it persists.
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record a telemetry record that reached the store.
    fn record_telemetry_write(&self, record: &'static str);

    /// Record a telemetry record that was discarded (store error, timeout, no runtime).
    fn record_dropped_write(&self, record: &'static str);

    /// Record HTTP request duration and labels.
    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
