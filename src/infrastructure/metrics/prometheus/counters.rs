use metrics::{counter, histogram};
use std::time::Instant;

/// Count a telemetry record that reached the store.
pub fn increment_telemetry_writes(record: &'static str) {
    counter!("telemetry_writes_total", "record" => record).increment(1);
}

/// Count a telemetry record that was discarded.
pub fn increment_dropped_writes(record: &'static str) {
    counter!("telemetry_writes_dropped_total", "record" => record).increment(1);
}

/// Track HTTP request latency using a histogram.
pub fn track_http_request(start: Instant, path: &str, method: &str, status: u16) {
    let elapsed = start.elapsed();
    histogram!(
        "http_request_duration_seconds",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
