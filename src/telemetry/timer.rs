//! Timing for arbitrary named units of work (batch sends, imports, ...).
//!
//! These are recorded under the `api` kind, next to HTTP handlers.

use super::api_timer::elapsed_ms;
use super::recorder::TelemetryRecorder;
use crate::domain::{metadata_keys, Metadata, MetricKind, NewMetric, STATUS_ERROR, STATUS_SUCCESS};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use tokio::time::Instant;

/// Per-call options for [`time_operation`].
#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    // ---
    pub metadata: Metadata,

    /// Status recorded on success. Defaults to `"success"`.
    pub status: Option<String>,
}

impl OperationOptions {
    // ---
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Run `operation` and record how long it took.
pub async fn time_operation<F, Fut, T, E>(
    recorder: &TelemetryRecorder,
    name: &str,
    operation: F,
    options: OperationOptions,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    // ---
    let OperationOptions {
        mut metadata,
        status,
    } = options;

    let start = Instant::now();
    let result = operation().await;
    let duration = elapsed_ms(start);

    let status = match &result {
        Ok(_) => status.unwrap_or_else(|| STATUS_SUCCESS.to_string()),
        Err(err) => {
            metadata.insert(metadata_keys::ERROR_MESSAGE.into(), Value::from(err.to_string()));
            STATUS_ERROR.to_string()
        }
    };

    recorder.log_metric(NewMetric::timed(MetricKind::Api, name, duration, status, metadata));

    result
}
