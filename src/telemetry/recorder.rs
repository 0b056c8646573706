//! Best-effort write path for telemetry records.
//!
//! Every write is detached onto its own tokio task and bounded by a timeout.
//! Callers never wait on the store and never see its errors; a failed write
//! is logged at `warn` and counted on the process metrics, then forgotten.

use super::cold_start::ColdStart;
use crate::domain::{MetricsPtr, NewActivityLog, NewMetric, TelemetryStorePtr};
use std::future::Future;
use std::time::Duration;

/// Default upper bound for a single store write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default threshold at or above which a DB operation is tagged slow.
pub const DEFAULT_SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(50);

const METRIC_RECORD: &str = "metric";
const ACTIVITY_RECORD: &str = "activity";

/// Handle used by the timing wrappers to persist records.
///
/// Cheap to clone; all clones share the same store, process metrics and
/// cold-start flag.
#[derive(Clone)]
pub struct TelemetryRecorder {
    // ---
    store: TelemetryStorePtr,
    metrics: MetricsPtr,
    cold_start: ColdStart,
    write_timeout: Duration,
    slow_query_threshold: Duration,
}

impl TelemetryRecorder {
    // ---
    /// Recorder backed by `store`, sharing the process-wide cold-start flag.
    pub fn new(store: TelemetryStorePtr, metrics: MetricsPtr) -> Self {
        // ---
        Self {
            store,
            metrics,
            cold_start: ColdStart::process(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            slow_query_threshold: DEFAULT_SLOW_QUERY_THRESHOLD,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    /// Replace the cold-start flag, mostly useful to give tests a fresh one.
    pub fn with_cold_start(mut self, cold_start: ColdStart) -> Self {
        self.cold_start = cold_start;
        self
    }

    pub fn slow_query_threshold(&self) -> Duration {
        self.slow_query_threshold
    }

    pub fn store(&self) -> &TelemetryStorePtr {
        &self.store
    }

    pub(crate) fn metrics(&self) -> &MetricsPtr {
        &self.metrics
    }

    /// Consume this recorder's cold-start flag.
    pub fn is_cold_start(&self) -> bool {
        self.cold_start.consume()
    }

    /// Persist a metric without waiting for it.
    pub fn log_metric(&self, metric: NewMetric) {
        // ---
        tracing::debug!(kind = %metric.kind, name = %metric.name, status = ?metric.status, "Recording metric");

        let store = self.store.clone();
        self.detach(METRIC_RECORD, async move {
            store.insert_metric(metric).await.map(|_| ())
        });
    }

    /// Persist an activity event without waiting for it.
    pub fn log_activity(&self, activity: NewActivityLog) {
        // ---
        tracing::debug!(action = activity.action.as_str(), route = %activity.route, "Recording activity");

        let store = self.store.clone();
        self.detach(ACTIVITY_RECORD, async move {
            store.insert_activity(activity).await.map(|_| ())
        });
    }

    fn detach<F>(&self, record: &'static str, write: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        // ---
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(record, "No tokio runtime available, dropping telemetry record");
            self.metrics.record_dropped_write(record);
            return;
        };

        let metrics = self.metrics.clone();
        let write_timeout = self.write_timeout;

        runtime.spawn(async move {
            match tokio::time::timeout(write_timeout, write).await {
                Ok(Ok(())) => metrics.record_telemetry_write(record),
                Ok(Err(err)) => {
                    tracing::warn!(record, "Dropping telemetry record: {:#}", err);
                    metrics.record_dropped_write(record);
                }
                Err(_) => {
                    tracing::warn!(record, ?write_timeout, "Dropping telemetry record: store write timed out");
                    metrics.record_dropped_write(record);
                }
            }
        });
    }
}
