//! Timing for database and other data-access calls.

use super::api_timer::elapsed_ms;
use super::recorder::TelemetryRecorder;
use crate::domain::{metadata_keys, Metadata, MetricKind, NewMetric, STATUS_ERROR, STATUS_SUCCESS};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Per-call options for [`time_db`].
#[derive(Debug, Clone, Default)]
pub struct DbTimingOptions {
    // ---
    /// Merged into the recorded metric's metadata.
    pub metadata: Metadata,

    /// Overrides the recorder's slow-query threshold for this call.
    pub slow_threshold: Option<Duration>,
}

impl DbTimingOptions {
    // ---
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }
}

/// Inclusive: a call that takes exactly the threshold is slow.
pub fn is_slow(duration_ms: f64, threshold: Duration) -> bool {
    duration_ms >= threshold.as_secs_f64() * 1000.0
}

/// Run `operation`, recording a `db` metric for it.
///
/// On failure the metric is tagged `error` and `isSlow: true`, and the
/// operation's error is returned as-is.
pub async fn time_db<F, Fut, T, E>(
    recorder: &TelemetryRecorder,
    name: &str,
    operation: F,
    options: DbTimingOptions,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    // ---
    let threshold = options
        .slow_threshold
        .unwrap_or_else(|| recorder.slow_query_threshold());
    let mut metadata = options.metadata;

    let start = Instant::now();
    let result = operation().await;
    let duration = elapsed_ms(start);

    let status = match &result {
        Ok(_) => {
            metadata.insert(
                metadata_keys::IS_SLOW.into(),
                Value::Bool(is_slow(duration, threshold)),
            );
            STATUS_SUCCESS
        }
        Err(err) => {
            metadata.insert(metadata_keys::IS_SLOW.into(), Value::Bool(true));
            metadata.insert(metadata_keys::ERROR_MESSAGE.into(), Value::from(err.to_string()));
            STATUS_ERROR
        }
    };

    recorder.log_metric(NewMetric::timed(MetricKind::Db, name, duration, status, metadata));

    result
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::Metric;
    use crate::infrastructure::{create_memory_store, MemoryStore};
    use crate::testing::{wait_until, CountingMetrics, FailingStore};
    use std::sync::Arc;

    fn recorder_for(store: &Arc<MemoryStore>, metrics: &Arc<CountingMetrics>) -> TelemetryRecorder {
        TelemetryRecorder::new(store.clone(), metrics.clone())
    }

    async fn single_metric(store: &MemoryStore, metrics: &CountingMetrics) -> Metric {
        // ---
        wait_until(|| metrics.writes() == 1).await;
        let mut stored = store.metrics().await;
        assert_eq!(stored.len(), 1);
        stored.remove(0)
    }

    #[test]
    fn slow_flag_boundaries() {
        // ---
        let threshold = Duration::from_millis(50);
        assert!(is_slow(51.0, threshold));
        assert!(!is_slow(49.0, threshold));
        assert!(is_slow(50.0, threshold));
    }

    #[tokio::test(start_paused = true)]
    async fn operation_over_threshold_is_slow() {
        // ---
        let store = create_memory_store();
        let metrics = Arc::new(CountingMetrics::default());
        let recorder = recorder_for(&store, &metrics);

        let rows = time_db(
            &recorder,
            "articles.find_published",
            || async {
                tokio::time::sleep(Duration::from_millis(51)).await;
                Ok::<_, anyhow::Error>(vec!["hello-world"])
            },
            DbTimingOptions::default().with_metadata("collection", "articles"),
        )
        .await
        .unwrap();
        assert_eq!(rows, vec!["hello-world"]);

        let metric = single_metric(&store, &metrics).await;
        assert_eq!(metric.kind, MetricKind::Db);
        assert_eq!(metric.status.as_deref(), Some("success"));
        assert_eq!(metric.metadata["collection"], "articles");
        assert_eq!(metric.metadata["isSlow"], true);
        assert!(metric.duration.unwrap() >= 51.0);
    }

    #[tokio::test(start_paused = true)]
    async fn operation_under_threshold_is_not_slow() {
        // ---
        let store = create_memory_store();
        let metrics = Arc::new(CountingMetrics::default());
        let recorder = recorder_for(&store, &metrics);

        time_db(
            &recorder,
            "articles.count",
            || async {
                tokio::time::sleep(Duration::from_millis(49)).await;
                Ok::<_, anyhow::Error>(7_u64)
            },
            DbTimingOptions::default(),
        )
        .await
        .unwrap();

        let metric = single_metric(&store, &metrics).await;
        assert_eq!(metric.metadata["isSlow"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn per_call_threshold_overrides_recorder_default() {
        // ---
        let store = create_memory_store();
        let metrics = Arc::new(CountingMetrics::default());
        let recorder = recorder_for(&store, &metrics).with_slow_query_threshold(Duration::from_secs(5));

        time_db(
            &recorder,
            "users.lookup",
            || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, anyhow::Error>(())
            },
            DbTimingOptions::default().with_slow_threshold(Duration::from_millis(10)),
        )
        .await
        .unwrap();

        let metric = single_metric(&store, &metrics).await;
        assert_eq!(metric.metadata["isSlow"], true);
    }

    #[tokio::test]
    async fn failure_is_slow_error_and_rethrown() {
        // ---
        let store = create_memory_store();
        let metrics = Arc::new(CountingMetrics::default());
        let recorder = recorder_for(&store, &metrics);

        let result: Result<(), std::io::Error> = time_db(
            &recorder,
            "articles.insert",
            || async { Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "pool exhausted")) },
            DbTimingOptions::default(),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
        assert_eq!(err.to_string(), "pool exhausted");

        let metric = single_metric(&store, &metrics).await;
        assert_eq!(metric.status.as_deref(), Some("error"));
        assert_eq!(metric.metadata["isSlow"], true);
        assert_eq!(metric.error_message(), Some("pool exhausted"));
    }

    #[tokio::test]
    async fn store_outage_does_not_change_the_result() {
        // ---
        let metrics = Arc::new(CountingMetrics::default());
        let recorder = TelemetryRecorder::new(Arc::new(FailingStore), metrics.clone());

        let value = time_db(
            &recorder,
            "articles.count",
            || async { Ok::<_, anyhow::Error>(42) },
            DbTimingOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        wait_until(|| metrics.dropped() == 1).await;
    }
}
