use super::telemetry_models::{
    Action, ActivityLog, Metric, MetricKind, MetricSample, NewActivityLog, NewMetric,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Abstraction for append-only telemetry persistence.
///
/// Records are only ever inserted and read back; no backend exposes
/// update or delete.
///
/// The dashboard reads go through the narrower methods (`metric_samples_since`,
/// `recent_errors`, `viewed_routes_since`). Their default bodies filter the
/// full window in process; backends that can push filtering, ordering and
/// column selection down to the server override them.
#[async_trait::async_trait]
pub trait TelemetryStore: Send + Sync {
    // ---
    /// Append a metric, returning it with its assigned id and timestamp.
    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric>;

    /// Append an activity event.
    async fn insert_activity(&self, activity: NewActivityLog) -> Result<ActivityLog>;

    /// Metrics created at or after `since` whose kind is one of `kinds`.
    async fn metrics_since(&self, since: DateTime<Utc>, kinds: &[MetricKind]) -> Result<Vec<Metric>>;

    /// Activity events created at or after `since`.
    async fn activity_since(&self, since: DateTime<Utc>) -> Result<Vec<ActivityLog>>;

    /// Round-trip to the backend, used by the full health check.
    async fn ping(&self) -> Result<()>;

    /// Same window as `metrics_since`, projected to the aggregated fields.
    async fn metric_samples_since(
        &self,
        since: DateTime<Utc>,
        kinds: &[MetricKind],
    ) -> Result<Vec<MetricSample>> {
        // ---
        let metrics = self.metrics_since(since, kinds).await?;
        Ok(metrics.iter().map(MetricSample::from).collect())
    }

    /// Failed `api`/`db` metrics created at or after `since`, newest first,
    /// at most `limit`.
    async fn recent_errors(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Metric>> {
        // ---
        let mut errors: Vec<Metric> = self
            .metrics_since(since, &[MetricKind::Api, MetricKind::Db])
            .await?
            .into_iter()
            .filter(Metric::is_error)
            .collect();

        errors.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        errors.truncate(limit);
        Ok(errors)
    }

    /// Route of every `view` event created at or after `since`.
    async fn viewed_routes_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        // ---
        Ok(self
            .activity_since(since)
            .await?
            .into_iter()
            .filter(|a| a.action == Action::View)
            .map(|a| a.route)
            .collect())
    }
}

/// Type alias for any backend that implements TelemetryStore.
pub type TelemetryStorePtr = Arc<dyn TelemetryStore>;
