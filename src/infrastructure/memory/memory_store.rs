use crate::domain::{ActivityLog, Metric, MetricKind, NewActivityLog, NewMetric, TelemetryStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Append-only telemetry store held in memory.
#[derive(Default)]
pub struct MemoryStore {
    // ---
    metrics: RwLock<Vec<Metric>>,
    activity: RwLock<Vec<ActivityLog>>,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-stamped metric, keeping its id and timestamp.
    pub async fn push_metric(&self, metric: Metric) {
        self.metrics.write().await.push(metric);
    }

    /// Append an already-stamped activity event, keeping its id and timestamp.
    pub async fn push_activity(&self, activity: ActivityLog) {
        self.activity.write().await.push(activity);
    }

    /// Copy of every stored metric in insertion order.
    pub async fn metrics(&self) -> Vec<Metric> {
        self.metrics.read().await.clone()
    }

    /// Copy of every stored activity event in insertion order.
    pub async fn activity(&self) -> Vec<ActivityLog> {
        self.activity.read().await.clone()
    }
}

#[async_trait::async_trait]
impl TelemetryStore for MemoryStore {
    // ---
    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric> {
        // ---
        let metric = Metric::from_new(metric);
        self.metrics.write().await.push(metric.clone());
        Ok(metric)
    }

    async fn insert_activity(&self, activity: NewActivityLog) -> Result<ActivityLog> {
        // ---
        let activity = ActivityLog::from_new(activity);
        self.activity.write().await.push(activity.clone());
        Ok(activity)
    }

    async fn metrics_since(&self, since: DateTime<Utc>, kinds: &[MetricKind]) -> Result<Vec<Metric>> {
        // ---
        Ok(self
            .metrics
            .read()
            .await
            .iter()
            .filter(|m| m.created_at >= since && kinds.contains(&m.kind))
            .cloned()
            .collect())
    }

    async fn activity_since(&self, since: DateTime<Utc>) -> Result<Vec<ActivityLog>> {
        // ---
        Ok(self
            .activity
            .read()
            .await
            .iter()
            .filter(|a| a.created_at >= since)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::{Action, Metadata, Role};
    use chrono::Duration;

    fn metric_at(kind: MetricKind, created_at: DateTime<Utc>) -> Metric {
        // ---
        Metric::from_new_at(
            NewMetric::timed(kind, "articles.list", 5.0, "200", Metadata::new()),
            created_at,
        )
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        // ---
        let store = MemoryStore::new();
        let before = Utc::now();

        let stored = store
            .insert_metric(NewMetric::timed(MetricKind::Db, "q", 1.0, "success", Metadata::new()))
            .await
            .unwrap();

        assert!(!stored.id.is_nil());
        assert!(stored.created_at >= before);
        assert_eq!(store.metrics().await, vec![stored]);
    }

    #[tokio::test]
    async fn metrics_since_filters_by_window_and_kind() {
        // ---
        let store = MemoryStore::new();
        let now = Utc::now();

        store.push_metric(metric_at(MetricKind::Api, now - Duration::hours(30))).await;
        store.push_metric(metric_at(MetricKind::Api, now - Duration::hours(2))).await;
        store.push_metric(metric_at(MetricKind::Db, now - Duration::hours(1))).await;
        store.push_metric(metric_at(MetricKind::Frontend, now)).await;

        let since = now - Duration::hours(24);
        let api = store.metrics_since(since, &[MetricKind::Api]).await.unwrap();
        assert_eq!(api.len(), 1);

        let backend = store
            .metrics_since(since, &[MetricKind::Api, MetricKind::Db])
            .await
            .unwrap();
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn activity_since_filters_by_window() {
        // ---
        let store = MemoryStore::new();
        let now = Utc::now();
        let view = NewActivityLog {
            user_id: Some("u-1".to_string()),
            role: Role::Editor,
            action: Action::View,
            route: "/articles".to_string(),
            ip: "198.51.100.4".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            metadata: Metadata::new(),
        };

        store
            .push_activity(ActivityLog::from_new_at(view.clone(), now - Duration::days(8)))
            .await;
        store.insert_activity(view).await.unwrap();

        let recent = store.activity_since(now - Duration::days(7)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].user_id.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn recent_errors_filters_orders_and_limits() {
        // ---
        let store = MemoryStore::new();
        let now = Utc::now();
        let with_status = |kind, status: &str, minutes: i64| {
            Metric::from_new_at(
                NewMetric::timed(kind, "op", 1.0, status, Metadata::new()),
                now - Duration::minutes(minutes),
            )
        };

        store.push_metric(with_status(MetricKind::Api, "500", 30)).await;
        store.push_metric(with_status(MetricKind::Db, "error", 10)).await;
        store.push_metric(with_status(MetricKind::Api, "502", 20)).await;
        store.push_metric(with_status(MetricKind::Api, "404", 5)).await;
        store.push_metric(with_status(MetricKind::Frontend, "error", 1)).await;
        store.push_metric(with_status(MetricKind::Db, "error", 60 * 24 * 8)).await;

        let errors = store.recent_errors(now - Duration::days(7), 2).await.unwrap();
        let statuses: Vec<&str> = errors.iter().filter_map(|m| m.status.as_deref()).collect();
        assert_eq!(statuses, vec!["error", "502"]);
    }

    #[tokio::test]
    async fn viewed_routes_skip_other_actions() {
        // ---
        let store = MemoryStore::new();
        for action in [Action::View, Action::Update, Action::View] {
            store
                .insert_activity(NewActivityLog {
                    user_id: None,
                    role: Role::Guest,
                    action,
                    route: format!("/articles/{}", action.as_str()),
                    ip: "192.0.2.1".to_string(),
                    user_agent: "test".to_string(),
                    metadata: Metadata::new(),
                })
                .await
                .unwrap();
        }

        let routes = store
            .viewed_routes_since(Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(routes, vec!["/articles/view", "/articles/view"]);
    }
}
