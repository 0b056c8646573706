//! Telemetry store on Redis sorted sets.
//!
//! Each collection is one sorted set. Members are the JSON-encoded records
//! and scores are their creation time in epoch milliseconds, so a window
//! read is a single `ZRANGEBYSCORE`.

use crate::domain::{ActivityLog, Metric, MetricKind, NewActivityLog, NewMetric, TelemetryStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;

pub struct RedisStore {
    // ---
    client: Client,
    /// Opened on first use and cloned for every operation afterwards.
    conn: OnceCell<MultiplexedConnection>,
    metrics_key: String,
    activity_key: String,
}

impl RedisStore {
    // ---
    pub fn new(client: Client, key_prefix: &str) -> Self {
        // ---
        Self {
            client,
            conn: OnceCell::new(),
            metrics_key: format!("{key_prefix}:metrics"),
            activity_key: format!("{key_prefix}:activity"),
        }
    }

    /// Shared multiplexed connection. A failed connect leaves the cell empty,
    /// so the next operation tries again.
    async fn conn(&self) -> Result<MultiplexedConnection> {
        // ---
        let conn = self
            .conn
            .get_or_try_init(|| async {
                self.client
                    .get_multiplexed_async_connection()
                    .await
                    .context("Failed to connect to Redis")
            })
            .await?;
        Ok(conn.clone())
    }

    async fn append(&self, key: &str, payload: String, created_at: DateTime<Utc>) -> Result<()> {
        // ---
        let mut conn = self.conn().await?;
        let _: () = conn.zadd(key, payload, created_at.timestamp_millis()).await?;
        Ok(())
    }

    async fn range_since(&self, key: &str, since: DateTime<Utc>) -> Result<Vec<String>> {
        // ---
        let mut conn = self.conn().await?;
        let members: Vec<String> = conn
            .zrangebyscore(key, since.timestamp_millis(), "+inf")
            .await?;
        Ok(members)
    }
}

#[async_trait::async_trait]
impl TelemetryStore for RedisStore {
    // ---
    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric> {
        // ---
        let metric = Metric::from_new(metric);
        let payload = serde_json::to_string(&metric)?;
        self.append(&self.metrics_key, payload, metric.created_at).await?;
        Ok(metric)
    }

    async fn insert_activity(&self, activity: NewActivityLog) -> Result<ActivityLog> {
        // ---
        let activity = ActivityLog::from_new(activity);
        let payload = serde_json::to_string(&activity)?;
        self.append(&self.activity_key, payload, activity.created_at).await?;
        Ok(activity)
    }

    async fn metrics_since(&self, since: DateTime<Utc>, kinds: &[MetricKind]) -> Result<Vec<Metric>> {
        // ---
        let mut metrics = Vec::new();
        for raw in self.range_since(&self.metrics_key, since).await? {
            let metric: Metric =
                serde_json::from_str(&raw).context("Malformed metric record in Redis")?;
            // Scores are millisecond-truncated; re-check against the exact timestamp.
            if metric.created_at >= since && kinds.contains(&metric.kind) {
                metrics.push(metric);
            }
        }
        Ok(metrics)
    }

    async fn activity_since(&self, since: DateTime<Utc>) -> Result<Vec<ActivityLog>> {
        // ---
        let mut activity = Vec::new();
        for raw in self.range_since(&self.activity_key, since).await? {
            let entry: ActivityLog =
                serde_json::from_str(&raw).context("Malformed activity record in Redis")?;
            if entry.created_at >= since {
                activity.push(entry);
            }
        }
        Ok(activity)
    }

    async fn ping(&self) -> Result<()> {
        // ---
        let mut conn = self.conn().await?;
        let _: String = conn.ping().await?;
        Ok(())
    }
}
