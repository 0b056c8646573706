use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    ActivityLog, Metadata, Metric, MetricKind, MetricSample, NewActivityLog, NewMetric,
    TelemetryStore,
};

const METRIC_COLUMNS: &str = "id, kind, name, duration, status, metadata, created_at";

#[derive(sqlx::FromRow)]
struct MetricRow {
    id: Uuid,
    kind: String,
    name: String,
    duration: Option<f64>,
    status: Option<String>,
    metadata: Json<Metadata>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MetricRow> for Metric {
    type Error = anyhow::Error;

    fn try_from(r: MetricRow) -> Result<Self> {
        // ---
        Ok(Metric {
            id: r.id,
            kind: r.kind.parse()?,
            name: r.name,
            duration: r.duration,
            status: r.status,
            metadata: r.metadata.0,
            created_at: r.created_at,
        })
    }
}

/// Aggregation columns only; the metadata bag stays in the database.
#[derive(sqlx::FromRow)]
struct SampleRow {
    kind: String,
    name: String,
    duration: Option<f64>,
    status: Option<String>,
    path: Option<String>,
    is_slow: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<SampleRow> for MetricSample {
    type Error = anyhow::Error;

    fn try_from(r: SampleRow) -> Result<Self> {
        // ---
        Ok(MetricSample {
            kind: r.kind.parse()?,
            name: r.name,
            duration: r.duration,
            status: r.status,
            path: r.path,
            is_slow: r.is_slow,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    user_id: Option<String>,
    role: String,
    action: String,
    route: String,
    ip: String,
    user_agent: String,
    metadata: Json<Metadata>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = anyhow::Error;

    fn try_from(r: ActivityRow) -> Result<Self> {
        // ---
        Ok(ActivityLog {
            id: r.id,
            user_id: r.user_id,
            role: r.role.parse()?,
            action: r.action.parse()?,
            route: r.route,
            ip: r.ip,
            user_agent: r.user_agent,
            metadata: r.metadata.0,
            created_at: r.created_at,
        })
    }
}

/// Telemetry store backed by the `metrics` and `activity_logs` tables.
pub struct PostgresStore {
    // ---
    pool: PgPool,
}

impl PostgresStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TelemetryStore for PostgresStore {
    // ---
    async fn insert_metric(&self, metric: NewMetric) -> Result<Metric> {
        // ---
        let metric = Metric::from_new(metric);

        sqlx::query(
            "INSERT INTO metrics (id, kind, name, duration, status, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(metric.id)
        .bind(metric.kind.as_str())
        .bind(&metric.name)
        .bind(metric.duration)
        .bind(&metric.status)
        .bind(Json(&metric.metadata))
        .bind(metric.created_at)
        .execute(&self.pool)
        .await?;

        Ok(metric)
    }

    async fn insert_activity(&self, activity: NewActivityLog) -> Result<ActivityLog> {
        // ---
        let activity = ActivityLog::from_new(activity);

        sqlx::query(
            "INSERT INTO activity_logs (id, user_id, role, action, route, ip, user_agent, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(activity.id)
        .bind(&activity.user_id)
        .bind(activity.role.as_str())
        .bind(activity.action.as_str())
        .bind(&activity.route)
        .bind(&activity.ip)
        .bind(&activity.user_agent)
        .bind(Json(&activity.metadata))
        .bind(activity.created_at)
        .execute(&self.pool)
        .await?;

        Ok(activity)
    }

    async fn metrics_since(&self, since: DateTime<Utc>, kinds: &[MetricKind]) -> Result<Vec<Metric>> {
        // ---
        let rows = sqlx::query_as::<_, MetricRow>(&format!(
            "SELECT {METRIC_COLUMNS}
             FROM metrics WHERE created_at >= $1 AND kind = ANY($2)"
        ))
        .bind(since)
        .bind(kind_names(kinds))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Metric::try_from).collect()
    }

    async fn activity_since(&self, since: DateTime<Utc>) -> Result<Vec<ActivityLog>> {
        // ---
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT id, user_id, role, action, route, ip, user_agent, metadata, created_at
             FROM activity_logs WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ActivityLog::try_from).collect()
    }

    async fn ping(&self) -> Result<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn metric_samples_since(
        &self,
        since: DateTime<Utc>,
        kinds: &[MetricKind],
    ) -> Result<Vec<MetricSample>> {
        // ---
        // Mirrors Metric::path and Metric::is_slow: only a non-empty string
        // path and a literal `true` count.
        let rows = sqlx::query_as::<_, SampleRow>(
            "SELECT kind, name, duration, status,
                    CASE WHEN jsonb_typeof(metadata->'path') = 'string'
                         THEN NULLIF(metadata->>'path', '') END AS path,
                    COALESCE(metadata->'isSlow' = 'true'::jsonb, false) AS is_slow,
                    created_at
             FROM metrics WHERE created_at >= $1 AND kind = ANY($2)",
        )
        .bind(since)
        .bind(kind_names(kinds))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MetricSample::try_from).collect()
    }

    async fn recent_errors(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<Metric>> {
        // ---
        let limit = i64::try_from(limit)?;

        let rows = sqlx::query_as::<_, MetricRow>(&format!(
            "SELECT {METRIC_COLUMNS}
             FROM metrics
             WHERE created_at >= $1
               AND kind IN ('api', 'db')
               AND (status = 'error' OR status LIKE '5%')
             ORDER BY created_at DESC
             LIMIT $2"
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Metric::try_from).collect()
    }

    async fn viewed_routes_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        // ---
        let routes = sqlx::query_scalar::<_, String>(
            "SELECT route FROM activity_logs WHERE action = 'view' AND created_at >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }
}

fn kind_names(kinds: &[MetricKind]) -> Vec<String> {
    kinds.iter().map(|k| k.as_str().to_string()).collect()
}
