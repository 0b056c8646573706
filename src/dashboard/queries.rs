//! Store-backed dashboard queries.
//!
//! Each query reads one bounded window ending at `now` through the store's
//! narrow read methods and hands the result to the pure functions in
//! `aggregate`. Store errors are returned to the caller as-is.

use super::aggregate::{self, AggregatedApiLatency, DbDurationPoint, DbOverview, ErrorFeedItem, PageViewCount};
use crate::domain::{MetricKind, TelemetryStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Window for the API latency summary and the DB overview.
pub const RECENT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Window for trends, the error feed and page views.
pub const TREND_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn window_start(now: DateTime<Utc>, window: Duration) -> Result<DateTime<Utc>> {
    // ---
    let window = chrono::Duration::from_std(window).context("Aggregation window out of range")?;
    Ok(now - window)
}

pub async fn api_latency_summary(
    store: &dyn TelemetryStore,
    now: DateTime<Utc>,
) -> Result<Vec<AggregatedApiLatency>> {
    // ---
    let samples = store
        .metric_samples_since(window_start(now, RECENT_WINDOW)?, &[MetricKind::Api])
        .await?;
    Ok(aggregate::summarize_api_latency(&samples))
}

pub async fn db_duration_trend(
    store: &dyn TelemetryStore,
    now: DateTime<Utc>,
) -> Result<Vec<DbDurationPoint>> {
    // ---
    let samples = store
        .metric_samples_since(window_start(now, TREND_WINDOW)?, &[MetricKind::Db])
        .await?;
    Ok(aggregate::db_duration_trend(&samples))
}

pub async fn recent_errors(store: &dyn TelemetryStore, now: DateTime<Utc>) -> Result<Vec<ErrorFeedItem>> {
    // ---
    let errors = store
        .recent_errors(window_start(now, TREND_WINDOW)?, aggregate::RECENT_ERROR_LIMIT)
        .await?;
    Ok(aggregate::recent_errors(&errors))
}

pub async fn page_views(store: &dyn TelemetryStore, now: DateTime<Utc>) -> Result<Vec<PageViewCount>> {
    // ---
    let routes = store.viewed_routes_since(window_start(now, TREND_WINDOW)?).await?;
    Ok(aggregate::page_views(&routes))
}

pub async fn db_overview(store: &dyn TelemetryStore, now: DateTime<Utc>) -> Result<DbOverview> {
    // ---
    let samples = store
        .metric_samples_since(window_start(now, RECENT_WINDOW)?, &[MetricKind::Db])
        .await?;
    Ok(aggregate::db_overview(&samples))
}

/// Everything the operations dashboard renders in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    // ---
    pub api_latency: Vec<AggregatedApiLatency>,
    pub db_trend: Vec<DbDurationPoint>,
    pub recent_errors: Vec<ErrorFeedItem>,
    pub page_views: Vec<PageViewCount>,
    pub db_overview: DbOverview,
    pub total_api_calls: u64,
    pub average_api_latency: f64,
    pub total_page_views: u64,
}

/// Run every query concurrently and derive the headline numbers.
pub async fn dashboard_summary(store: &dyn TelemetryStore, now: DateTime<Utc>) -> Result<DashboardSummary> {
    // ---
    let (api_latency, db_trend, recent_errors, page_views, db_overview) = tokio::try_join!(
        api_latency_summary(store, now),
        db_duration_trend(store, now),
        recent_errors(store, now),
        page_views(store, now),
        db_overview(store, now),
    )?;

    Ok(DashboardSummary {
        total_api_calls: aggregate::total_api_calls(&api_latency),
        average_api_latency: aggregate::weighted_average_latency(&api_latency),
        total_page_views: aggregate::total_page_views(&page_views),
        api_latency,
        db_trend,
        recent_errors,
        page_views,
        db_overview,
    })
}
