//! Dashboard read handlers.
//!
//! Each handler runs one aggregation query against the telemetry store.
//! The query itself is timed as a `db` metric, so a slow dashboard shows up
//! on the dashboard.

use crate::app_state::AppState;
use crate::dashboard::{
    self, AggregatedApiLatency, DashboardSummary, DbDurationPoint, DbOverview, ErrorFeedItem,
    PageViewCount,
};
use crate::domain::TelemetryStorePtr;
use crate::handlers::shared_types::{read_failed, ApiResponse};
use crate::telemetry::{time_db, DbTimingOptions};
use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use std::future::Future;

async fn timed_read<T, F, Fut>(
    state: &AppState,
    name: &'static str,
    query: F,
) -> Result<ApiResponse<T>, StatusCode>
where
    F: FnOnce(TelemetryStorePtr, DateTime<Utc>) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    // ---
    let store = state.store().clone();
    let options = DbTimingOptions::default().with_metadata("source", "dashboard");

    let data = time_db(state.recorder(), name, || query(store, Utc::now()), options)
        .await
        .map_err(read_failed)?;

    Ok(ApiResponse { data })
}

/// Every dashboard view plus the derived totals (GET /dashboard/summary).
#[tracing::instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
) -> Result<ApiResponse<DashboardSummary>, StatusCode> {
    // ---
    timed_read(&state, "dashboard.summary", |store, now| async move {
        dashboard::dashboard_summary(store.as_ref(), now).await
    })
    .await
}

/// Slowest API paths over the last 24 hours (GET /dashboard/api-latency).
#[tracing::instrument(skip(state))]
pub async fn api_latency(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<AggregatedApiLatency>>, StatusCode> {
    // ---
    timed_read(&state, "dashboard.api_latency", |store, now| async move {
        dashboard::api_latency_summary(store.as_ref(), now).await
    })
    .await
}

/// Daily mean DB durations over the last 7 days (GET /dashboard/db-trend).
#[tracing::instrument(skip(state))]
pub async fn db_trend(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<DbDurationPoint>>, StatusCode> {
    // ---
    timed_read(&state, "dashboard.db_trend", |store, now| async move {
        dashboard::db_duration_trend(store.as_ref(), now).await
    })
    .await
}

/// DB totals over the last 24 hours (GET /dashboard/db-overview).
#[tracing::instrument(skip(state))]
pub async fn db_overview(State(state): State<AppState>) -> Result<ApiResponse<DbOverview>, StatusCode> {
    // ---
    timed_read(&state, "dashboard.db_overview", |store, now| async move {
        dashboard::db_overview(store.as_ref(), now).await
    })
    .await
}

/// Latest 20 failures over the last 7 days (GET /dashboard/errors).
#[tracing::instrument(skip(state))]
pub async fn recent_errors(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ErrorFeedItem>>, StatusCode> {
    // ---
    timed_read(&state, "dashboard.recent_errors", |store, now| async move {
        dashboard::recent_errors(store.as_ref(), now).await
    })
    .await
}

/// Most viewed routes over the last 7 days (GET /dashboard/page-views).
#[tracing::instrument(skip(state))]
pub async fn page_views(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<PageViewCount>>, StatusCode> {
    // ---
    timed_read(&state, "dashboard.page_views", |store, now| async move {
        dashboard::page_views(store.as_ref(), now).await
    })
    .await
}
