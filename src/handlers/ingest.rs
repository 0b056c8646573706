//! Ingestion endpoints for telemetry produced outside this process.
//!
//! Both handlers hand the record to the recorder and answer `202 Accepted`
//! immediately; persistence happens in the background.

use crate::app_state::AppState;
use crate::domain::{Action, Metadata, MetricKind, NewActivityLog, NewMetric, Role};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

const UNKNOWN: &str = "unknown";

/// Body of POST /telemetry/activity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    // ---
    pub user_id: Option<String>,
    pub role: Role,
    pub action: Action,
    pub route: String,

    /// Falls back to the first `x-forwarded-for` entry.
    pub ip: Option<String>,

    /// Falls back to the `user-agent` header.
    pub user_agent: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

/// Body of POST /telemetry/frontend.
#[derive(Debug, Deserialize)]
pub struct FrontendMetricRequest {
    // ---
    pub name: String,

    /// Milliseconds, finite and non-negative.
    pub duration: f64,

    pub status: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    // ---
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    // ---
    header_value(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
}

/// Records one user/route interaction.
///
/// - `202 Accepted` once the event is handed to the recorder.
/// - `422 Unprocessable Entity` for an empty route.
#[tracing::instrument(skip(state, headers, body))]
pub async fn record_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ActivityRequest>,
) -> StatusCode {
    // ---
    if body.route.trim().is_empty() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }

    let ip = body
        .ip
        .or_else(|| forwarded_ip(&headers))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let user_agent = body
        .user_agent
        .or_else(|| header_value(&headers, "user-agent"))
        .unwrap_or_else(|| UNKNOWN.to_string());

    state.recorder().log_activity(NewActivityLog {
        user_id: body.user_id,
        role: body.role,
        action: body.action,
        route: body.route,
        ip,
        user_agent,
        metadata: body.metadata,
    });

    StatusCode::ACCEPTED
}

/// Records one frontend timing (page load, web vital, ...).
///
/// - `202 Accepted` once the metric is handed to the recorder.
/// - `422 Unprocessable Entity` for an empty name or a negative/non-finite duration.
#[tracing::instrument(skip(state, body))]
pub async fn record_frontend_metric(
    State(state): State<AppState>,
    Json(body): Json<FrontendMetricRequest>,
) -> StatusCode {
    // ---
    if body.name.trim().is_empty() || !body.duration.is_finite() || body.duration < 0.0 {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }

    state.recorder().log_metric(NewMetric {
        kind: MetricKind::Frontend,
        name: body.name,
        duration: Some(body.duration),
        status: body.status,
        metadata: body.metadata,
    });

    StatusCode::ACCEPTED
}
