//! Pure aggregation over already-fetched records.
//!
//! Kind, time-window and error filtering happen in the store; these
//! functions only group, summarize, sort and cap.

use crate::domain::{Metric, MetricKind, MetricSample};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

pub const API_LATENCY_LIMIT: usize = 10;
pub const PAGE_VIEW_LIMIT: usize = 10;
pub const RECENT_ERROR_LIMIT: usize = 20;

/// Latency summary for one API path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedApiLatency {
    // ---
    pub path: String,
    pub avg_duration: f64,
    pub p95_duration: f64,
    pub count: u64,
}

/// Mean duration of one DB operation on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbDurationPoint {
    // ---
    /// UTC day, `YYYY-MM-DD`.
    pub bucket: String,
    pub name: String,
    pub avg_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewCount {
    pub route: String,
    pub count: u64,
}

/// One entry of the error feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFeedItem {
    // ---
    pub id: Uuid,
    pub name: String,
    pub kind: MetricKind,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Totals across all DB operations in a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbOverview {
    // ---
    pub total_operations: u64,
    pub avg_duration: f64,
    pub slow_operations: u64,
    pub failed_operations: u64,
}

/// Running sum of the durations that are present, plus a count of all records.
#[derive(Default)]
struct DurationStats {
    durations: Vec<f64>,
    count: u64,
}

impl DurationStats {
    // ---
    fn push(&mut self, duration: Option<f64>) {
        self.count += 1;
        if let Some(d) = duration {
            self.durations.push(d);
        }
    }

    /// Mean of present durations; records without one are left out.
    fn mean(&self) -> f64 {
        // ---
        if self.durations.is_empty() {
            0.0
        } else {
            self.durations.iter().sum::<f64>() / self.durations.len() as f64
        }
    }
}

/// 95th percentile by index selection on the ascending-sorted samples:
/// `sorted[floor(0.95 * (n - 1))]`. Returns 0 for no samples.
pub fn p95(samples: &[f64]) -> f64 {
    // ---
    if samples.is_empty() {
        return 0.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let index = (0.95 * (sorted.len() - 1) as f64).floor() as usize;
    sorted[index]
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Per-path latency for `api` metrics, slowest first, top 10.
pub fn summarize_api_latency(samples: &[MetricSample]) -> Vec<AggregatedApiLatency> {
    // ---
    let mut groups: HashMap<&str, DurationStats> = HashMap::new();

    for sample in samples.iter().filter(|s| s.kind == MetricKind::Api) {
        if let Some(path) = sample.path.as_deref() {
            groups.entry(path).or_default().push(sample.duration);
        }
    }

    let mut summary: Vec<AggregatedApiLatency> = groups
        .into_iter()
        .map(|(path, stats)| AggregatedApiLatency {
            path: path.to_string(),
            avg_duration: stats.mean(),
            p95_duration: p95(&stats.durations),
            count: stats.count,
        })
        .collect();

    summary.sort_by(|a, b| descending(a.avg_duration, b.avg_duration).then_with(|| a.path.cmp(&b.path)));
    summary.truncate(API_LATENCY_LIMIT);
    summary
}

/// Mean duration per (UTC day, operation name) for `db` metrics, oldest day first.
pub fn db_duration_trend(samples: &[MetricSample]) -> Vec<DbDurationPoint> {
    // ---
    let mut groups: HashMap<(String, &str), DurationStats> = HashMap::new();

    for sample in samples.iter().filter(|s| s.kind == MetricKind::Db) {
        let day = sample.created_at.format("%Y-%m-%d").to_string();
        groups
            .entry((day, sample.name.as_str()))
            .or_default()
            .push(sample.duration);
    }

    let mut points: Vec<DbDurationPoint> = groups
        .into_iter()
        .map(|((bucket, name), stats)| DbDurationPoint {
            bucket,
            name: name.to_string(),
            avg_duration: stats.mean(),
        })
        .collect();

    points.sort_by(|a, b| a.bucket.cmp(&b.bucket).then_with(|| a.name.cmp(&b.name)));
    points
}

/// Failed `api`/`db` operations, newest first, at most 20.
pub fn recent_errors(metrics: &[Metric]) -> Vec<ErrorFeedItem> {
    // ---
    let mut errors: Vec<&Metric> = metrics
        .iter()
        .filter(|m| matches!(m.kind, MetricKind::Api | MetricKind::Db) && m.is_error())
        .collect();

    errors.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    errors
        .into_iter()
        .take(RECENT_ERROR_LIMIT)
        .map(|m| ErrorFeedItem {
            id: m.id,
            name: m.name.clone(),
            kind: m.kind,
            status: m.status.clone().unwrap_or_default(),
            path: m.path().map(str::to_string),
            created_at: m.created_at,
            error_message: m.error_message().map(str::to_string),
        })
        .collect()
}

/// View counts per route, most viewed first, top 10.
///
/// Takes one route per `view` event.
pub fn page_views<S: AsRef<str>>(viewed_routes: &[S]) -> Vec<PageViewCount> {
    // ---
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for route in viewed_routes {
        *counts.entry(route.as_ref()).or_default() += 1;
    }

    let mut views: Vec<PageViewCount> = counts
        .into_iter()
        .map(|(route, count)| PageViewCount {
            route: route.to_string(),
            count,
        })
        .collect();

    views.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.route.cmp(&b.route)));
    views.truncate(PAGE_VIEW_LIMIT);
    views
}

pub fn db_overview(samples: &[MetricSample]) -> DbOverview {
    // ---
    let mut stats = DurationStats::default();
    let mut overview = DbOverview::default();

    for sample in samples.iter().filter(|s| s.kind == MetricKind::Db) {
        stats.push(sample.duration);
        if sample.is_slow {
            overview.slow_operations += 1;
        }
        if sample.is_error() {
            overview.failed_operations += 1;
        }
    }

    overview.total_operations = stats.count;
    overview.avg_duration = stats.mean();
    overview
}

pub fn total_api_calls(latency: &[AggregatedApiLatency]) -> u64 {
    latency.iter().map(|l| l.count).sum()
}

/// Call-weighted mean latency across paths; 0 when there were no calls.
pub fn weighted_average_latency(latency: &[AggregatedApiLatency]) -> f64 {
    // ---
    let total = total_api_calls(latency);
    if total == 0 {
        return 0.0;
    }

    let weighted: f64 = latency
        .iter()
        .map(|l| l.avg_duration * l.count as f64)
        .sum();
    weighted / total as f64
}

pub fn total_page_views(views: &[PageViewCount]) -> u64 {
    views.iter().map(|v| v.count).sum()
}
