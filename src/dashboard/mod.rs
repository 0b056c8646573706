//! Read-side aggregation for the operations dashboard.

pub mod aggregate;
mod queries;

pub use aggregate::{
    p95, total_api_calls, total_page_views, weighted_average_latency, AggregatedApiLatency,
    DbDurationPoint, DbOverview, ErrorFeedItem, PageViewCount,
};
pub use queries::{
    api_latency_summary, dashboard_summary, db_duration_trend, db_overview, page_views,
    recent_errors, DashboardSummary, RECENT_WINDOW, TREND_WINDOW,
};
