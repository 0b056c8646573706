// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod api_timing;
mod dashboard;
mod health;
mod ingest;
mod metrics;
mod root;
mod shared_types;

// Core handlers
pub use health::health_check;
pub use self::metrics::metrics_handler;
pub use root::root_handler;

// Middleware
pub use api_timing::{track_api_timing, UNMATCHED_ROUTE};

// Dashboard read handlers
pub use dashboard::{api_latency, db_overview, db_trend, page_views, recent_errors, summary};

// Telemetry ingestion handlers
pub use ingest::{record_activity, record_frontend_metric, ActivityRequest, FrontendMetricRequest};
