use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Quill telemetry service
Version: {version}

Available endpoints:
  - GET    /health                  - Light health check
  - GET    /health?mode=full        - Full health check (includes telemetry store)
  - GET    /metrics                 - Process metrics (Prometheus text)
  - GET    /dashboard/summary       - All dashboard views in one payload
  - GET    /dashboard/api-latency   - Per-path latency, last 24h
  - GET    /dashboard/db-trend      - Daily DB durations, last 7d
  - GET    /dashboard/db-overview   - DB totals, last 24h
  - GET    /dashboard/errors        - Latest 20 errors, last 7d
  - GET    /dashboard/page-views    - Most viewed routes, last 7d
  - POST   /telemetry/activity      - Record a user/route activity event
  - POST   /telemetry/frontend      - Record a frontend timing
"#
    )
}
