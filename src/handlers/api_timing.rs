//! Router-wide API timing.

use crate::app_state::AppState;
use crate::telemetry::time_api;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::time::Instant;

/// Metric name and histogram label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Middleware that times every request as an `api` metric.
///
/// The metric is named after the matched route template (`/dashboard/errors`),
/// while `metadata.path` keeps the concrete request path. Requests that match
/// no route are all named `unmatched`, so probing arbitrary URLs cannot mint
/// new histogram series. The same request also lands in the process HTTP
/// latency histogram.
pub async fn track_api_timing(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // ---
    let start = Instant::now();
    let path = request.uri().path().to_owned();
    let method = request.method().as_str().to_owned();
    let name = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let call = async move { Ok::<_, Infallible>(next.run(request).await) };
    let response = match time_api(state.recorder(), &name, &path, &method, call).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    state
        .metrics()
        .record_http_request(start, &name, &method, response.status().as_u16());

    response
}
