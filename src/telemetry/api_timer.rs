//! Timing for HTTP-shaped handlers.
//!
//! A handler takes one argument that knows its request path and method
//! (a bare request, or a `(request, context)` pair) and resolves to
//! `Result<R, E>` where `R` carries a status code. Each call produces one
//! `api` metric; the handler's own result is passed back untouched.

use super::recorder::TelemetryRecorder;
use crate::domain::{metadata_keys, Metadata, MetricKind, NewMetric, STATUS_ERROR};
use axum::http::{Request, Response, StatusCode};
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Request data an instrumented handler exposes to the timer.
pub trait RequestInfo {
    // ---
    fn path(&self) -> &str;
    fn method(&self) -> &str;
}

impl<B> RequestInfo for Request<B> {
    fn path(&self) -> &str {
        self.uri().path()
    }

    fn method(&self) -> &str {
        Request::method(self).as_str()
    }
}

/// Context-aware handler shape: the request plus whatever the caller threads
/// alongside it.
impl<R: RequestInfo, C> RequestInfo for (R, C) {
    fn path(&self) -> &str {
        self.0.path()
    }

    fn method(&self) -> &str {
        self.0.method()
    }
}

/// Owned path/method pair for handlers that are not driven by an `http::Request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    // ---
    pub path: String,
    pub method: String,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }
}

impl RequestInfo for RequestMeta {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &str {
        &self.method
    }
}

/// Anything that resolves to an HTTP status code.
pub trait ResponseStatus {
    fn status_code(&self) -> u16;
}

impl<B> ResponseStatus for Response<B> {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

impl ResponseStatus for StatusCode {
    fn status_code(&self) -> u16 {
        self.as_u16()
    }
}

impl<T> ResponseStatus for (StatusCode, T) {
    fn status_code(&self) -> u16 {
        self.0.as_u16()
    }
}

/// Milliseconds elapsed since `start`, at sub-millisecond resolution.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Time one handler invocation and record it as an `api` metric.
///
/// `path` and `method` must be captured before the handler consumes its
/// request.
pub async fn time_api<Fut, R, E>(
    recorder: &TelemetryRecorder,
    name: &str,
    path: &str,
    method: &str,
    call: Fut,
) -> Result<R, E>
where
    Fut: Future<Output = Result<R, E>>,
    R: ResponseStatus,
    E: Display,
{
    // ---
    let start = Instant::now();
    let cold_start = recorder.is_cold_start();

    let result = call.await;
    let duration = elapsed_ms(start);

    let mut metadata = Metadata::new();
    metadata.insert(metadata_keys::PATH.into(), Value::from(path));
    metadata.insert(metadata_keys::METHOD.into(), Value::from(method));
    metadata.insert(metadata_keys::COLD_START.into(), Value::Bool(cold_start));

    let status = match &result {
        Ok(response) => response.status_code().to_string(),
        Err(err) => {
            metadata.insert(metadata_keys::ERROR_MESSAGE.into(), Value::from(err.to_string()));
            STATUS_ERROR.to_string()
        }
    };

    recorder.log_metric(NewMetric::timed(MetricKind::Api, name, duration, status, metadata));

    result
}

/// Wrap `handler` so every call is timed.
///
/// The returned closure has the same argument and result types as the
/// handler; only the future is boxed.
pub fn with_api_timing<A, H, Fut, R, E>(
    recorder: TelemetryRecorder,
    name: impl Into<String>,
    handler: H,
) -> impl Fn(A) -> BoxFuture<'static, Result<R, E>> + Clone + Send + Sync + 'static
where
    A: RequestInfo + Send + 'static,
    H: Fn(A) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: ResponseStatus + Send + 'static,
    E: Display + Send + 'static,
{
    // ---
    let name: Arc<str> = Arc::from(name.into());

    move |args: A| {
        let recorder = recorder.clone();
        let name = Arc::clone(&name);
        let path = args.path().to_owned();
        let method = args.method().to_owned();
        let call = handler(args);

        Box::pin(async move { time_api(&recorder, &name, &path, &method, call).await })
    }
}
