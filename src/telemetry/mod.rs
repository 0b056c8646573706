//! Write-side instrumentation: cold-start detection, the best-effort
//! recorder and the timing wrappers built on it.

mod api_timer;
mod cold_start;
mod db_timer;
mod recorder;
mod timer;

pub use api_timer::{time_api, with_api_timing, RequestInfo, RequestMeta, ResponseStatus};
pub use cold_start::{is_cold_start, ColdStart};
pub use db_timer::{is_slow, time_db, DbTimingOptions};
pub use recorder::{TelemetryRecorder, DEFAULT_SLOW_QUERY_THRESHOLD, DEFAULT_WRITE_TIMEOUT};
pub use timer::{time_operation, OperationOptions};
