mod metrics;
mod store;
mod telemetry_models;

// Publicly expose the Metrics abstraction
pub use self::metrics::{Metrics, MetricsPtr};

// Publicly expose the telemetry persistence abstraction and records
pub use store::{TelemetryStore, TelemetryStorePtr};
pub use telemetry_models::{
    metadata_keys, Action, ActivityLog, Metadata, Metric, MetricKind, MetricSample, NewActivityLog,
    NewMetric, Role, STATUS_ERROR, STATUS_SUCCESS,
};
