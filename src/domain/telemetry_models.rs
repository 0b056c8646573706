use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Open key/value bag attached to metrics and activity records.
///
/// Only a handful of keys are ever read back (see [`metadata_keys`]); anything
/// else is carried through untouched.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata keys the aggregation layer knows how to read.
pub mod metadata_keys {
    pub const PATH: &str = "path";
    pub const METHOD: &str = "method";
    pub const COLD_START: &str = "coldStart";
    pub const IS_SLOW: &str = "isSlow";
    pub const ERROR_MESSAGE: &str = "errorMessage";
}

/// Status tag used for successful non-HTTP operations.
pub const STATUS_SUCCESS: &str = "success";

/// Status tag used for any failed operation.
pub const STATUS_ERROR: &str = "error";

/// Where a metric came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    // ---
    Frontend,
    Api,
    Db,
}

impl MetricKind {
    // ---
    pub const ALL: [MetricKind; 3] = [MetricKind::Frontend, MetricKind::Api, MetricKind::Db];

    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            MetricKind::Frontend => "frontend",
            MetricKind::Api => "api",
            MetricKind::Db => "db",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s {
            "frontend" => Ok(MetricKind::Frontend),
            "api" => Ok(MetricKind::Api),
            "db" => Ok(MetricKind::Db),
            other => Err(anyhow::anyhow!("unknown metric kind: {other}")),
        }
    }
}

/// A metric as produced by a timing wrapper, before the store assigns
/// its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMetric {
    // ---
    pub kind: MetricKind,
    pub name: String,

    /// Elapsed time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl NewMetric {
    // ---
    /// Builds a timed metric. Negative or non-finite durations are clamped to zero.
    pub fn timed(
        kind: MetricKind,
        name: impl Into<String>,
        duration_ms: f64,
        status: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        // ---
        let duration = if duration_ms.is_finite() {
            duration_ms.max(0.0)
        } else {
            0.0
        };

        Self {
            kind,
            name: name.into(),
            duration: Some(duration),
            status: Some(status.into()),
            metadata,
        }
    }
}

/// A persisted, immutable timing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    // ---
    pub id: Uuid,
    pub kind: MetricKind,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,

    pub created_at: DateTime<Utc>,
}

impl Metric {
    // ---
    /// Stamps a new metric with a fresh id and the current time.
    pub fn from_new(new: NewMetric) -> Self {
        // ---
        Self::from_new_at(new, Utc::now())
    }

    pub fn from_new_at(new: NewMetric, created_at: DateTime<Utc>) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            kind: new.kind,
            name: new.name,
            duration: new.duration,
            status: new.status,
            metadata: new.metadata,
            created_at,
        }
    }

    /// `metadata.path`, if it is a non-empty string.
    pub fn path(&self) -> Option<&str> {
        // ---
        self.metadata
            .get(metadata_keys::PATH)
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.metadata
            .get(metadata_keys::ERROR_MESSAGE)
            .and_then(Value::as_str)
    }

    pub fn is_slow(&self) -> bool {
        self.metadata
            .get(metadata_keys::IS_SLOW)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// True for `"error"` and any 5xx-style status string.
    pub fn is_error(&self) -> bool {
        is_error_status(self.status.as_deref())
    }
}

fn is_error_status(status: Option<&str>) -> bool {
    // ---
    match status {
        Some(status) => status == STATUS_ERROR || status.starts_with('5'),
        None => false,
    }
}

/// The parts of a metric the dashboard aggregations read.
///
/// Backends that can project columns return these instead of whole records,
/// leaving the metadata bag behind.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    // ---
    pub kind: MetricKind,
    pub name: String,
    pub duration: Option<f64>,
    pub status: Option<String>,
    /// `metadata.path`, if it is a non-empty string.
    pub path: Option<String>,
    /// `metadata.isSlow`, false when absent.
    pub is_slow: bool,
    pub created_at: DateTime<Utc>,
}

impl MetricSample {
    pub fn is_error(&self) -> bool {
        is_error_status(self.status.as_deref())
    }
}

impl From<&Metric> for MetricSample {
    fn from(metric: &Metric) -> Self {
        // ---
        Self {
            kind: metric.kind,
            name: metric.name.clone(),
            duration: metric.duration,
            status: metric.status.clone(),
            path: metric.path().map(str::to_string),
            is_slow: metric.is_slow(),
            created_at: metric.created_at,
        }
    }
}

/// Role of the user behind an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // ---
    Guest,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(anyhow::anyhow!("unknown role: {other}")),
        }
    }
}

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    // ---
    View,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(anyhow::anyhow!("unknown action: {other}")),
        }
    }
}

/// An activity event before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivityLog {
    // ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub role: Role,
    pub action: Action,
    pub route: String,
    pub ip: String,
    pub user_agent: String,

    #[serde(default)]
    pub metadata: Metadata,
}

/// A persisted, immutable activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    // ---
    pub id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub role: Role,
    pub action: Action,
    pub route: String,
    pub ip: String,
    pub user_agent: String,

    #[serde(default)]
    pub metadata: Metadata,

    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    // ---
    pub fn from_new(new: NewActivityLog) -> Self {
        Self::from_new_at(new, Utc::now())
    }

    pub fn from_new_at(new: NewActivityLog, created_at: DateTime<Utc>) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            role: new.role,
            action: new.action,
            route: new.route,
            ip: new.ip,
            user_agent: new.user_agent,
            metadata: new.metadata,
            created_at,
        }
    }
}
