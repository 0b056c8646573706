// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
///
/// Missing configuration is treated as a deployment error,
/// not a recoverable runtime condition.
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
///
/// This macro is intended for config unit tests only and enforces
/// consistent error messages across failure cases.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub telemetry: telemetry::TelemetryConfig,
    pub metrics: MetricsBackend,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            store: StoreConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
            metrics: MetricsBackend::from_env()?,
        })
    }
}

// ============================================================
// Backend selection
// ============================================================

/// Where telemetry records are persisted.
///
/// Selected by `QUILL_STORE_BACKEND` (`memory`, `postgres` or `redis`).
/// Only the selected backend's variables are required.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Postgres(database::DatabaseConfig),
    Redis(RedisConfig),
}

impl StoreConfig {
    /// # Errors
    /// Returns an error for an unknown backend name or when the chosen
    /// backend's required configuration is missing.
    pub fn from_env() -> Result<Self> {
        // ---
        let backend = std::env::var("QUILL_STORE_BACKEND").unwrap_or_else(|_| "memory".to_string());

        match backend.as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres(DatabaseConfig::from_env()?)),
            "redis" => Ok(Self::Redis(RedisConfig::from_env()?)),
            other => Err(anyhow::anyhow!("Unknown QUILL_STORE_BACKEND: {other}")),
        }
    }
}

/// Which implementation serves the process metrics on `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsBackend {
    Noop,
    Prometheus,
}

impl MetricsBackend {
    pub fn from_env() -> Result<Self> {
        // ---
        match std::env::var("QUILL_METRICS_TYPE").as_deref() {
            Err(_) | Ok("noop") => Ok(Self::Noop),
            Ok("prom") => Ok(Self::Prometheus),
            Ok(other) => Err(anyhow::anyhow!("Unknown QUILL_METRICS_TYPE: {other}")),
        }
    }
}

// ============================================================
// Database configuration
// ============================================================

mod database {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    ///
    /// Required when the PostgreSQL backend is selected and validated
    /// eagerly during startup.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        /// Startup will fail fast rather than continuing with incomplete
        /// or invalid configuration.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("QUILL_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("QUILL_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("QUILL_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("QUILL_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use database::DatabaseConfig;

// ============================================================
// Redis configuration
// ============================================================

mod redis {
    // ---
    use super::*;

    /// Redis-related configuration for the sorted-set telemetry store.
    #[derive(Debug, Clone)]
    pub struct RedisConfig {
        /// Redis connection string.
        pub url: String,

        /// Prefix for the per-collection keys. Defaults to `quill:telemetry`.
        pub key_prefix: String,
    }

    impl RedisConfig {
        /// Builds a [`RedisConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let url = required_env!("QUILL_REDIS_URL");

            let key_prefix = std::env::var("QUILL_REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "quill:telemetry".to_string());

            Ok(Self { url, key_prefix })
        }
    }
}
pub use self::redis::RedisConfig;

// ============================================================
// Telemetry configuration
// ============================================================

mod telemetry {
    // ---
    use super::*;
    use crate::telemetry::{DEFAULT_SLOW_QUERY_THRESHOLD, DEFAULT_WRITE_TIMEOUT};

    /// Tuning for the write path. Every field has a default.
    #[derive(Debug, Clone)]
    pub struct TelemetryConfig {
        /// DB operations at or above this duration are tagged slow. Defaults to 50 ms.
        pub slow_query_threshold: Duration,

        /// Upper bound for a single detached store write. Defaults to 2000 ms.
        pub write_timeout: Duration,
    }

    impl Default for TelemetryConfig {
        fn default() -> Self {
            Self {
                slow_query_threshold: DEFAULT_SLOW_QUERY_THRESHOLD,
                write_timeout: DEFAULT_WRITE_TIMEOUT,
            }
        }
    }

    impl TelemetryConfig {
        /// Builds a [`TelemetryConfig`] from environment variables.
        pub fn from_env() -> Self {
            // ---
            let defaults = Self::default();
            let slow_ms = optional_env_parse!(
                "QUILL_SLOW_QUERY_THRESHOLD_MS",
                u64,
                defaults.slow_query_threshold.as_millis() as u64
            );
            let write_timeout_ms = optional_env_parse!(
                "QUILL_TELEMETRY_WRITE_TIMEOUT_MS",
                u64,
                defaults.write_timeout.as_millis() as u64
            );

            Self {
                slow_query_threshold: Duration::from_millis(slow_ms),
                write_timeout: Duration::from_millis(write_timeout_ms),
            }
        }
    }
}
pub use telemetry::TelemetryConfig;

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use anyhow::Result;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_database_url_fails() -> Result<()> {
        // ---
        std::env::remove_var("DATABASE_URL");

        assert_missing_config!(DatabaseConfig::from_env(), "DATABASE_URL");

        Ok(())
    }

    #[test]
    #[serial]
    fn database_defaults_applied() -> Result<()> {
        // ---
        let db_url = "postgres://test";
        std::env::set_var("DATABASE_URL", db_url); // required

        std::env::remove_var("QUILL_DB_RETRY_COUNT");
        std::env::remove_var("QUILL_DB_ACQUIRE_TIMEOUT_SEC");
        std::env::remove_var("QUILL_DB_MIN_CONNECTIONS");
        std::env::remove_var("QUILL_DB_MAX_CONNECTIONS");

        let cfg = DatabaseConfig::from_env()?;
        assert_eq!(cfg.database_url, db_url);
        assert_eq!(cfg.retry_count, 50);
        assert_eq!(cfg.acquire_timeout.as_secs(), 30);
        assert_eq!(cfg.min_connections, 2);
        assert_eq!(cfg.max_connections, 15);

        Ok(())
    }

    #[test]
    #[serial]
    fn database_overrides_defaults() -> Result<()> {
        // ---
        let db_url = "postgres://test";
        std::env::set_var("DATABASE_URL", db_url);
        std::env::set_var("QUILL_DB_RETRY_COUNT", "3");
        std::env::set_var("QUILL_DB_ACQUIRE_TIMEOUT_SEC", "5");
        std::env::set_var("QUILL_DB_MIN_CONNECTIONS", "10");
        std::env::set_var("QUILL_DB_MAX_CONNECTIONS", "1000");

        let cfg = DatabaseConfig::from_env()?;
        assert_eq!(cfg.retry_count, 3);
        assert_eq!(cfg.acquire_timeout.as_secs(), 5);
        assert_eq!(cfg.database_url, db_url);
        assert_eq!(cfg.min_connections, 10);
        assert_eq!(cfg.max_connections, 1000);

        std::env::remove_var("QUILL_DB_RETRY_COUNT");
        std::env::remove_var("QUILL_DB_ACQUIRE_TIMEOUT_SEC");
        std::env::remove_var("QUILL_DB_MIN_CONNECTIONS");
        std::env::remove_var("QUILL_DB_MAX_CONNECTIONS");

        Ok(())
    }

    #[test]
    #[serial]
    fn redis_requires_url() -> Result<()> {
        // ---
        std::env::remove_var("QUILL_REDIS_URL");
        assert_missing_config!(RedisConfig::from_env(), "QUILL_REDIS_URL");

        std::env::set_var("QUILL_REDIS_URL", "redis://localhost");
        std::env::remove_var("QUILL_REDIS_KEY_PREFIX");
        let cfg = RedisConfig::from_env()?;
        assert_eq!(cfg.key_prefix, "quill:telemetry");

        std::env::remove_var("QUILL_REDIS_URL");
        Ok(())
    }

    #[test]
    #[serial]
    fn telemetry_defaults_and_overrides() {
        // ---
        std::env::remove_var("QUILL_SLOW_QUERY_THRESHOLD_MS");
        std::env::remove_var("QUILL_TELEMETRY_WRITE_TIMEOUT_MS");

        let cfg = TelemetryConfig::from_env();
        assert_eq!(cfg.slow_query_threshold, Duration::from_millis(50));
        assert_eq!(cfg.write_timeout, Duration::from_millis(2000));

        std::env::set_var("QUILL_SLOW_QUERY_THRESHOLD_MS", "120");
        std::env::set_var("QUILL_TELEMETRY_WRITE_TIMEOUT_MS", "not-a-number");

        let cfg = TelemetryConfig::from_env();
        assert_eq!(cfg.slow_query_threshold, Duration::from_millis(120));
        assert_eq!(cfg.write_timeout, Duration::from_millis(2000));

        std::env::remove_var("QUILL_SLOW_QUERY_THRESHOLD_MS");
        std::env::remove_var("QUILL_TELEMETRY_WRITE_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn store_backend_selection() -> Result<()> {
        // ---
        std::env::remove_var("QUILL_STORE_BACKEND");
        assert!(matches!(StoreConfig::from_env()?, StoreConfig::Memory));

        std::env::set_var("QUILL_STORE_BACKEND", "postgres");
        std::env::remove_var("DATABASE_URL");
        assert_missing_config!(StoreConfig::from_env(), "DATABASE_URL");

        std::env::set_var("QUILL_STORE_BACKEND", "sqlite");
        assert!(StoreConfig::from_env().is_err());

        std::env::remove_var("QUILL_STORE_BACKEND");
        Ok(())
    }

    #[test]
    #[serial]
    fn app_config_from_env_success() -> Result<()> {
        // ---
        std::env::remove_var("QUILL_STORE_BACKEND");
        std::env::set_var("QUILL_METRICS_TYPE", "prom");

        let cfg = AppConfig::from_env()?;
        assert!(matches!(cfg.store, StoreConfig::Memory));
        assert_eq!(cfg.metrics, MetricsBackend::Prometheus);

        std::env::set_var("QUILL_METRICS_TYPE", "statsd");
        assert!(AppConfig::from_env().is_err());

        std::env::remove_var("QUILL_METRICS_TYPE");
        Ok(())
    }
}
