use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Opens the connection pool, retrying while the database comes up.
///
/// Gives up after `retry_count` attempts. Containers often start the
/// service before PostgreSQL accepts connections, hence the retry loop.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => {
                tracing::info!(attempt, "Connected to PostgreSQL");
                return Ok(pool);
            }
            Err(err) if attempt < config.retry_count => {
                tracing::warn!(attempt, "Database not ready: {}", err);
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to connect to database after {attempt} attempts"));
            }
        }
    }
}

/// Applies the embedded migrations in `./migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    // ---
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run telemetry migrations")?;
    Ok(())
}
