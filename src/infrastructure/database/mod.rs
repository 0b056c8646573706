mod pool;
mod postgres_store;


pub use pool::{connect_with_retry, run_migrations};
pub use postgres_store::PostgresStore;

use crate::config::DatabaseConfig;
use anyhow::Result;
use std::sync::Arc;

/// Creates a PostgreSQL-backed telemetry store.
///
/// Connects (with retry) and brings the schema up to date before
/// returning, so the first write does not race the migrations.
pub async fn create(config: &DatabaseConfig) -> Result<Arc<PostgresStore>> {
    // ---
    tracing::info!("Initializing PostgreSQL telemetry store");

    let pool = connect_with_retry(config).await?;
    run_migrations(&pool).await?;

    Ok(Arc::new(PostgresStore::new(pool)))
}
