mod redis_store;

pub use redis_store::RedisStore;

use crate::config::RedisConfig;
use anyhow::Result;
use std::sync::Arc;

/// Creates a Redis-backed telemetry store.
///
/// No connection is made here. The store opens one multiplexed connection
/// on first use and shares it across operations.
pub fn create(config: &RedisConfig) -> Result<Arc<RedisStore>> {
    // ---
    tracing::info!("Initializing Redis telemetry store");
    let client = redis::Client::open(config.url.clone())?;
    Ok(Arc::new(RedisStore::new(client, &config.key_prefix)))
}
