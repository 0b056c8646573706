mod database;
mod memory;
pub mod metrics;
mod redis;

// Re-export the factory functions for easy access
pub use database::{create as create_postgres_store, PostgresStore};
pub use memory::{create as create_memory_store, MemoryStore};
pub use self::metrics::{create_noop_metrics, create_prom_metrics};
pub use self::redis::{create as create_redis_store, RedisStore};
