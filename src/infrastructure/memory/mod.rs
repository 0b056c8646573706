mod memory_store;

pub use memory_store::MemoryStore;
use std::sync::Arc;

/// Creates an empty in-process telemetry store.
///
/// Records live only as long as the process. Suitable for development,
/// tests, and single-instance deployments that accept losing history on
/// restart.
pub fn create() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}
