//! Cold-start detection.
//!
//! The first request served by a freshly started process is usually slower
//! (connection pools warming up, lazy statics, page cache). Metrics recorded
//! for that request are tagged `coldStart: true` so the dashboard can tell
//! them apart.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static PROCESS_COLD_START: Lazy<ColdStart> = Lazy::new(ColdStart::new);

/// A consume-once flag.
///
/// Clones share the same flag. Under concurrent first access exactly one
/// caller observes `true`.
#[derive(Debug, Clone)]
pub struct ColdStart {
    // ---
    pending: Arc<AtomicBool>,
}

impl ColdStart {
    // ---
    /// A fresh, unconsumed flag.
    pub fn new() -> Self {
        // ---
        Self {
            pending: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle to the flag shared by the whole process.
    pub fn process() -> Self {
        PROCESS_COLD_START.clone()
    }

    /// Returns `true` the first time it is called, `false` afterwards.
    pub fn consume(&self) -> bool {
        // ---
        self.pending
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for ColdStart {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether this is the first call in the running process.
pub fn is_cold_start() -> bool {
    PROCESS_COLD_START.consume()
}
