//! Run flag shared between the sampling loop and its stop sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation token gating the sampling loop.
///
/// Starts out running. Once stopped it stays stopped. The loop only looks
/// at it at iteration boundaries; the process scan also reads it as the
/// latch for marker evaluation.
#[derive(Debug, Clone)]
pub struct RunFlag {
    running: Arc<AtomicBool>,
}

impl RunFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Requests the loop to stop.
    ///
    /// A single atomic store, safe to call from a signal handler.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether `other` is a clone of this flag.
    pub fn shares_state_with(&self, other: &RunFlag) -> bool {
        Arc::ptr_eq(&self.running, &other.running)
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
