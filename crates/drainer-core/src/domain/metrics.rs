//! Drain counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the engine counters.
///
/// - `iterations`: one per completed fetch, including the empty one that ends a run.
/// - `processed`: one per dispatched item, regardless of outcome.
/// - `failed`: one per item whose handler failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub iterations: u64,
    pub processed: u64,
    pub failed: u64,
}

impl Metrics {
    pub fn succeeded(&self) -> u64 {
        self.processed.saturating_sub(self.failed)
    }
}

/// Shared counters updated by concurrent dispatches within a batch.
///
/// Counters only grow; they persist across `run` calls until `reset()`.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    iterations: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one completed dispatch.
    pub fn record_item(&self, success: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> Metrics {
        Metrics {
            iterations: self.iterations.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.iterations.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}
