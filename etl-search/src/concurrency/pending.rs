use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Number of document operations produced but not yet drained by a flush.
///
/// Producers add, the flusher subtracts what it drained. The value is diagnostic only and never
/// drives flow control, so updates use relaxed ordering: a reader racing with a producer or the
/// flusher may observe a slightly stale value, and the counter can transiently dip below zero when
/// a flush drains operations before the producer's increment becomes visible.
#[derive(Debug, Clone, Default)]
pub struct PendingCounter {
    pending: Arc<AtomicI64>,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `count` newly produced operations.
    pub fn add(&self, count: usize) {
        self.pending.fetch_add(to_i64(count), Ordering::Relaxed);
    }

    /// Records `count` drained operations.
    pub fn sub(&self, count: usize) {
        self.pending.fetch_sub(to_i64(count), Ordering::Relaxed);
    }

    /// Returns the current number of pending operations.
    pub fn get(&self) -> i64 {
        self.pending.load(Ordering::Relaxed)
    }
}

fn to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
