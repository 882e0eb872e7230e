use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use crate::checkpoint::CheckpointStore;
use crate::checkpoint::memory::MemoryCheckpointStore;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::test_utils::notify::TimedNotify;
use crate::types::Position;

#[derive(Debug, Default)]
struct Inner {
    failing_saves: usize,
    save_attempts: usize,
    save_attempt_conditions: Vec<(usize, Arc<Notify>)>,
}

impl Inner {
    fn check_conditions(&mut self) {
        let save_attempts = self.save_attempts;
        self.save_attempt_conditions.retain(|(count, notify)| {
            let should_retain = save_attempts < *count;
            if !should_retain {
                notify.notify_one();
            }
            should_retain
        });
    }
}

/// Checkpoint store for tests, backed by a [`MemoryCheckpointStore`].
///
/// Counts save attempts and fails the next saves registered through
/// [`TestCheckpointStore::fail_next_saves`].
#[derive(Debug, Clone, Default)]
pub struct TestCheckpointStore {
    store: MemoryCheckpointStore,
    inner: Arc<Mutex<Inner>>,
}

impl TestCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the backing store, to inspect saved positions.
    pub fn store(&self) -> &MemoryCheckpointStore {
        &self.store
    }

    /// Makes the next `count` saves fail.
    pub async fn fail_next_saves(&self, count: usize) {
        self.inner.lock().await.failing_saves = count;
    }

    /// Returns how many saves were attempted, failed ones included.
    pub async fn save_attempts(&self) -> usize {
        self.inner.lock().await.save_attempts
    }

    /// Registers a notification fired once at least `count` saves were attempted.
    pub async fn wait_for_save_attempts(&self, count: usize) -> TimedNotify {
        let notify = Arc::new(Notify::new());
        let mut inner = self.inner.lock().await;
        inner.save_attempt_conditions.push((count, notify.clone()));
        inner.check_conditions();

        TimedNotify::new(notify)
    }
}

impl CheckpointStore for TestCheckpointStore {
    async fn update_position(&self, position: Position) -> EtlResult<()> {
        self.store.update_position(position).await
    }

    async fn save(&self) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.save_attempts += 1;

        let result = if inner.failing_saves > 0 {
            inner.failing_saves -= 1;
            Err(etl_error!(
                ErrorKind::CheckpointSaveFailed,
                "Injected checkpoint save failure"
            ))
        } else {
            self.store.save().await
        };

        inner.check_conditions();

        result
    }

    async fn current_position(&self) -> EtlResult<Position> {
        self.store.current_position().await
    }
}
