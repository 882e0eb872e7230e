use std::sync::Arc;
use tokio::sync::Mutex;

use crate::checkpoint::CheckpointStore;
use crate::error::EtlResult;
use crate::types::Position;

#[derive(Debug, Default)]
struct Inner {
    position: Position,
    saved_position: Option<Position>,
    save_count: usize,
}

/// Checkpoint store that keeps everything in memory.
///
/// "Saving" copies the current position into a saved slot, which tests inspect to verify when and
/// what the sync loop persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store starting from `position`, as if it had been loaded from storage.
    pub fn with_position(position: Position) -> Self {
        let inner = Inner {
            position: position.clone(),
            saved_position: Some(position),
            save_count: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns the last saved position.
    pub async fn saved_position(&self) -> Option<Position> {
        self.inner.lock().await.saved_position.clone()
    }

    /// Returns how many times [`CheckpointStore::save`] was called.
    pub async fn save_count(&self) -> usize {
        self.inner.lock().await.save_count
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    async fn update_position(&self, position: Position) -> EtlResult<()> {
        self.inner.lock().await.position = position;

        Ok(())
    }

    async fn save(&self) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.saved_position = Some(inner.position.clone());
        inner.save_count += 1;

        Ok(())
    }

    async fn current_position(&self) -> EtlResult<Position> {
        Ok(self.inner.lock().await.position.clone())
    }
}
