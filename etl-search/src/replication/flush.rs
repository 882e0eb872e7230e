use metrics::{counter, gauge, histogram};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::checkpoint::CheckpointStore;
use crate::concurrency::pending::PendingCounter;
use crate::index::IndexClient;
use crate::metrics::{
    ERROR_KIND_LABEL, ETL_INDEX_CHUNK_FAILURES_TOTAL, ETL_INDEX_CHUNK_SUBMIT_DURATION_SECONDS,
    ETL_INDEX_OPERATIONS_SUBMITTED_TOTAL, ETL_PENDING_OPERATIONS, INDEX_CLIENT_LABEL,
};
use crate::types::DocumentOperation;

/// Default maximum number of operations per bulk request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Drains pending document operations into the index in bounded chunks.
///
/// A flush never fails: a chunk the index rejects is logged together with the current checkpoint
/// position and dropped, and the remaining chunks are still submitted.
#[derive(Debug)]
pub struct BatchFlusher<I, C> {
    index: I,
    checkpoint: C,
    pending: PendingCounter,
    max_batch_size: usize,
}

impl<I, C> BatchFlusher<I, C> {
    /// Creates a flusher. A `max_batch_size` of 0 is treated as 1.
    pub fn new(index: I, checkpoint: C, pending: PendingCounter, max_batch_size: usize) -> Self {
        Self {
            index,
            checkpoint,
            pending,
            max_batch_size: max_batch_size.max(1),
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn checkpoint(&self) -> &C {
        &self.checkpoint
    }
}

impl<I, C> BatchFlusher<I, C>
where
    I: IndexClient,
    C: CheckpointStore,
{
    /// Flushes `pending` and returns the number of operations drained.
    ///
    /// Nothing happens when `pending` is empty, or when it holds fewer than `max_batch_size`
    /// operations and `force` is `false`. Otherwise the whole buffer is taken, submitted in
    /// contiguous chunks of at most `max_batch_size` operations, and `pending` is left empty.
    pub async fn flush(&self, pending: &mut Vec<DocumentOperation>, force: bool) -> usize {
        if pending.is_empty() || (!force && pending.len() < self.max_batch_size) {
            return 0;
        }

        let operations = std::mem::replace(pending, Vec::with_capacity(self.max_batch_size));
        let drained = operations.len();

        debug!(batch_size = drained, force, "flushing pending operations");

        let mut operations = operations.into_iter();
        let mut chunk_index = 0;
        loop {
            let chunk = operations
                .by_ref()
                .take(self.max_batch_size)
                .collect::<Vec<_>>();
            if chunk.is_empty() {
                break;
            }

            self.submit_chunk(chunk_index, chunk).await;
            chunk_index += 1;
        }

        self.pending.sub(drained);
        gauge!(ETL_PENDING_OPERATIONS).set(self.pending.get() as f64);

        drained
    }

    async fn submit_chunk(&self, chunk_index: usize, chunk: Vec<DocumentOperation>) {
        let chunk_size = chunk.len();
        let before_sending = Instant::now();

        let result = self.index.submit(chunk).await;

        histogram!(
            ETL_INDEX_CHUNK_SUBMIT_DURATION_SECONDS,
            INDEX_CLIENT_LABEL => I::name(),
        )
        .record(before_sending.elapsed().as_secs_f64());
        counter!(
            ETL_INDEX_OPERATIONS_SUBMITTED_TOTAL,
            INDEX_CLIENT_LABEL => I::name(),
        )
        .increment(chunk_size as u64);

        match result {
            Ok(response) if response.errors => {
                let failed_items = response.failed_items().count();
                let first_error = response
                    .failed_items()
                    .find_map(|item| item.error.clone())
                    .unwrap_or_default();

                warn!(
                    chunk_index,
                    chunk_size,
                    failed_items,
                    first_error = %first_error,
                    "index rejected some operations of the chunk"
                );
            }
            Ok(_) => {}
            Err(err) => {
                counter!(
                    ETL_INDEX_CHUNK_FAILURES_TOTAL,
                    INDEX_CLIENT_LABEL => I::name(),
                    ERROR_KIND_LABEL => format!("{:?}", err.kind()),
                )
                .increment(1);

                let position = match self.checkpoint.current_position().await {
                    Ok(position) => position.to_string(),
                    Err(_) => "unknown".to_string(),
                };

                error!(
                    error = %err,
                    chunk_index,
                    chunk_size,
                    %position,
                    "failed to submit chunk to the index, its operations are dropped"
                );
            }
        }
    }
}
