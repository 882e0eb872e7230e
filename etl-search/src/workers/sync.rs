use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

use crate::checkpoint::CheckpointStore;
use crate::concurrency::pending::PendingCounter;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::index::IndexClient;
use crate::replication::flush::BatchFlusher;
use crate::replication::sync_loop::SyncLoop;
use crate::types::SyncEvent;

/// Handle to wait for a spawned [`SyncWorker`].
#[derive(Debug)]
pub struct SyncWorkerHandle {
    handle: Option<JoinHandle<EtlResult<()>>>,
}

impl SyncWorkerHandle {
    /// Waits for the sync worker to finish.
    ///
    /// A panicking or cancelled worker is reported as [`ErrorKind::SyncWorkerPanic`] or
    /// [`ErrorKind::SyncWorkerCancelled`].
    pub async fn wait(mut self) -> EtlResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle.await.map_err(|err| {
            if err.is_cancelled() {
                etl_error!(
                    ErrorKind::SyncWorkerCancelled,
                    "Sync worker was cancelled",
                    err
                )
            } else {
                etl_error!(ErrorKind::SyncWorkerPanic, "Sync worker panicked", err)
            }
        })??;

        Ok(())
    }
}

/// Worker running the [`SyncLoop`] on its own task.
#[derive(Debug)]
pub struct SyncWorker<I, C> {
    index: I,
    checkpoint: C,
    pending: PendingCounter,
    events_rx: mpsc::Receiver<SyncEvent>,
    shutdown_rx: ShutdownRx,
    max_batch_size: usize,
    flush_interval: Duration,
    save_interval: Duration,
}

impl<I, C> SyncWorker<I, C> {
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        index: I,
        checkpoint: C,
        pending: PendingCounter,
        events_rx: mpsc::Receiver<SyncEvent>,
        shutdown_rx: ShutdownRx,
        max_batch_size: usize,
        flush_interval: Duration,
        save_interval: Duration,
    ) -> Self {
        Self {
            index,
            checkpoint,
            pending,
            events_rx,
            shutdown_rx,
            max_batch_size,
            flush_interval,
            save_interval,
        }
    }
}

impl<I, C> SyncWorker<I, C>
where
    I: IndexClient + Send + Sync + 'static,
    C: CheckpointStore + Send + Sync + 'static,
{
    /// Spawns the sync loop and returns a handle to wait for it.
    pub fn spawn(self) -> SyncWorkerHandle {
        info!("starting sync worker");

        let sync_worker_span = tracing::info_span!(
            "sync_worker",
            index_client = I::name(),
            max_batch_size = self.max_batch_size
        );
        let sync_worker = async move {
            let flusher = BatchFlusher::new(
                self.index,
                self.checkpoint,
                self.pending,
                self.max_batch_size,
            );

            SyncLoop::new(
                flusher,
                self.events_rx,
                self.shutdown_rx,
                self.flush_interval,
                self.save_interval,
            )
            .run()
            .await?;

            info!("sync worker completed successfully");

            Ok(())
        }
        .instrument(sync_worker_span.or_current());

        let handle = tokio::spawn(sync_worker);

        SyncWorkerHandle {
            handle: Some(handle),
        }
    }
}
