use etl_config::shared::SyncConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::bail;
use crate::checkpoint::CheckpointStore;
use crate::concurrency::pending::PendingCounter;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel, request_shutdown};
use crate::error::{ErrorKind, EtlResult};
use crate::index::IndexClient;
use crate::replication::producer::SyncEventSender;
use crate::replication::wait::wait_for_position;
use crate::rule::Rules;
use crate::types::Position;
use crate::workers::sync::{SyncWorker, SyncWorkerHandle};

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started { sync_worker: SyncWorkerHandle },
}

/// Wires producers, the sync worker, the index client and the checkpoint store together.
#[derive(Debug)]
pub struct SyncPipeline<I, C> {
    config: Arc<SyncConfig>,
    rules: Arc<Rules>,
    index: I,
    checkpoint: C,
    pending: PendingCounter,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl<I, C> SyncPipeline<I, C>
where
    I: IndexClient + Clone + Send + Sync + 'static,
    C: CheckpointStore + Clone + Send + Sync + 'static,
{
    /// Creates a pipeline, validating `config` and building its rules.
    pub fn new(config: SyncConfig, index: I, checkpoint: C) -> EtlResult<Self> {
        config.validate()?;
        let rules = Rules::from_configs(&config.rules)?;

        // Workers subscribe to the shutdown channel when they start.
        let (shutdown_tx, _) = create_shutdown_channel();

        Ok(Self {
            config: Arc::new(config),
            rules: Arc::new(rules),
            index,
            checkpoint,
            pending: PendingCounter::new(),
            state: PipelineState::NotStarted,
            shutdown_tx,
        })
    }

    /// Returns the rules producers look tables up in.
    pub fn rules(&self) -> &Arc<Rules> {
        &self.rules
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Starts the sync worker and returns the sender producers feed it with.
    pub fn start(&mut self) -> EtlResult<SyncEventSender> {
        if matches!(self.state, PipelineState::Started { .. }) {
            bail!(ErrorKind::InvalidState, "Sync pipeline was already started");
        }

        info!(
            rules = self.rules.len(),
            channel_capacity = self.config.channel_capacity,
            "starting sync pipeline"
        );

        let (events_tx, events_rx) = mpsc::channel(self.config.channel_capacity);

        let sync_worker = SyncWorker::new(
            self.index.clone(),
            self.checkpoint.clone(),
            self.pending.clone(),
            events_rx,
            self.shutdown_tx.subscribe(),
            self.config.batch.max_size,
            Duration::from_millis(self.config.batch.flush_interval_ms),
            Duration::from_millis(self.config.checkpoint.save_interval_ms),
        )
        .spawn();

        self.state = PipelineState::Started { sync_worker };

        Ok(SyncEventSender::new(events_tx, self.pending.clone()))
    }

    /// Waits until the checkpoint reaches `target`, for at most `timeout_secs` seconds.
    pub async fn wait_for_position(
        &self,
        target: &Position,
        timeout_secs: u64,
    ) -> EtlResult<bool> {
        wait_for_position(&self.checkpoint, target, timeout_secs).await
    }

    /// Returns the number of operations produced but not yet flushed.
    pub fn pending_operations(&self) -> i64 {
        self.pending.get()
    }

    /// Waits for the sync worker to stop.
    pub async fn wait(self) -> EtlResult<()> {
        let PipelineState::Started { sync_worker } = self.state else {
            info!("sync pipeline was not started, nothing to wait for");

            return Ok(());
        };

        info!("waiting for sync worker to complete");

        sync_worker.wait().await
    }

    /// Signals the sync worker to stop after a final flush.
    pub fn shutdown(&self) {
        info!("trying to shut down the sync pipeline");

        if !request_shutdown(&self.shutdown_tx) {
            error!("failed to send shutdown signal, no worker is listening");
            return;
        }

        info!("shutdown signal successfully sent to the sync worker");
    }

    pub async fn shutdown_and_wait(self) -> EtlResult<()> {
        self.shutdown();
        self.wait().await
    }
}
