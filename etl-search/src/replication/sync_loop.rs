use metrics::counter;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::EtlResult;
use crate::index::IndexClient;
use crate::metrics::{
    ERROR_KIND_LABEL, ETL_CHECKPOINT_SAVE_FAILURES_TOTAL, ETL_CHECKPOINT_SAVES_TOTAL,
};
use crate::replication::flush::BatchFlusher;
use crate::types::{DocumentOperation, Position, SyncEvent};

/// Default period of the timer force-flushing partially filled batches.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(200);

/// Default minimum time between two checkpoint saves.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(1);

/// Mutable state owned by the sync loop.
#[derive(Debug)]
struct SyncLoopState {
    /// Operations received but not yet submitted.
    pending: Vec<DocumentOperation>,
    /// Whether the in-memory checkpoint moved since the last successful save.
    checkpoint_dirty: bool,
    /// Time of the last save attempt, successful or not.
    last_save: Instant,
}

/// The single consumer of [`SyncEvent`]s.
///
/// Each iteration waits for, in priority order, the shutdown signal, the flush timer, or the next
/// event. Operations are buffered and flushed once a full batch is pending, on every timer tick,
/// and before a position marker is applied to the checkpoint. After every iteration that does not
/// stop the loop, the checkpoint is saved if it moved and the save interval has elapsed.
///
/// Shutdown flushes the buffer but does not drain the channel: events still queued are abandoned.
#[derive(Debug)]
pub struct SyncLoop<I, C> {
    flusher: BatchFlusher<I, C>,
    events_rx: mpsc::Receiver<SyncEvent>,
    shutdown_rx: ShutdownRx,
    flush_interval: Duration,
    save_interval: Duration,
    state: SyncLoopState,
}

impl<I, C> SyncLoop<I, C>
where
    I: IndexClient,
    C: CheckpointStore,
{
    pub fn new(
        flusher: BatchFlusher<I, C>,
        events_rx: mpsc::Receiver<SyncEvent>,
        shutdown_rx: ShutdownRx,
        flush_interval: Duration,
        save_interval: Duration,
    ) -> Self {
        let state = SyncLoopState {
            pending: Vec::with_capacity(flusher.max_batch_size()),
            checkpoint_dirty: false,
            last_save: Instant::now(),
        };

        Self {
            flusher,
            events_rx,
            shutdown_rx,
            flush_interval: flush_interval.max(Duration::from_millis(1)),
            save_interval,
            state,
        }
    }

    /// Runs the loop until shutdown is requested or every producer is dropped.
    ///
    /// Only a failure to update the in-memory checkpoint position stops the loop with an error.
    pub async fn run(mut self) -> EtlResult<()> {
        info!(
            max_batch_size = self.flusher.max_batch_size(),
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            save_interval_ms = self.save_interval.as_millis() as u64,
            "starting sync loop"
        );

        // The first tick fires one interval after start.
        let mut flush_timer =
            tokio::time::interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        flush_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                // PRIORITY 1: Handle shutdown signals.
                _ = self.shutdown_rx.changed() => {
                    self.flush(true).await;

                    let abandoned_events = self.events_rx.len();
                    if abandoned_events > 0 {
                        warn!(
                            abandoned_events,
                            "shutting down with unconsumed events, they will not be synced"
                        );
                    }

                    info!("sync loop stopped on shutdown");

                    return Ok(());
                }

                // PRIORITY 2: Force flush partially filled batches.
                _ = flush_timer.tick() => {
                    self.flush(true).await;
                }

                // PRIORITY 3: Handle producer events.
                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        self.flush(true).await;
                        info!("every producer is gone, stopping sync loop");

                        return Ok(());
                    };

                    self.handle_event(event).await?;
                }
            }

            self.save_checkpoint_if_needed().await;
        }
    }

    async fn handle_event(&mut self, event: SyncEvent) -> EtlResult<()> {
        match event {
            SyncEvent::Operations(operations) => {
                self.state.pending.extend(operations);
                self.flush(false).await;
            }
            SyncEvent::Position(position) => {
                self.handle_position(position).await?;
            }
        }

        Ok(())
    }

    /// Flushes everything enqueued before `position`, then moves the in-memory checkpoint.
    async fn handle_position(&mut self, position: Position) -> EtlResult<()> {
        self.flush(true).await;

        debug!(%position, "updating checkpoint position");
        self.flusher.checkpoint().update_position(position).await?;
        self.state.checkpoint_dirty = true;

        Ok(())
    }

    async fn flush(&mut self, force: bool) -> usize {
        self.flusher.flush(&mut self.state.pending, force).await
    }

    async fn save_checkpoint_if_needed(&mut self) {
        if !self.state.checkpoint_dirty || self.state.last_save.elapsed() < self.save_interval {
            return;
        }

        // A failed attempt also resets the interval, so a failing store is retried at most once
        // per interval.
        self.state.last_save = Instant::now();

        match self.flusher.checkpoint().save().await {
            Ok(()) => {
                self.state.checkpoint_dirty = false;
                counter!(ETL_CHECKPOINT_SAVES_TOTAL).increment(1);
                debug!("checkpoint saved");
            }
            Err(err) => {
                counter!(
                    ETL_CHECKPOINT_SAVE_FAILURES_TOTAL,
                    ERROR_KIND_LABEL => format!("{:?}", err.kind()),
                )
                .increment(1);
                error!(error = %err, "failed to save checkpoint, it will be retried");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::pending::PendingCounter;
    use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel, request_shutdown};
    use crate::index::memory::MemoryIndex;
    use crate::replication::flush::DEFAULT_MAX_BATCH_SIZE;
    use crate::test_utils::checkpoint::TestCheckpointStore;
    use crate::test_utils::fixtures::user_upserts;
    use crate::test_utils::index::TestIndexWrapper;
    use tokio::task::JoinHandle;

    type TestIndex = TestIndexWrapper<MemoryIndex>;

    struct TestLoop {
        index: TestIndex,
        checkpoint: TestCheckpointStore,
        events_tx: mpsc::Sender<SyncEvent>,
        shutdown_tx: ShutdownTx,
        sync_loop: SyncLoop<TestIndex, TestCheckpointStore>,
    }

    fn test_loop() -> TestLoop {
        let index = TestIndexWrapper::wrap(MemoryIndex::new());
        let checkpoint = TestCheckpointStore::new();
        let (events_tx, events_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        let flusher = BatchFlusher::new(
            index.clone(),
            checkpoint.clone(),
            PendingCounter::new(),
            DEFAULT_MAX_BATCH_SIZE,
        );
        let sync_loop = SyncLoop::new(
            flusher,
            events_rx,
            shutdown_rx,
            DEFAULT_FLUSH_INTERVAL,
            DEFAULT_SAVE_INTERVAL,
        );

        TestLoop {
            index,
            checkpoint,
            events_tx,
            shutdown_tx,
            sync_loop,
        }
    }

    fn spawn(sync_loop: SyncLoop<TestIndex, TestCheckpointStore>) -> JoinHandle<EtlResult<()>> {
        tokio::spawn(sync_loop.run())
    }

    #[tokio::test(start_paused = true)]
    async fn partial_batch_is_flushed_by_the_timer() {
        let test_loop = test_loop();
        let started = Instant::now();
        let handle = spawn(test_loop.sync_loop);

        let submitted = test_loop.index.wait_for_operations(3).await;
        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(0, 3)))
            .await
            .unwrap();
        submitted.notified().await;

        assert!(started.elapsed() >= DEFAULT_FLUSH_INTERVAL);
        assert_eq!(test_loop.index.chunk_sizes().await, vec![3]);

        request_shutdown(&test_loop.shutdown_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn full_batch_is_flushed_without_waiting_for_the_timer() {
        let test_loop = test_loop();
        let started = Instant::now();
        let handle = spawn(test_loop.sync_loop);

        let submitted = test_loop.index.wait_for_operations(100).await;
        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(0, 60)))
            .await
            .unwrap();
        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(60, 40)))
            .await
            .unwrap();
        submitted.notified().await;

        assert!(started.elapsed() < DEFAULT_FLUSH_INTERVAL);
        assert_eq!(test_loop.index.operations().await, user_upserts(0, 100));

        request_shutdown(&test_loop.shutdown_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn position_flushes_and_save_is_rate_limited() {
        let test_loop = test_loop();
        let started = Instant::now();
        let handle = spawn(test_loop.sync_loop);

        let submitted = test_loop.index.wait_for_operations(3).await;
        let saved = test_loop.checkpoint.wait_for_save_attempts(1).await;
        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(0, 3)))
            .await
            .unwrap();
        test_loop
            .events_tx
            .send(SyncEvent::Position(Position::new("log.1", 42)))
            .await
            .unwrap();

        submitted.notified().await;
        assert!(started.elapsed() < DEFAULT_FLUSH_INTERVAL);
        assert_eq!(
            test_loop.checkpoint.current_position().await.unwrap(),
            Position::new("log.1", 42)
        );

        saved.notified().await;
        assert!(started.elapsed() >= DEFAULT_SAVE_INTERVAL);
        assert_eq!(
            test_loop.checkpoint.store().saved_position().await,
            Some(Position::new("log.1", 42))
        );

        // Nothing moved since, so no further save happens.
        tokio::time::sleep(DEFAULT_SAVE_INTERVAL * 3).await;
        assert_eq!(test_loop.checkpoint.save_attempts().await, 1);

        request_shutdown(&test_loop.shutdown_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_is_retried_after_the_interval() {
        let test_loop = test_loop();
        test_loop.checkpoint.fail_next_saves(1).await;
        let started = Instant::now();
        let handle = spawn(test_loop.sync_loop);

        let retried = test_loop.checkpoint.wait_for_save_attempts(2).await;
        test_loop
            .events_tx
            .send(SyncEvent::Position(Position::new("log.1", 7)))
            .await
            .unwrap();
        retried.notified().await;

        assert!(started.elapsed() >= DEFAULT_SAVE_INTERVAL * 2);
        assert_eq!(
            test_loop.checkpoint.store().saved_position().await,
            Some(Position::new("log.1", 7))
        );

        request_shutdown(&test_loop.shutdown_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_buffer_and_abandons_queued_events() {
        let test_loop = test_loop();
        let handle = spawn(test_loop.sync_loop);

        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(0, 3)))
            .await
            .unwrap();
        // Let the loop consume the event without reaching the first timer tick.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(test_loop.index.chunks().await.is_empty());

        request_shutdown(&test_loop.shutdown_tx);
        handle.await.unwrap().unwrap();

        assert_eq!(test_loop.index.operations().await, user_upserts(0, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_takes_priority_over_queued_events() {
        let test_loop = test_loop();
        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(0, 100)))
            .await
            .unwrap();
        test_loop
            .events_tx
            .send(SyncEvent::Position(Position::new("log.1", 1)))
            .await
            .unwrap();
        request_shutdown(&test_loop.shutdown_tx);

        // Both events are still queued when shutdown is handled and are reported as abandoned.
        assert_eq!(test_loop.sync_loop.events_rx.len(), 2);

        spawn(test_loop.sync_loop).await.unwrap().unwrap();

        assert!(test_loop.index.chunks().await.is_empty());
        assert_eq!(
            test_loop.checkpoint.current_position().await.unwrap(),
            Position::default()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_producer_flushes_and_stops() {
        let test_loop = test_loop();
        let handle = spawn(test_loop.sync_loop);

        test_loop
            .events_tx
            .send(SyncEvent::Operations(user_upserts(0, 5)))
            .await
            .unwrap();
        drop(test_loop.events_tx);

        handle.await.unwrap().unwrap();

        assert_eq!(test_loop.index.operations().await, user_upserts(0, 5));
    }
}
