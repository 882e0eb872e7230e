use tokio::sync::mpsc;
use tracing::debug;

use crate::bail;
use crate::concurrency::pending::PendingCounter;
use crate::conversions::document::build_operations;
use crate::error::{ErrorKind, EtlResult};
use crate::rule::{Rule, Rules};
use crate::types::{ChangeKind, Position, SyncEvent, TableName, TableRow};

/// Producer side of the sync loop's event channel.
///
/// Cloning is cheap, every clone feeds the same loop. Sends wait while the channel is full, which is
/// the only backpressure producers get.
#[derive(Debug, Clone)]
pub struct SyncEventSender {
    events_tx: mpsc::Sender<SyncEvent>,
    pending: PendingCounter,
}

impl SyncEventSender {
    pub fn new(events_tx: mpsc::Sender<SyncEvent>, pending: PendingCounter) -> Self {
        Self { events_tx, pending }
    }

    /// Builds the operations for a row change and enqueues them as one batch.
    ///
    /// Returns the number of enqueued operations. When building fails, nothing is enqueued, the
    /// pending counter is left untouched and the build error is returned.
    pub async fn sync_rows(
        &self,
        rule: &Rule,
        kind: ChangeKind,
        rows: Vec<TableRow>,
    ) -> EtlResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let operations = build_operations(rule, kind, rows)?;
        let count = operations.len();

        self.pending.add(count);
        if self
            .events_tx
            .send(SyncEvent::Operations(operations))
            .await
            .is_err()
        {
            self.pending.sub(count);
            bail!(
                ErrorKind::SyncWorkerStopped,
                "Sync loop is not running, operations were not enqueued",
                rule.table()
            );
        }

        debug!(table = %rule.table(), %kind, operations = count, "enqueued operations");

        Ok(count)
    }

    /// Like [`SyncEventSender::sync_rows`], looking the rule up by table.
    ///
    /// Rows of tables without a rule are skipped.
    pub async fn sync_table_rows(
        &self,
        rules: &Rules,
        table: &TableName,
        kind: ChangeKind,
        rows: Vec<TableRow>,
    ) -> EtlResult<usize> {
        let Some(rule) = rules.get(table) else {
            debug!(%table, %kind, rows = rows.len(), "no rule for table, skipping rows");
            return Ok(0);
        };

        self.sync_rows(rule, kind, rows).await
    }

    /// Enqueues a position marker: every batch enqueued before it is covered by `position`.
    pub async fn send_position(&self, position: Position) -> EtlResult<()> {
        if self
            .events_tx
            .send(SyncEvent::Position(position))
            .await
            .is_err()
        {
            bail!(
                ErrorKind::SyncWorkerStopped,
                "Sync loop is not running, position was not enqueued"
            );
        }

        Ok(())
    }

    /// Returns the number of operations produced but not yet flushed.
    pub fn pending_operations(&self) -> i64 {
        self.pending.get()
    }

    /// Returns `true` once the sync loop is gone.
    pub fn is_closed(&self) -> bool {
        self.events_tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{users_rule, users_row, users_table};
    use crate::types::{Cell, DocumentAction};

    fn sender(capacity: usize) -> (SyncEventSender, mpsc::Receiver<SyncEvent>, PendingCounter) {
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let pending = PendingCounter::new();

        (
            SyncEventSender::new(events_tx, pending.clone()),
            events_rx,
            pending,
        )
    }

    #[tokio::test]
    async fn enqueues_built_operations_as_one_batch() {
        let (sender, mut events_rx, pending) = sender(4);
        let rule = users_rule();

        let count = sender
            .sync_rows(
                &rule,
                ChangeKind::Update,
                vec![users_row(1, "a", "x"), users_row(2, "a", "x")],
            )
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(pending.get(), 2);

        let Some(SyncEvent::Operations(operations)) = events_rx.recv().await else {
            panic!("expected an operations batch");
        };
        assert_eq!(operations[0].id, "1");
        assert_eq!(operations[0].action, DocumentAction::Delete);
        assert_eq!(operations[1].id, "2");
        assert_eq!(
            operations[1].document().unwrap().get("email"),
            Some(&Cell::from("x"))
        );
    }

    #[tokio::test]
    async fn build_failure_forwards_nothing() {
        let (sender, mut events_rx, pending) = sender(4);
        let rule = users_rule();

        let err = sender
            .sync_rows(
                &rule,
                ChangeKind::Insert,
                vec![users_row(1, "a", "x"), users_row(None::<i64>, "b", "y")],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert_eq!(pending.get(), 0);
        assert!(events_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn tables_without_rule_are_skipped() {
        let (sender, mut events_rx, _pending) = sender(4);
        let rules = Rules::new();

        let count = sender
            .sync_table_rows(
                &rules,
                &users_table(),
                ChangeKind::Insert,
                vec![users_row(1, "a", "x")],
            )
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert!(events_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stopped_loop_reverts_pending_counter() {
        let (sender, events_rx, pending) = sender(4);
        drop(events_rx);

        let err = sender
            .sync_rows(&users_rule(), ChangeKind::Delete, vec![users_row(1, "a", "x")])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SyncWorkerStopped);
        assert_eq!(pending.get(), 0);
        assert!(sender.is_closed());
        assert_eq!(
            sender
                .send_position(Position::new("log.1", 1))
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::SyncWorkerStopped
        );
    }
}
