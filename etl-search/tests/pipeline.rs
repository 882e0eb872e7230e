#![cfg(feature = "test-utils")]

use etl_config::shared::{BatchConfig, CheckpointConfig, SyncConfig};
use etl_search::checkpoint::CheckpointStore;
use etl_search::checkpoint::file::FileCheckpointStore;
use etl_search::checkpoint::memory::MemoryCheckpointStore;
use etl_search::error::ErrorKind;
use etl_search::index::memory::MemoryIndex;
use etl_search::pipeline::SyncPipeline;
use etl_search::test_utils::fixtures::{users_row, users_rule_config, users_table};
use etl_search::test_utils::index::TestIndexWrapper;
use etl_search::types::{Cell, ChangeKind, Position, TableName};
use etl_telemetry::tracing::init_test_tracing;
use std::path::Path;
use std::time::Duration;

fn sync_config(flush_interval_ms: u64, save_interval_ms: u64) -> SyncConfig {
    SyncConfig {
        batch: BatchConfig {
            max_size: 100,
            flush_interval_ms,
        },
        checkpoint: CheckpointConfig {
            save_interval_ms,
            data_dir: None,
        },
        channel_capacity: 64,
        rules: vec![users_rule_config()],
    }
}

async fn wait_for_persisted_position(data_dir: &Path, target: &Position) {
    for _ in 0..250 {
        let store = FileCheckpointStore::open(data_dir, Position::default())
            .await
            .unwrap();
        if store.current_position().await.unwrap() >= *target {
            return;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    panic!("checkpoint {target} was never persisted");
}

#[tokio::test(flavor = "multi_thread")]
async fn row_changes_are_applied_to_the_index() {
    init_test_tracing();

    let index = MemoryIndex::new();
    let mut pipeline =
        SyncPipeline::new(sync_config(20, 1_000), index.clone(), MemoryCheckpointStore::new())
            .unwrap();
    let sender = pipeline.start().unwrap();
    let rules = pipeline.rules().clone();
    let table = users_table();

    sender
        .sync_table_rows(
            &rules,
            &table,
            ChangeKind::Insert,
            vec![users_row(1, "a", None::<&str>), users_row(2, "b", "b@x")],
        )
        .await
        .unwrap();
    sender
        .sync_table_rows(
            &rules,
            &table,
            ChangeKind::Update,
            vec![users_row(1, "a", None::<&str>), users_row(10, "a", "a@x")],
        )
        .await
        .unwrap();
    sender
        .sync_table_rows(
            &rules,
            &table,
            ChangeKind::Delete,
            vec![users_row(2, "b", "b@x")],
        )
        .await
        .unwrap();
    sender
        .send_position(Position::new("log.000001", 320))
        .await
        .unwrap();

    let reached = pipeline
        .wait_for_position(&Position::new("log.000001", 320), 5)
        .await
        .unwrap();
    assert!(reached);

    // The position marker forces a flush of everything enqueued before it.
    let documents = index.documents().await;
    assert_eq!(documents.len(), 1);
    let document = index.document("users", "user", "10").await.unwrap();
    assert_eq!(document.get("name"), Some(&Cell::from("a")));
    assert_eq!(document.get("email"), Some(&Cell::from("a@x")));
    assert_eq!(pipeline.pending_operations(), 0);

    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn rows_of_unmapped_tables_are_skipped() {
    init_test_tracing();

    let index = MemoryIndex::new();
    let mut pipeline =
        SyncPipeline::new(sync_config(20, 1_000), index.clone(), MemoryCheckpointStore::new())
            .unwrap();
    let sender = pipeline.start().unwrap();

    let count = sender
        .sync_table_rows(
            pipeline.rules(),
            &TableName::new("app", "audit_log"),
            ChangeKind::Insert,
            vec![users_row(1, "a", "x")],
        )
        .await
        .unwrap();
    assert_eq!(count, 0);

    pipeline.shutdown_and_wait().await.unwrap();
    assert!(index.requests().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_chunk_does_not_stop_replication() {
    init_test_tracing();

    let memory_index = MemoryIndex::new();
    let index = TestIndexWrapper::wrap(memory_index.clone());
    index.fail_chunks([0]).await;

    let mut pipeline =
        SyncPipeline::new(sync_config(20, 1_000), index.clone(), MemoryCheckpointStore::new())
            .unwrap();
    let sender = pipeline.start().unwrap();
    let rule = pipeline.rules().get(&users_table()).unwrap().clone();

    let first_chunk = index.wait_for_operations(1).await;
    sender
        .sync_rows(&rule, ChangeKind::Insert, vec![users_row(1, "a", "x")])
        .await
        .unwrap();
    first_chunk.notified().await;

    let second_chunk = index.wait_for_operations(2).await;
    sender
        .sync_rows(&rule, ChangeKind::Insert, vec![users_row(2, "b", "y")])
        .await
        .unwrap();
    second_chunk.notified().await;

    pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(index.chunk_sizes().await, vec![1, 1]);
    assert!(memory_index.document("users", "user", "1").await.is_none());
    assert!(memory_index.document("users", "user", "2").await.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn checkpoint_is_persisted_and_reloaded() {
    init_test_tracing();

    let data_dir = tempfile::tempdir().unwrap();
    let checkpoint = FileCheckpointStore::open(data_dir.path(), Position::new("log.000001", 4))
        .await
        .unwrap();

    let mut pipeline =
        SyncPipeline::new(sync_config(10, 10), MemoryIndex::new(), checkpoint).unwrap();
    let sender = pipeline.start().unwrap();
    let rule = pipeline.rules().get(&users_table()).unwrap().clone();

    sender
        .sync_rows(&rule, ChangeKind::Insert, vec![users_row(1, "a", "x")])
        .await
        .unwrap();
    sender
        .send_position(Position::new("log.000002", 96))
        .await
        .unwrap();

    wait_for_persisted_position(data_dir.path(), &Position::new("log.000002", 96)).await;

    pipeline.shutdown_and_wait().await.unwrap();

    let reopened = FileCheckpointStore::open(data_dir.path(), Position::default())
        .await
        .unwrap();
    assert_eq!(
        reopened.current_position().await.unwrap(),
        Position::new("log.000002", 96)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn build_errors_are_returned_to_the_producer() {
    init_test_tracing();

    let index = MemoryIndex::new();
    let mut pipeline =
        SyncPipeline::new(sync_config(20, 1_000), index.clone(), MemoryCheckpointStore::new())
            .unwrap();
    let sender = pipeline.start().unwrap();
    let rule = pipeline.rules().get(&users_table()).unwrap().clone();

    let err = sender
        .sync_rows(
            &rule,
            ChangeKind::Update,
            vec![users_row(1, "a", "x"), users_row(2, "b", "y"), users_row(3, "c", "z")],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedUpdate);

    let err = sender
        .sync_rows(&rule, ChangeKind::Insert, vec![vec![Cell::from(1)].into()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert_eq!(pipeline.pending_operations(), 0);

    pipeline.shutdown_and_wait().await.unwrap();
    assert!(index.requests().await.is_empty());

    assert!(sender.is_closed());
    let err = sender
        .send_position(Position::new("log.000001", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyncWorkerStopped);
}
