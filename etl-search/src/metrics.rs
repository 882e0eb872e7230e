//! Metric names and labels recorded by the sync core.
//!
//! Nothing is exported from here: recording is a no-op until the embedding binary installs a
//! `metrics` recorder.

/// Label for the index client name in metrics.
pub const INDEX_CLIENT_LABEL: &str = "index_client";

/// Label for the error kind in metrics.
pub const ERROR_KIND_LABEL: &str = "error_kind";

// Index metrics

/// Counter for document operations handed to the index client, failed chunks included.
pub const ETL_INDEX_OPERATIONS_SUBMITTED_TOTAL: &str = "etl_index_operations_submitted_total";

/// Counter for bulk chunks whose submission failed.
pub const ETL_INDEX_CHUNK_FAILURES_TOTAL: &str = "etl_index_chunk_failures_total";

/// Histogram of the time spent submitting one bulk chunk.
pub const ETL_INDEX_CHUNK_SUBMIT_DURATION_SECONDS: &str =
    "etl_index_chunk_submit_duration_seconds";

/// Gauge for operations produced but not yet drained by a flush.
pub const ETL_PENDING_OPERATIONS: &str = "etl_pending_operations";

// Checkpoint metrics

/// Counter for successful checkpoint saves.
pub const ETL_CHECKPOINT_SAVES_TOTAL: &str = "etl_checkpoint_saves_total";

/// Counter for failed checkpoint saves.
pub const ETL_CHECKPOINT_SAVE_FAILURES_TOTAL: &str = "etl_checkpoint_save_failures_total";
