//! Synchronization core of a change-data-capture pipeline feeding a search index.
//!
//! Row changes are turned into document operations by [`conversions::document`], pushed to a
//! single sync loop through [`replication::producer::SyncEventSender`], batched and submitted to an
//! [`index::IndexClient`] by [`replication::flush::BatchFlusher`], while replication progress is
//! tracked in a [`checkpoint::CheckpointStore`].

pub mod checkpoint;
pub mod concurrency;
pub mod conversions;
pub mod error;
pub mod index;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod replication;
pub mod rule;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
