//! Replication side of the sync core.
//!
//! Producers turn row changes into [`crate::types::SyncEvent`]s with [`producer::SyncEventSender`].
//! The single [`sync_loop::SyncLoop`] consumes them, batches operations, submits them through
//! [`flush::BatchFlusher`] and persists the checkpoint. [`wait::wait_for_position`] lets callers
//! block until a given position has been checkpointed in memory.

pub mod flush;
pub mod producer;
pub mod sync_loop;
pub mod wait;
