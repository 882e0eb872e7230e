//! Checkpoint storage.
//!
//! A [`CheckpointStore`] keeps the latest replication [`crate::types::Position`] in memory and
//! persists it on demand. The sync loop updates the in-memory position after every position marker
//! and calls [`CheckpointStore::save`] at most once per save interval.

mod base;
pub mod file;
pub mod memory;

pub use base::CheckpointStore;
