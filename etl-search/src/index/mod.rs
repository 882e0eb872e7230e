//! Index store abstractions.
//!
//! The [`IndexClient`] trait is the boundary to the search index: it receives bounded chunks of
//! document operations from the flusher. [`memory::MemoryIndex`] is an in-process implementation.

mod base;
pub mod memory;

pub use base::{BulkItemResult, BulkResponse, IndexClient};
