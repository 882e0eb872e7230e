//! Utilities for testing the sync core.
//!
//! - [`index`]: [`index::TestIndexWrapper`] records every bulk chunk and injects chunk failures.
//! - [`checkpoint`]: [`checkpoint::TestCheckpointStore`] counts save attempts and injects save
//!   failures.
//! - [`fixtures`]: a small `users` rule with row and operation helpers.
//! - [`notify`]: [`notify::TimedNotify`], a notification that fails the test instead of hanging.

pub mod checkpoint;
pub mod fixtures;
pub mod index;
pub mod notify;
