use std::fmt;

use crate::types::{DocumentOperation, Position};

/// Kind of row change delivered by the replication decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Delete,
    /// Rows come in `(before, after)` pairs.
    Update,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => f.write_str("insert"),
            ChangeKind::Delete => f.write_str("delete"),
            ChangeKind::Update => f.write_str("update"),
        }
    }
}

/// Message consumed by the sync loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Operations built from one row change, in the order they must be applied.
    Operations(Vec<DocumentOperation>),
    /// Every operation up to this position has been enqueued.
    Position(Position),
}
