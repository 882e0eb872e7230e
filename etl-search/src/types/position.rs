use serde::{Deserialize, Serialize};
use std::fmt;

/// Replication progress marker.
///
/// Positions are ordered by source name first and offset second, so a rotation to a newer
/// source (for example the next log file) always compares greater than any offset of the
/// previous one as long as source names sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Name of the replication source, such as a log file.
    pub name: String,
    /// Offset inside the source.
    pub offset: u64,
}

impl Position {
    pub fn new(name: impl Into<String>, offset: u64) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.name, self.offset)
    }
}
