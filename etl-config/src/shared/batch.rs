use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batching configuration for the sync loop.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Maximum number of document operations submitted in a single bulk request.
    ///
    /// The sync loop also flushes as soon as this many operations are pending.
    #[serde(default = "default_batch_max_size")]
    pub max_size: usize,
    /// Interval, in milliseconds, of the timer that force-flushes partially filled batches.
    #[serde(default = "default_batch_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl BatchConfig {
    /// Default maximum batch size.
    pub const DEFAULT_MAX_SIZE: usize = 100;

    /// Default flush interval in milliseconds.
    pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 200;

    /// Validates batch configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.flush_interval_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.flush_interval_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: default_batch_max_size(),
            flush_interval_ms: default_batch_flush_interval_ms(),
        }
    }
}

fn default_batch_max_size() -> usize {
    BatchConfig::DEFAULT_MAX_SIZE
}

fn default_batch_flush_interval_ms() -> u64 {
    BatchConfig::DEFAULT_FLUSH_INTERVAL_MS
}
