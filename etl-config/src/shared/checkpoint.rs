use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::shared::ValidationError;

/// Checkpoint persistence configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Minimum time, in milliseconds, between two checkpoint saves.
    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: u64,
    /// Directory holding the checkpoint file, when a file-backed store is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl CheckpointConfig {
    /// Default minimum interval between saves: 1 second.
    pub const DEFAULT_SAVE_INTERVAL_MS: u64 = 1_000;

    /// Validates checkpoint configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.save_interval_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "checkpoint.save_interval_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            save_interval_ms: default_save_interval_ms(),
            data_dir: None,
        }
    }
}

fn default_save_interval_ms() -> u64 {
    CheckpointConfig::DEFAULT_SAVE_INTERVAL_MS
}
