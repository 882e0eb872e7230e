use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::Config;
use crate::shared::{BatchConfig, CheckpointConfig, RuleConfig, ValidationError};

/// Top level configuration of a sync pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Batching of document operations.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Checkpoint persistence.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Capacity of the channel between producers and the sync loop.
    ///
    /// A full channel blocks producers.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Table to index rules.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl SyncConfig {
    /// Default capacity of the inbound event channel.
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

    /// Validates the whole configuration, including every rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.batch.validate()?;
        self.checkpoint.validate()?;

        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "channel_capacity".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        let mut tables = HashSet::with_capacity(self.rules.len());
        for rule in &self.rules {
            rule.validate()?;

            if !tables.insert(rule.qualified_table()) {
                return Err(ValidationError::DuplicateRule {
                    table: rule.qualified_table(),
                });
            }
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            checkpoint: CheckpointConfig::default(),
            channel_capacity: default_channel_capacity(),
            rules: Vec::new(),
        }
    }
}

impl Config for SyncConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

fn default_channel_capacity() -> usize {
    SyncConfig::DEFAULT_CHANNEL_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sync_loop_constants() {
        let config: SyncConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.batch.max_size, 100);
        assert_eq!(config.batch.flush_interval_ms, 200);
        assert_eq!(config.checkpoint.save_interval_ms, 1_000);
        assert_eq!(config.channel_capacity, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_rules() {
        let rule = RuleConfig {
            schema: "app".to_string(),
            table: "users".to_string(),
            index: None,
            type_name: None,
            columns: vec!["id".to_string()],
            primary_key: vec!["id".to_string()],
            field_mapping: Default::default(),
        };
        let config = SyncConfig {
            rules: vec![rule.clone(), rule],
            ..SyncConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateRule {
                table: "app.users".to_string()
            })
        );
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = SyncConfig::default();
        config.batch.max_size = 0;

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidFieldValue { field, .. }) if field == "batch.max_size"
        ));
    }
}
