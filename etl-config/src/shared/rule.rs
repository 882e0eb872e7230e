use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::ValidationError;

/// Maps one source table onto one index and document type.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RuleConfig {
    /// Schema (database) of the source table.
    pub schema: String,
    /// Name of the source table.
    pub table: String,
    /// Target index. Defaults to the table name.
    #[serde(default)]
    pub index: Option<String>,
    /// Target document type or collection. Defaults to the index name.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    /// Source columns, in the order in which row values are delivered.
    pub columns: Vec<String>,
    /// Primary key columns. Exactly one is supported.
    pub primary_key: Vec<String>,
    /// Optional renaming of source columns to document field names.
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,
}

impl RuleConfig {
    /// Returns `schema.table`, the identity used to look rules up.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Returns the index name, lowercased, falling back to the table name.
    pub fn index_name(&self) -> String {
        self.index
            .as_deref()
            .unwrap_or(&self.table)
            .to_lowercase()
    }

    /// Returns the document type name, lowercased, falling back to the index name.
    pub fn type_name(&self) -> String {
        match self.type_name.as_deref() {
            Some(type_name) => type_name.to_lowercase(),
            None => self.index_name(),
        }
    }

    /// Validates the rule against its own column list.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let table = self.qualified_table();

        if self.table.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "rules.table".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }

        if self.columns.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: format!("rules[{table}].columns"),
                constraint: "must contain at least one column".to_string(),
            });
        }

        match self.primary_key.len() {
            0 => return Err(ValidationError::MissingPrimaryKey { table }),
            1 => {}
            count => return Err(ValidationError::CompositePrimaryKey { table, count }),
        }

        let referenced = self
            .primary_key
            .iter()
            .chain(self.field_mapping.keys());
        for column in referenced {
            if !self.columns.contains(column) {
                return Err(ValidationError::UnknownColumn {
                    table,
                    column: column.clone(),
                });
            }
        }

        Ok(())
    }
}
