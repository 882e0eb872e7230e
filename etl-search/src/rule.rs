//! Table to index mapping rules.
//!
//! A [`Rule`] is built once from configuration before replication starts and then shared read-only
//! by every operation build for its table.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use etl_config::shared::RuleConfig;

use crate::bail;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::types::TableName;

/// A source column and its position in row values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub position: usize,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Maps one source table onto one index and document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    table: TableName,
    index: String,
    type_name: String,
    columns: Vec<ColumnSchema>,
    primary_key: Vec<usize>,
    field_mapping: BTreeMap<String, String>,
}

impl Rule {
    /// Creates a validated rule.
    ///
    /// `columns` must be in row value order. Exactly one primary key position is accepted,
    /// composite keys are rejected with [`ErrorKind::InvalidRule`].
    pub fn new(
        table: TableName,
        index: impl Into<String>,
        type_name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: Vec<usize>,
        field_mapping: BTreeMap<String, String>,
    ) -> EtlResult<Self> {
        let index = index.into();
        let type_name = type_name.into();

        if index.is_empty() {
            bail!(ErrorKind::InvalidRule, "Rule has an empty index name", table);
        }

        if columns.is_empty() {
            bail!(ErrorKind::InvalidRule, "Rule has no columns", table);
        }

        for (expected, column) in columns.iter().enumerate() {
            if column.position != expected {
                bail!(
                    ErrorKind::InvalidRule,
                    "Rule columns are not in row order",
                    format!(
                        "column `{}` of {table} has position {} but is listed at {expected}",
                        column.name, column.position
                    )
                );
            }
        }

        match primary_key.as_slice() {
            [position] if *position < columns.len() => {}
            [position] => bail!(
                ErrorKind::InvalidRule,
                "Primary key position is out of range",
                format!(
                    "{table} has {} columns, primary key position is {position}",
                    columns.len()
                )
            ),
            [] => bail!(ErrorKind::InvalidRule, "Rule has no primary key", table),
            _ => bail!(
                ErrorKind::InvalidRule,
                "Only single column primary keys are supported",
                format!("{table} has {} primary key columns", primary_key.len())
            ),
        }

        Ok(Self {
            table,
            index,
            type_name,
            columns,
            primary_key,
            field_mapping,
        })
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the columns in row value order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Returns the number of values every row for this rule must carry.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the position of the primary key column.
    pub fn primary_key_position(&self) -> usize {
        // `Rule::new` guarantees exactly one primary key position.
        self.primary_key[0]
    }

    /// Returns the document field name for `column`, applying the field mapping.
    pub fn field_name<'a>(&'a self, column: &'a ColumnSchema) -> &'a str {
        self.field_mapping
            .get(&column.name)
            .map(String::as_str)
            .unwrap_or(&column.name)
    }
}

impl TryFrom<&RuleConfig> for Rule {
    type Error = EtlError;

    fn try_from(config: &RuleConfig) -> Result<Self, Self::Error> {
        config.validate()?;

        let columns = config
            .columns
            .iter()
            .enumerate()
            .map(|(position, name)| ColumnSchema::new(name.clone(), position))
            .collect::<Vec<_>>();

        let primary_key = config
            .primary_key
            .iter()
            .filter_map(|name| config.columns.iter().position(|column| column == name))
            .collect();

        Rule::new(
            TableName::new(config.schema.clone(), config.table.clone()),
            config.index_name(),
            config.type_name(),
            columns,
            primary_key,
            config.field_mapping.clone(),
        )
    }
}

/// Rules indexed by source table.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    rules: HashMap<TableName, Arc<Rule>>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds rules from configuration, failing on the first invalid or duplicated rule.
    pub fn from_configs(configs: &[RuleConfig]) -> EtlResult<Self> {
        let mut rules = Self::new();
        for config in configs {
            rules.insert(Rule::try_from(config)?)?;
        }

        Ok(rules)
    }

    /// Adds a rule. A second rule for the same table is rejected.
    pub fn insert(&mut self, rule: Rule) -> EtlResult<Arc<Rule>> {
        if self.rules.contains_key(rule.table()) {
            bail!(
                ErrorKind::InvalidRule,
                "Duplicate rule for table",
                rule.table()
            );
        }

        let rule = Arc::new(rule);
        self.rules.insert(rule.table().clone(), rule.clone());

        Ok(rule)
    }

    /// Returns the rule for `table`, if the table is replicated.
    pub fn get(&self, table: &TableName) -> Option<&Arc<Rule>> {
        self.rules.get(table)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<ColumnSchema> {
        names
            .iter()
            .enumerate()
            .map(|(position, name)| ColumnSchema::new(*name, position))
            .collect()
    }

    #[test]
    fn rejects_composite_primary_key() {
        let err = Rule::new(
            TableName::new("app", "users"),
            "users",
            "user",
            columns(&["id", "tenant"]),
            vec![0, 1],
            BTreeMap::new(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRule);
    }

    #[test]
    fn rejects_out_of_range_primary_key() {
        let err = Rule::new(
            TableName::new("app", "users"),
            "users",
            "user",
            columns(&["id"]),
            vec![3],
            BTreeMap::new(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRule);
    }

    #[test]
    fn field_name_applies_mapping() {
        let rule = Rule::new(
            TableName::new("app", "users"),
            "users",
            "user",
            columns(&["id", "email"]),
            vec![0],
            BTreeMap::from([("email".to_string(), "contact".to_string())]),
        )
        .unwrap();

        assert_eq!(rule.field_name(&rule.columns()[0]), "id");
        assert_eq!(rule.field_name(&rule.columns()[1]), "contact");
    }

    #[test]
    fn builds_rules_from_config() {
        let config = RuleConfig {
            schema: "app".to_string(),
            table: "Orders".to_string(),
            index: None,
            type_name: Some("Order".to_string()),
            columns: vec!["total".to_string(), "order_id".to_string()],
            primary_key: vec!["order_id".to_string()],
            field_mapping: BTreeMap::new(),
        };

        let rules = Rules::from_configs(&[config.clone()]).unwrap();
        let rule = rules.get(&TableName::new("app", "Orders")).unwrap();

        assert_eq!(rule.index(), "orders");
        assert_eq!(rule.type_name(), "order");
        assert_eq!(rule.primary_key_position(), 1);

        let err = Rules::from_configs(&[config.clone(), config]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRule);
    }

    #[test]
    fn invalid_config_maps_to_config_error() {
        let config = RuleConfig {
            schema: "app".to_string(),
            table: "orders".to_string(),
            index: None,
            type_name: None,
            columns: vec!["id".to_string()],
            primary_key: vec![],
            field_mapping: BTreeMap::new(),
        };

        let err = Rule::try_from(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }
}
