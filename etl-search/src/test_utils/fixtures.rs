use std::collections::BTreeMap;

use etl_config::shared::RuleConfig;

use crate::rule::{ColumnSchema, Rule};
use crate::types::{Cell, Document, DocumentAction, DocumentOperation, TableName, TableRow};

/// Table name of the `users` fixture.
pub fn users_table() -> TableName {
    TableName::new("app", "users")
}

/// Rule mapping `app.users (id, name, email)` onto index `users`, type `user`, keyed by `id`.
pub fn users_rule() -> Rule {
    Rule::new(
        users_table(),
        "users",
        "user",
        vec![
            ColumnSchema::new("id", 0),
            ColumnSchema::new("name", 1),
            ColumnSchema::new("email", 2),
        ],
        vec![0],
        BTreeMap::new(),
    )
    .expect("users fixture rule is valid")
}

/// Configuration equivalent to [`users_rule`].
pub fn users_rule_config() -> RuleConfig {
    RuleConfig {
        schema: "app".to_string(),
        table: "users".to_string(),
        index: Some("users".to_string()),
        type_name: Some("user".to_string()),
        columns: vec!["id".to_string(), "name".to_string(), "email".to_string()],
        primary_key: vec!["id".to_string()],
        field_mapping: BTreeMap::new(),
    }
}

/// Builds a `users` row.
pub fn users_row(id: impl Into<Cell>, name: impl Into<Cell>, email: impl Into<Cell>) -> TableRow {
    TableRow::new(vec![id.into(), name.into(), email.into()])
}

/// Builds an upsert of a `users` document with the given id.
pub fn user_upsert(id: usize) -> DocumentOperation {
    let document = Document::from([("id".to_string(), Cell::from(id as u64))]);

    DocumentOperation {
        index: "users".to_string(),
        type_name: "user".to_string(),
        id: id.to_string(),
        action: DocumentAction::Upsert(document),
    }
}

/// Builds upserts for ids `start..start + count`.
pub fn user_upserts(start: usize, count: usize) -> Vec<DocumentOperation> {
    (start..start + count).map(user_upsert).collect()
}
