use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::Cell;

/// Field name to value mapping written to the index.
pub type Document = BTreeMap<String, Cell>;

/// Mutation applied to one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "document", rename_all = "snake_case")]
pub enum DocumentAction {
    /// Creates or fully replaces the document.
    Upsert(Document),
    /// Removes the document.
    Delete,
}

/// One unit of index mutation targeting a single document id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOperation {
    /// Target index.
    pub index: String,
    /// Target document type or collection.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Document id, derived from the row's primary key. Never empty.
    pub id: String,
    /// Mutation to apply.
    #[serde(flatten)]
    pub action: DocumentAction,
}

impl DocumentOperation {
    /// Returns `true` for delete operations.
    pub fn is_delete(&self) -> bool {
        matches!(self.action, DocumentAction::Delete)
    }

    /// Returns the upserted document, `None` for deletes.
    pub fn document(&self) -> Option<&Document> {
        match &self.action {
            DocumentAction::Upsert(document) => Some(document),
            DocumentAction::Delete => None,
        }
    }
}
