use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::EtlResult;
use crate::index::{BulkItemResult, BulkResponse, IndexClient};
use crate::types::{Document, DocumentAction, DocumentOperation};

/// Identity of a document inside the memory index: `(index, type, id)`.
pub type DocumentKey = (String, String, String);

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<DocumentKey, Document>,
    requests: Vec<Vec<DocumentOperation>>,
}

/// In-memory index for tests and local development.
///
/// Applies every operation in order, keeping the latest version of each document and the full
/// history of bulk requests it received.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all stored documents.
    pub async fn documents(&self) -> BTreeMap<DocumentKey, Document> {
        self.inner.lock().await.documents.clone()
    }

    /// Returns the stored document with the given identity.
    pub async fn document(&self, index: &str, type_name: &str, id: &str) -> Option<Document> {
        let key = (index.to_string(), type_name.to_string(), id.to_string());
        self.inner.lock().await.documents.get(&key).cloned()
    }

    /// Returns every bulk request received so far.
    pub async fn requests(&self) -> Vec<Vec<DocumentOperation>> {
        self.inner.lock().await.requests.clone()
    }
}

impl IndexClient for MemoryIndex {
    fn name() -> &'static str {
        "memory"
    }

    async fn submit(&self, operations: Vec<DocumentOperation>) -> EtlResult<BulkResponse> {
        let mut inner = self.inner.lock().await;

        debug!(operations = operations.len(), "applying bulk request");

        let mut items = Vec::with_capacity(operations.len());
        for operation in &operations {
            let key = (
                operation.index.clone(),
                operation.type_name.clone(),
                operation.id.clone(),
            );

            let status = match &operation.action {
                DocumentAction::Upsert(document) => {
                    match inner.documents.insert(key, document.clone()) {
                        Some(_) => 200,
                        None => 201,
                    }
                }
                DocumentAction::Delete => match inner.documents.remove(&key) {
                    Some(_) => 200,
                    None => 404,
                },
            };

            items.push(BulkItemResult {
                id: operation.id.clone(),
                status,
                error: None,
            });
        }

        inner.requests.push(operations);

        Ok(BulkResponse {
            took_ms: 0,
            errors: false,
            items,
        })
    }
}
