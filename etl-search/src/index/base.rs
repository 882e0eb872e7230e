use std::future::Future;

use crate::error::EtlResult;
use crate::types::DocumentOperation;

/// Outcome of one operation inside a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    /// Document id the operation targeted.
    pub id: String,
    /// HTTP-like status code reported by the index.
    pub status: u16,
    /// Error reported by the index for this item, if any.
    pub error: Option<String>,
}

/// Summary of a bulk request, as returned by the index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkResponse {
    /// Time the index spent on the request, in milliseconds.
    pub took_ms: u64,
    /// Whether at least one item failed.
    pub errors: bool,
    /// Per-operation results, in request order.
    pub items: Vec<BulkItemResult>,
}

impl BulkResponse {
    /// Returns the items that the index reported as failed.
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| item.error.is_some())
    }
}

/// Client of the search index receiving bulk document operations.
///
/// Operations inside one call must be applied in the given order. The sync core never retries a
/// failed call: an error means the chunk's documents are lost for this pass, and an error inside
/// [`BulkResponse`] is only logged.
pub trait IndexClient {
    /// Returns the name of the index client, used in logs and metric labels.
    fn name() -> &'static str;

    /// Submits a bulk request.
    fn submit(
        &self,
        operations: Vec<DocumentOperation>,
    ) -> impl Future<Output = EtlResult<BulkResponse>> + Send;
}
