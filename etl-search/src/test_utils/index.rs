use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::index::{BulkResponse, IndexClient};
use crate::test_utils::notify::TimedNotify;
use crate::types::DocumentOperation;

type ChunkCondition = Box<dyn Fn(&[Vec<DocumentOperation>]) -> bool + Send + Sync>;

struct Inner<I> {
    wrapped_index: I,
    chunks: Vec<Vec<DocumentOperation>>,
    failing_chunks: HashSet<usize>,
    conditions: Vec<(ChunkCondition, Arc<Notify>)>,
}

impl<I> Inner<I> {
    fn check_conditions(&mut self) {
        let chunks = &self.chunks;
        self.conditions.retain(|(condition, notify)| {
            let should_retain = !condition(chunks);
            if !should_retain {
                notify.notify_one();
            }
            should_retain
        });
    }
}

/// Test wrapper around an [`IndexClient`] that records every submitted chunk.
///
/// Chunks are numbered in submission order starting at 0. Chunks registered through
/// [`TestIndexWrapper::fail_chunks`] are recorded but fail without reaching the wrapped index.
#[derive(Clone)]
pub struct TestIndexWrapper<I> {
    inner: Arc<RwLock<Inner<I>>>,
}

impl<I> TestIndexWrapper<I> {
    pub fn wrap(index: I) -> Self {
        let inner = Inner {
            wrapped_index: index,
            chunks: Vec::new(),
            failing_chunks: HashSet::new(),
            conditions: Vec::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Makes the chunks with the given submission numbers fail.
    pub async fn fail_chunks(&self, chunk_numbers: impl IntoIterator<Item = usize>) {
        self.inner
            .write()
            .await
            .failing_chunks
            .extend(chunk_numbers);
    }

    /// Returns every submitted chunk, failed ones included.
    pub async fn chunks(&self) -> Vec<Vec<DocumentOperation>> {
        self.inner.read().await.chunks.clone()
    }

    /// Returns the size of every submitted chunk.
    pub async fn chunk_sizes(&self) -> Vec<usize> {
        self.inner.read().await.chunks.iter().map(Vec::len).collect()
    }

    /// Returns every submitted operation, in submission order.
    pub async fn operations(&self) -> Vec<DocumentOperation> {
        self.inner.read().await.chunks.concat()
    }

    /// Registers a notification fired once the submitted chunks satisfy `condition`.
    pub async fn notify_on_chunks<F>(&self, condition: F) -> TimedNotify
    where
        F: Fn(&[Vec<DocumentOperation>]) -> bool + Send + Sync + 'static,
    {
        let notify = Arc::new(Notify::new());
        let mut inner = self.inner.write().await;
        inner.conditions.push((Box::new(condition), notify.clone()));

        // The condition may already hold.
        inner.check_conditions();

        TimedNotify::new(notify)
    }

    /// Registers a notification fired once at least `count` operations were submitted.
    pub async fn wait_for_operations(&self, count: usize) -> TimedNotify {
        self.notify_on_chunks(move |chunks| chunks.iter().map(Vec::len).sum::<usize>() >= count)
            .await
    }
}

impl<I> IndexClient for TestIndexWrapper<I>
where
    I: IndexClient + Send + Sync,
{
    fn name() -> &'static str {
        I::name()
    }

    async fn submit(&self, operations: Vec<DocumentOperation>) -> EtlResult<BulkResponse> {
        let mut inner = self.inner.write().await;

        let chunk_number = inner.chunks.len();
        let result = if inner.failing_chunks.contains(&chunk_number) {
            Err(etl_error!(
                ErrorKind::IndexSubmissionFailed,
                "Injected bulk submission failure",
                format!("chunk {chunk_number}")
            ))
        } else {
            inner.wrapped_index.submit(operations.clone()).await
        };

        inner.chunks.push(operations);
        inner.check_conditions();

        result
    }
}
