use std::future::Future;

use crate::error::EtlResult;
use crate::types::Position;

/// Storage for the replication checkpoint.
///
/// Position updates are issued by the sync loop only. Reads may come from any task, for example
/// [`crate::replication::wait::wait_for_position`], so implementations must be safe to share.
pub trait CheckpointStore {
    /// Replaces the in-memory position. Does not persist it.
    fn update_position(&self, position: Position) -> impl Future<Output = EtlResult<()>> + Send;

    /// Durably persists the current in-memory position.
    fn save(&self) -> impl Future<Output = EtlResult<()>> + Send;

    /// Returns the current in-memory position.
    fn current_position(&self) -> impl Future<Output = EtlResult<Position>> + Send;
}
