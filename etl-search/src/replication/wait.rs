use std::time::Duration;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::error::EtlResult;
use crate::types::Position;

/// Interval between two reads of the checkpoint position.
pub const POSITION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Waits until the checkpoint position reaches `target`.
///
/// The position is read right away and then once per [`POSITION_POLL_INTERVAL`], for a total of
/// `timeout_secs + 1` reads. Returns `Ok(true)` once `position >= target` and `Ok(false)` when the
/// timeout elapses first. A timeout is never an error, only failing reads are.
pub async fn wait_for_position<C>(
    store: &C,
    target: &Position,
    timeout_secs: u64,
) -> EtlResult<bool>
where
    C: CheckpointStore,
{
    let mut elapsed_secs = 0;

    loop {
        let position = store.current_position().await?;

        if position >= *target {
            info!(%position, %target, elapsed_secs, "checkpoint reached target position");
            return Ok(true);
        }

        if elapsed_secs >= timeout_secs {
            warn!(
                %position,
                %target,
                timeout_secs,
                "timed out waiting for checkpoint to reach target position"
            );
            return Ok(false);
        }

        tokio::time::sleep(POSITION_POLL_INTERVAL).await;
        elapsed_secs += 1;
    }
}
