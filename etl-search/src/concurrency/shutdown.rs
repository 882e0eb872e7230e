//! Shutdown signaling for the sync worker.
//!
//! Shutdown is broadcast over a watch channel carrying no data, so every receiver subscribed before
//! the signal observes it.

use tokio::sync::watch;

/// Transmitter used to request shutdown.
pub type ShutdownTx = watch::Sender<()>;

/// Receiver awaited by workers, resolves through [`watch::Receiver::changed`].
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a new shutdown channel.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    watch::channel(())
}

/// Requests shutdown of every subscribed worker.
///
/// Returns `false` when no receiver is alive anymore.
pub fn request_shutdown(shutdown_tx: &ShutdownTx) -> bool {
    shutdown_tx.send(()).is_ok()
}
