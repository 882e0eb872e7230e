//! Concurrency primitives shared by the sync loop and its producers.
//!
//! The sync loop is the single owner of the pending buffer and the checkpoint dirty flag. Other
//! tasks only talk to it through the bounded event channel, the [`shutdown`] signal, and the
//! diagnostic [`pending::PendingCounter`].

pub mod pending;
pub mod shutdown;
