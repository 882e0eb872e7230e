//! Background workers of the sync core.

pub mod sync;
