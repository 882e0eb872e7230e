//! Tracing setup shared by binaries and tests embedding the sync core.

pub mod tracing;
