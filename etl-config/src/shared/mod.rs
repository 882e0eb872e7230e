//! Shared configuration types for sync pipelines.

mod base;
mod batch;
mod checkpoint;
mod rule;
mod sync;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use checkpoint::CheckpointConfig;
pub use rule::RuleConfig;
pub use sync::SyncConfig;
