//! Core data types flowing through the sync pipeline.

mod cell;
mod document;
mod event;
mod position;
mod table_row;

pub use cell::Cell;
pub use document::{Document, DocumentAction, DocumentOperation};
pub use event::{ChangeKind, SyncEvent};
pub use position::Position;
pub use table_row::{TableName, TableRow};
