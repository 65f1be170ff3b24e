//! Cell/Row model
//!
//! Immutable value types shared by every other subsystem:
//! - `TableName` - validated table identity
//! - `RowKey` - opaque, byte-ordered row identity
//! - `Column` - (family, qualifier) pair
//! - `Cell` - value + timestamp + sequence id (+ visibility expression)
//! - `PutColumn` - a cell to be written
//! - `RowResult` - a row key with cells in canonical order
//!
//! No type here performs I/O or holds locks.

mod cell;
mod column;
mod errors;
mod row;
mod row_key;
mod table;

pub use cell::{Cell, PutColumn};
pub use column::Column;
pub use errors::{ModelError, ModelResult};
pub use row::RowResult;
pub use row_key::RowKey;
pub use table::TableName;

pub(crate) use row_key::escape_binary;
