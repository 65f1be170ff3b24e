//! Row store
//!
//! The store is the sole owner of row and cell data. It provides:
//! - `RowStore` - ordered row map with per-row locking
//! - `ReadView` - sequence-number snapshot boundary used by scans
//! - `Delete` / `DeleteTarget` - row, column and label-qualified deletes
//! - `OpControl` / `CancellationToken` - cancellation and deadlines
//!
//! # Versioning
//!
//! Every write takes the next store-wide sequence id. A cell is identified
//! by (row, family, qualifier, timestamp); writing an existing identity
//! adds a newer entry to that cell's version chain, writing a new
//! timestamp creates a new version. Deletes are tombstones that hide older
//! entries; they never remove a row slot.

mod control;
mod errors;
mod read_view;
mod row;
mod row_store;

pub use control::{CancellationToken, OpControl};
pub use errors::{StoreError, StoreResult};
pub use read_view::ReadView;
pub use row_store::{Clock, Delete, DeleteTarget, RowStore};

pub(crate) use row::{Label, VersionedRow, VisibleCell};
pub(crate) use row_store::read_row;
