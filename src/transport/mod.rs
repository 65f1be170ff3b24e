//! Cluster transport
//!
//! The client service writes through a `Transport` before applying a
//! mutation locally, and hydrates its tables from the transport when it is
//! enabled. A transport failure aborts the operation with nothing applied.

mod errors;
mod recording;

use std::fmt;
use std::time::Duration;

pub use errors::{TransportError, TransportResult};
pub use recording::RecordingTransport;

use crate::model::{Cell, RowKey, RowResult};
use crate::scan::{ColumnFilter, RowRange};
use crate::store::DeleteTarget;

/// Connection parameters handed to [`Transport::open`].
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub endpoints: Vec<String>,
    pub connection_timeout: Duration,
    pub credentials_ref: Option<String>,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("endpoints", &self.endpoints)
            .field("connection_timeout", &self.connection_timeout)
            .field(
                "credentials_ref",
                &self.credentials_ref.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// One row's cells as sent to the cluster, timestamps resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMutation {
    pub row: RowKey,
    pub cells: Vec<Cell>,
}

/// One row delete as sent to the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDelete {
    pub row: RowKey,
    pub target: DeleteTarget,
    pub visibility: Option<String>,
}

/// Remote cluster operations.
pub trait Transport: Send + Sync + fmt::Debug {
    fn open(&self, _settings: &ConnectionSettings) -> TransportResult<()> {
        Ok(())
    }

    fn put(&self, table: &str, mutations: &[RowMutation]) -> TransportResult<()>;

    fn get(
        &self,
        table: &str,
        range: &RowRange,
        columns: &ColumnFilter,
    ) -> TransportResult<Vec<RowResult>>;

    fn delete(&self, table: &str, deletes: &[RowDelete]) -> TransportResult<()>;

    fn close(&self) {}
}
