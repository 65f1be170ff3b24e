//! Transport error types
//!
//! Every transport error is a resource failure: the request itself was
//! well-formed but the cluster could not serve it. Callers never retry.

use thiserror::Error;

use crate::errors::ErrorKind;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("cannot connect to cluster: {0}")]
    Connect(String),

    #[error("transport {op} failed: {reason}")]
    Failed { op: &'static str, reason: String },

    #[error("transport is closed")]
    Closed,
}

impl TransportError {
    pub fn failed(op: &'static str, reason: impl Into<String>) -> Self {
        TransportError::Failed {
            op,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Connect(_) => "ROWSTORE_TRANSPORT_CONNECT",
            TransportError::Failed { .. } => "ROWSTORE_TRANSPORT_FAILED",
            TransportError::Closed => "ROWSTORE_TRANSPORT_CLOSED",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Resource
    }
}
