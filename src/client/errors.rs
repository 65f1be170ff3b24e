//! Client facade error types
//!
//! Every failure a caller can see from `ClientService` is a `ClientError`.
//! Lower-layer errors are wrapped unchanged so `code()` and `kind()` pass
//! through.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::errors::ErrorKind;
use crate::model::ModelError;
use crate::scan::ScanError;
use crate::store::StoreError;
use crate::transport::TransportError;

use super::codec::EncodingError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Config(_) => "ROWSTORE_CONFIG_INVALID",
            ClientError::ConfigIo { .. } => "ROWSTORE_CONFIG_IO",
            ClientError::UnknownTable(_) => "ROWSTORE_UNKNOWN_TABLE",
            ClientError::Model(e) => e.code(),
            ClientError::Store(e) => e.code(),
            ClientError::Scan(e) => e.code(),
            ClientError::Transport(e) => e.code(),
            ClientError::Encoding(e) => e.code(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Config(_) | ClientError::UnknownTable(_) => ErrorKind::InvalidInput,
            ClientError::ConfigIo { .. } => ErrorKind::Resource,
            ClientError::Model(e) => e.kind(),
            ClientError::Store(e) => e.kind(),
            ClientError::Scan(e) => e.kind(),
            ClientError::Transport(e) => e.kind(),
            ClientError::Encoding(e) => e.kind(),
        }
    }
}
