//! Model validation errors

use thiserror::Error;

use crate::errors::ErrorKind;

/// Result type for model construction
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating keys, columns and table names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("row key must not be empty")]
    EmptyRowKey,

    #[error("column family must not be empty")]
    EmptyFamily,

    #[error("column qualifier must not be empty")]
    EmptyQualifier,

    #[error("invalid table name: '{0}'")]
    InvalidTableName(String),

    #[error("invalid column specification: '{0}'")]
    InvalidColumnSpec(String),
}

impl ModelError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::EmptyRowKey => "ROWSTORE_EMPTY_ROW_KEY",
            ModelError::EmptyFamily => "ROWSTORE_EMPTY_FAMILY",
            ModelError::EmptyQualifier => "ROWSTORE_EMPTY_QUALIFIER",
            ModelError::InvalidTableName(_) => "ROWSTORE_INVALID_TABLE_NAME",
            ModelError::InvalidColumnSpec(_) => "ROWSTORE_INVALID_COLUMN_SPEC",
        }
    }

    /// Model errors are always caller mistakes
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}
