//! Row store error types
//!
//! Error codes:
//! - ROWSTORE_INVALID_INPUT (malformed key, column, or empty put)
//! - ROWSTORE_INVALID_VISIBILITY (unparseable visibility expression)
//! - ROWSTORE_LOCK_POISONED (a writer panicked while holding a lock)
//! - ROWSTORE_CANCELLED / ROWSTORE_TIMED_OUT (operation control tripped)

use thiserror::Error;

use crate::errors::ErrorKind;
use crate::model::ModelError;
use crate::visibility::ExprError;

/// Result type for row store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidInput(#[from] ModelError),

    #[error("invalid visibility expression '{expression}': {source}")]
    InvalidVisibility {
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("request for row '{0}' names no columns")]
    NoColumns(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out")]
    TimedOut,
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidInput(e) => e.code(),
            StoreError::InvalidVisibility { .. } => "ROWSTORE_INVALID_VISIBILITY",
            StoreError::NoColumns(_) => "ROWSTORE_NO_COLUMNS",
            StoreError::LockPoisoned(_) => "ROWSTORE_LOCK_POISONED",
            StoreError::Cancelled => "ROWSTORE_CANCELLED",
            StoreError::TimedOut => "ROWSTORE_TIMED_OUT",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidInput(_)
            | StoreError::InvalidVisibility { .. }
            | StoreError::NoColumns(_) => ErrorKind::InvalidInput,
            StoreError::LockPoisoned(_) | StoreError::Cancelled | StoreError::TimedOut => {
                ErrorKind::Resource
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            StoreError::from(ModelError::EmptyRowKey).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(StoreError::TimedOut.kind(), ErrorKind::Resource);
        assert_eq!(StoreError::LockPoisoned("rows").kind(), ErrorKind::Resource);
    }

    #[test]
    fn test_codes_pass_through_model_errors() {
        assert_eq!(
            StoreError::from(ModelError::EmptyFamily).code(),
            "ROWSTORE_EMPTY_FAMILY"
        );
        assert_eq!(StoreError::Cancelled.code(), "ROWSTORE_CANCELLED");
    }
}
