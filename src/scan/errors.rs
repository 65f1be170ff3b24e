//! Scan error types
//!
//! Error codes:
//! - ROWSTORE_INVALID_TIME_RANGE (min not below max)
//! - ROWSTORE_INVALID_MAX_VERSIONS (a version cap of zero)
//! - ROWSTORE_INVALID_ROW_REGEX (row filter does not compile)
//! - ROWSTORE_CANCELLED / ROWSTORE_TIMED_OUT (scan stopped early)
//! - store codes pass through

use thiserror::Error;

use crate::errors::ErrorKind;
use crate::store::StoreError;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("time range is empty: min {min} is not below max {max}")]
    InvalidTimeRange { min: i64, max: i64 },

    #[error("max versions must be at least 1")]
    InvalidMaxVersions,

    #[error("invalid row filter '{pattern}': {source}")]
    InvalidRowRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("scan cancelled")]
    Cancelled,

    #[error("scan timed out")]
    TimedOut,

    #[error(transparent)]
    Store(StoreError),
}

impl ScanError {
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::InvalidTimeRange { .. } => "ROWSTORE_INVALID_TIME_RANGE",
            ScanError::InvalidMaxVersions => "ROWSTORE_INVALID_MAX_VERSIONS",
            ScanError::InvalidRowRegex { .. } => "ROWSTORE_INVALID_ROW_REGEX",
            ScanError::Cancelled => "ROWSTORE_CANCELLED",
            ScanError::TimedOut => "ROWSTORE_TIMED_OUT",
            ScanError::Store(e) => e.code(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::InvalidTimeRange { .. }
            | ScanError::InvalidMaxVersions
            | ScanError::InvalidRowRegex { .. } => ErrorKind::InvalidInput,
            ScanError::Cancelled | ScanError::TimedOut => ErrorKind::Resource,
            ScanError::Store(e) => e.kind(),
        }
    }

    /// True for the early-stop errors raised by cancellation or deadline.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ScanError::Cancelled | ScanError::TimedOut)
    }
}

impl From<StoreError> for ScanError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cancelled => ScanError::Cancelled,
            StoreError::TimedOut => ScanError::TimedOut,
            other => ScanError::Store(other),
        }
    }
}
