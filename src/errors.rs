//! Crate-wide error classification
//!
//! Every subsystem owns its own error enum with a stable `ROWSTORE_*`
//! code. This module only defines the coarse kind that callers use to
//! classify failures without matching on every subsystem variant.

use std::fmt;

/// Coarse classification shared by every rowstore error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed row key, column, table name, label, or request shape
    InvalidInput,
    /// A value could not be converted to or from the requested type
    Encoding,
    /// A named resource does not exist
    ///
    /// Point lookups never produce this; a missing row is `None`.
    NotFound,
    /// A conditional write did not apply
    ///
    /// `check_and_put` reports this through its boolean result instead.
    ConditionFailed,
    /// Transport, lock, lifecycle, cancellation or timeout failure
    Resource,
}

impl ErrorKind {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Encoding => "ENCODING",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ConditionFailed => "CONDITION_FAILED",
            ErrorKind::Resource => "RESOURCE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
