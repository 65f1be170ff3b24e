//! Visibility expression errors

use thiserror::Error;

use crate::errors::ErrorKind;

/// Result type for expression parsing
pub type ExprResult<T> = Result<T, ExprError>;

/// Errors raised while parsing a visibility expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("visibility expression is empty")]
    Empty,

    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("unexpected end of visibility expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at position {0}")]
    UnbalancedParen(usize),

    #[error("visibility expression nests too deeply at position {0}")]
    TooDeep(usize),
}

impl ExprError {
    pub fn code(&self) -> &'static str {
        "ROWSTORE_INVALID_VISIBILITY"
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}
