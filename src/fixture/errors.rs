//! Fixture error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::errors::ErrorKind;
use crate::model::ModelError;
use crate::visibility::ExprError;

pub type FixtureResult<T> = Result<T, FixtureError>;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("cannot read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("row '{row}': value_b64 is not valid base64: {source}")]
    Base64 {
        row: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("row '{row}': each cell needs exactly one of value or value_b64")]
    Value { row: String },

    #[error("row '{row}': invalid visibility '{expression}': {source}")]
    Visibility {
        row: String,
        expression: String,
        #[source]
        source: ExprError,
    },
}

impl FixtureError {
    pub fn code(&self) -> &'static str {
        match self {
            FixtureError::Io { .. } => "ROWSTORE_FIXTURE_IO",
            FixtureError::Json(_) => "ROWSTORE_FIXTURE_JSON",
            FixtureError::Model(e) => e.code(),
            FixtureError::Base64 { .. } => "ROWSTORE_FIXTURE_BASE64",
            FixtureError::Value { .. } => "ROWSTORE_FIXTURE_VALUE",
            FixtureError::Visibility { .. } => "ROWSTORE_INVALID_VISIBILITY",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FixtureError::Io { .. } => ErrorKind::Resource,
            FixtureError::Base64 { .. } => ErrorKind::Encoding,
            _ => ErrorKind::InvalidInput,
        }
    }
}
