//! CLI-specific error types
//!
//! Startup errors (config, fixture, enable) end the process. Errors from a
//! single request are written back as an error response and the serving
//! loop continues.

use std::fmt;
use std::io;

use crate::client::ClientError;
use crate::fixture::FixtureError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Fixture file error
    FixtureError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Request line is not a valid request
    RequestError,
    /// The client service could not be enabled
    EnableFailed,
    /// A request failed inside the client service
    Service(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ROWSTORE_CLI_CONFIG_ERROR",
            Self::FixtureError => "ROWSTORE_CLI_FIXTURE_ERROR",
            Self::IoError => "ROWSTORE_CLI_IO_ERROR",
            Self::RequestError => "ROWSTORE_CLI_BAD_REQUEST",
            Self::EnableFailed => "ROWSTORE_CLI_ENABLE_FAILED",
            Self::Service(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RequestError, msg)
    }

    pub fn enable_failed(e: &ClientError) -> Self {
        Self::new(CliErrorCode::EnableFailed, format!("{}: {}", e.code(), e))
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON error: {}", e))
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        Self::new(CliErrorCode::Service(e.code()), e.to_string())
    }
}

impl From<FixtureError> for CliError {
    fn from(e: FixtureError) -> Self {
        Self::new(CliErrorCode::FixtureError, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
