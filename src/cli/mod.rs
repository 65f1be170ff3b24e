//! CLI module for rowstore
//!
//! Provides command-line interface for:
//! - serve: enable a service and answer JSON requests on stdin
//! - check-config: validate a configuration file

mod args;
mod commands;
mod errors;
mod io;
mod protocol;

pub use args::{Cli, Command, LogLevel};
pub use commands::{check_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_response};
pub use protocol::{handle_request, Request};
