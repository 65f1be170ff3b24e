//! CLI argument definitions using clap
//!
//! Commands:
//! - rowstore serve --config <path> [--fixture <path>] [--log-level <level>]
//! - rowstore check-config --config <path>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::observability::Severity;

/// rowstore - versioned wide-column row store with a JSON request loop
#[derive(Parser, Debug)]
#[command(name = "rowstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enable a service and answer one JSON request per stdin line
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./rowstore.json")]
        config: PathBuf,

        /// JSON fixture staged before the tables are hydrated
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Minimum severity of log lines
        #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
        log_level: LogLevel,
    },

    /// Validate a configuration file and exit
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./rowstore.json")]
        config: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from([
            "rowstore",
            "serve",
            "--config",
            "c.json",
            "--fixture",
            "f.json",
            "--log-level",
            "info",
        ])
        .unwrap();
        match cli.command {
            Command::Serve {
                config,
                fixture,
                log_level,
            } => {
                assert_eq!(config, PathBuf::from("c.json"));
                assert_eq!(fixture, Some(PathBuf::from("f.json")));
                assert_eq!(log_level, LogLevel::Info);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_config_default_path() {
        let cli = Cli::try_parse_from(["rowstore", "check-config"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::CheckConfig { config } if config == PathBuf::from("./rowstore.json")
        ));
    }
}
