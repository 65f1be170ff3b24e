//! CLI command implementations
//!
//! `serve` boots in a fixed order: load config, stage fixtures, enable the
//! service (which hydrates every table), then answer requests until stdin
//! closes. Any failure before the loop ends the process.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::client::{ClientService, ServiceConfig};
use crate::fixture::{self, Fixture};
use crate::observability::{log_event, Event, Logger, Severity};
use crate::transport::RecordingTransport;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response};
use super::protocol::handle_request;

/// Run the CLI with parsed arguments
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            fixture,
            log_level,
        } => {
            Logger::set_min_severity(Severity::from(log_level));
            let stdin = io::stdin();
            let stdout = io::stdout();
            serve(
                &config,
                fixture.as_deref(),
                stdin.lock(),
                &mut stdout.lock(),
            )
        }
        Command::CheckConfig { config } => {
            let stdout = io::stdout();
            check_config(&config, &mut stdout.lock())
        }
    }
}

/// Load and validate `config_path`, reporting the outcome as one response.
pub fn check_config<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    let config = load_config(config_path)?;
    write_response(
        out,
        json!({
            "tables": config.tables,
            "endpoints": config.cluster_endpoints.len(),
        }),
    )
}

/// Boot a service and answer one request per input line until EOF.
pub fn serve<R: BufRead, W: Write>(
    config_path: &Path,
    fixture_path: Option<&Path>,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    let mut config = load_config(config_path)?;

    let transport = Arc::new(RecordingTransport::new());
    if let Some(path) = fixture_path {
        // Fixture tables are served even when the config does not list them.
        for fixture in Fixture::load(path)? {
            if !config.tables.contains(&fixture.table) {
                config.tables.push(fixture.table.clone());
            }
        }
        fixture::load_into(path, &transport)?;
    }

    let service =
        ClientService::enable(config, transport).map_err(|e| CliError::enable_failed(&e))?;
    let tables = service.table_names().join(",");
    log_event(Event::Serving, &[("tables", tables.as_str())]);

    for request in read_requests(input) {
        let outcome = request.and_then(|value| handle_request(&service, value));
        match outcome {
            Ok(data) => write_response(out, data)?,
            Err(e) => write_error(out, e.code_str(), e.message())?,
        }
    }

    service.disable();
    Ok(())
}

fn load_config(path: &Path) -> CliResult<ServiceConfig> {
    match ServiceConfig::load(path) {
        Ok(config) => {
            let path = path.display().to_string();
            log_event(Event::ConfigLoaded, &[("path", path.as_str())]);
            Ok(config)
        }
        Err(e) => {
            let reason = e.to_string();
            log_event(Event::ConfigRejected, &[("reason", reason.as_str())]);
            Err(CliError::config_error(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("rowstore.json");
        fs::write(&path, body).unwrap();
        path
    }

    fn responses(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_check_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"cluster_endpoints": ["zk1"], "tables": ["t"]}"#);
        let mut out = Vec::new();
        check_config(&path, &mut out).unwrap();
        let lines = responses(out);
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["data"]["tables"], json!(["t"]));

        let bad = write_config(&dir, r#"{"cluster_endpoints": []}"#);
        let err = check_config(&bad, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code_str(), "ROWSTORE_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_serve_with_fixture() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir, r#"{"cluster_endpoints": ["zk1"]}"#);
        let fixture = dir.path().join("fixture.json");
        fs::write(
            &fixture,
            r#"{"table": "users", "rows": [{"row": "u1", "cells": [
                {"family": "info", "qualifier": "name", "value": "ada"}]}]}"#,
        )
        .unwrap();

        let input = Cursor::new(
            [
                r#"{"op": "get", "table": "users", "row": "u1"}"#,
                "garbage",
                r#"{"op": "put", "table": "users", "row": "u2", "cells": [{"family": "info", "qualifier": "name", "value": "bob"}]}"#,
                r#"{"op": "scan", "table": "users"}"#,
            ]
            .join("\n"),
        );
        let mut out = Vec::new();
        serve(&config, Some(&fixture), input, &mut out).unwrap();

        let lines = responses(out);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["data"]["row"]["cells"][0]["value"], "ada");
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["code"], "ROWSTORE_CLI_BAD_REQUEST");
        assert_eq!(lines[2]["status"], "ok");
        assert_eq!(lines[3]["data"]["rows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_serve_rejects_missing_config() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.json");
        let err = serve(&missing, None, Cursor::new(""), &mut Vec::new()).unwrap_err();
        assert_eq!(err.code_str(), "ROWSTORE_CLI_CONFIG_ERROR");
    }
}
