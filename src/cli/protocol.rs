//! Request protocol of the serving loop
//!
//! Each line is an object tagged by `op`:
//!
//! ```json
//! {"op": "put", "table": "users", "row": "u1",
//!  "cells": [{"family": "info", "qualifier": "name", "value": "ada"}]}
//! {"op": "check_and_put", "table": "users", "row": "u1", "family": "info",
//!  "qualifier": "name", "expected": "ada",
//!  "cell": {"family": "info", "qualifier": "name", "value": "grace"}}
//! {"op": "delete", "table": "users", "row": "u1", "columns": ["info:name"]}
//! {"op": "scan", "table": "users", "prefix": "u", "authorizations": ["admin"]}
//! {"op": "get", "table": "users", "row": "u1"}
//! {"op": "metrics"}
//! {"op": "tables"}
//! ```
//!
//! Row keys are written in printable binary notation (`\xNN` per byte).
//! Values are plain UTF-8 in `value` or base64 in `value_b64`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{codec, ClientService};
use crate::model::{Cell, Column, PutColumn, RowKey, RowResult};
use crate::scan::{ColumnFilter, RowRange, ScanOptions, TimeRange};
use crate::visibility::Authorizations;

use super::errors::{CliError, CliResult};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Put {
        table: String,
        row: String,
        cells: Vec<CellSpec>,
    },
    CheckAndPut {
        table: String,
        row: String,
        family: String,
        qualifier: String,
        #[serde(default)]
        expected: Option<String>,
        #[serde(default)]
        expected_b64: Option<String>,
        cell: CellSpec,
    },
    Delete {
        table: String,
        row: String,
        /// `family:qualifier` specs; empty deletes the whole row
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        visibility: Option<String>,
    },
    Scan(ScanSpec),
    Get {
        table: String,
        row: String,
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        authorizations: Option<Vec<String>>,
    },
    Metrics,
    Tables,
}

#[derive(Debug, Deserialize)]
pub struct CellSpec {
    pub family: String,
    pub qualifier: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_b64: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub visibility: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanSpec {
    pub table: String,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Takes precedence over `start`/`end`
    pub prefix: Option<String>,
    pub columns: Vec<String>,
    pub authorizations: Option<Vec<String>>,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    pub max_versions: Option<usize>,
    pub limit: Option<usize>,
    pub reversed: bool,
    pub row_regex: Option<String>,
}

/// Decodes and runs one request, returning the `data` of the response.
pub fn handle_request(service: &ClientService, request: Value) -> CliResult<Value> {
    let request: Request = serde_json::from_value(request)?;
    match request {
        Request::Put { table, row, cells } => {
            let row = row_key(&row)?;
            let columns = cells
                .iter()
                .map(CellSpec::to_put)
                .collect::<CliResult<Vec<_>>>()?;
            service.put(&table, &row, &columns)?;
            Ok(json!({ "cells": columns.len() }))
        }
        Request::CheckAndPut {
            table,
            row,
            family,
            qualifier,
            expected,
            expected_b64,
            cell,
        } => {
            let row = row_key(&row)?;
            let expected = match (expected, expected_b64) {
                (None, None) => None,
                (Some(text), None) => Some(text.into_bytes()),
                (None, Some(encoded)) => Some(decode_b64(&encoded)?),
                (Some(_), Some(_)) => {
                    return Err(CliError::bad_request(
                        "give at most one of expected or expected_b64",
                    ))
                }
            };
            let applied = service.check_and_put(
                &table,
                &row,
                family.as_bytes(),
                qualifier.as_bytes(),
                expected.as_deref(),
                &cell.to_put()?,
            )?;
            Ok(json!({ "applied": applied }))
        }
        Request::Delete {
            table,
            row,
            columns,
            visibility,
        } => {
            let row = row_key(&row)?;
            let columns = columns
                .iter()
                .map(|spec| Column::parse(spec))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| CliError::bad_request(e.to_string()))?;
            let removed = match (columns.is_empty(), visibility) {
                (true, None) => service.delete(&table, &row)?,
                (true, Some(label)) => service.delete_with_visibility(&table, &row, &label)?,
                (false, None) => service.delete_columns(&table, &row, &columns)?,
                (false, Some(label)) => {
                    service.delete_columns_with_visibility(&table, &row, &columns, &label)?
                }
            };
            Ok(json!({ "removed": removed }))
        }
        Request::Scan(spec) => {
            let options = spec.to_options()?;
            let mut rows = Vec::new();
            service.scan(&spec.table, &options, &mut |row: &RowKey, cells: &[Cell]| {
                rows.push(render_row(row, cells));
            })?;
            Ok(json!({ "rows": rows }))
        }
        Request::Get {
            table,
            row,
            columns,
            authorizations,
        } => {
            let row = row_key(&row)?;
            let mut options = ScanOptions::new().columns(column_filter(&columns)?);
            if let Some(labels) = authorizations {
                options = options.authorizations(Authorizations::new(labels));
            }
            let found = service.scan_row_with(&table, &row, &options)?;
            Ok(json!({ "row": found.as_ref().map(render_result) }))
        }
        Request::Metrics => Ok(serde_json::to_value(service.metrics())?),
        Request::Tables => Ok(json!({ "tables": service.table_names() })),
    }
}

impl CellSpec {
    fn to_put(&self) -> CliResult<PutColumn> {
        let value = match (&self.value, &self.value_b64) {
            (Some(text), None) => codec::to_bytes_str(text),
            (None, Some(encoded)) => decode_b64(encoded)?,
            _ => {
                return Err(CliError::bad_request(
                    "each cell needs exactly one of value or value_b64",
                ))
            }
        };
        let mut column = PutColumn::new(self.family.as_str(), self.qualifier.as_str(), value);
        if let Some(ts) = self.timestamp {
            column = column.at(ts);
        }
        if let Some(expression) = &self.visibility {
            column = column.with_visibility(expression.as_str());
        }
        Ok(column)
    }
}

impl ScanSpec {
    fn to_options(&self) -> CliResult<ScanOptions> {
        let range = match &self.prefix {
            Some(prefix) => RowRange::prefix(codec::to_bytes_binary(prefix).map_err(bad_key)?),
            None => RowRange::between(
                optional_key(self.start.as_deref())?,
                optional_key(self.end.as_deref())?,
            ),
        };
        let mut options = ScanOptions::new()
            .range(range)
            .columns(column_filter(&self.columns)?)
            .time_range(TimeRange {
                min: self.min_timestamp,
                max: self.max_timestamp,
            })
            .reversed(self.reversed);
        if let Some(labels) = &self.authorizations {
            options = options.authorizations(Authorizations::new(labels.iter().cloned()));
        }
        if let Some(versions) = self.max_versions {
            options = options.max_versions(versions);
        }
        if let Some(rows) = self.limit {
            options = options.limit(rows);
        }
        if let Some(pattern) = &self.row_regex {
            options = options.row_regex(pattern).map_err(crate::client::ClientError::from)?;
        }
        Ok(options)
    }
}

fn row_key(text: &str) -> CliResult<RowKey> {
    codec::to_bytes_binary(text)
        .map(RowKey::new)
        .map_err(bad_key)
}

fn optional_key(text: Option<&str>) -> CliResult<RowKey> {
    text.map_or_else(|| Ok(RowKey::new(Vec::new())), row_key)
}

fn bad_key(e: codec::EncodingError) -> CliError {
    CliError::bad_request(format!("invalid row key: {}", e))
}

fn decode_b64(encoded: &str) -> CliResult<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CliError::bad_request(format!("invalid base64: {}", e)))
}

fn column_filter(specs: &[String]) -> CliResult<ColumnFilter> {
    ColumnFilter::parse(specs).map_err(|e| CliError::from(crate::client::ClientError::from(e)))
}

fn render_result(row: &RowResult) -> Value {
    render_row(row.row(), row.cells())
}

fn render_row(row: &RowKey, cells: &[Cell]) -> Value {
    let cells: Vec<Value> = cells
        .iter()
        .map(|cell| {
            json!({
                "family": codec::to_string_binary(cell.family()),
                "qualifier": codec::to_string_binary(cell.qualifier()),
                "value": codec::to_str(cell.value()).ok(),
                "value_b64": STANDARD.encode(cell.value()),
                "timestamp": cell.timestamp(),
                "sequence_id": cell.sequence_id(),
                "visibility": cell.visibility(),
            })
        })
        .collect();
    json!({
        "row": codec::to_string_binary(row.as_bytes()),
        "cells": cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ServiceConfig;
    use crate::transport::RecordingTransport;
    use std::sync::Arc;

    fn service() -> ClientService {
        let config = ServiceConfig::new(["zk1:2181"]).with_table("users");
        ClientService::enable(config, Arc::new(RecordingTransport::new())).unwrap()
    }

    fn run(service: &ClientService, request: Value) -> CliResult<Value> {
        handle_request(service, request)
    }

    #[test]
    fn test_put_then_get() {
        let svc = service();
        run(
            &svc,
            json!({"op": "put", "table": "users", "row": "u1", "cells": [
                {"family": "info", "qualifier": "name", "value": "ada", "timestamp": 7},
                {"family": "info", "qualifier": "raw", "value_b64": "AP8="}
            ]}),
        )
        .unwrap();

        let data = run(&svc, json!({"op": "get", "table": "users", "row": "u1"})).unwrap();
        let cells = data["row"]["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 2);
        let name = cells.iter().find(|c| c["qualifier"] == "name").unwrap();
        assert_eq!(name["value"], "ada");
        assert_eq!(name["timestamp"], 7);
        let raw = cells.iter().find(|c| c["qualifier"] == "raw").unwrap();
        assert!(raw["value"].is_null());
        assert_eq!(raw["value_b64"], "AP8=");
    }

    #[test]
    fn test_check_and_put() {
        let svc = service();
        let cas = |expected: Value| {
            json!({"op": "check_and_put", "table": "users", "row": "u1",
                   "family": "info", "qualifier": "name", "expected": expected,
                   "cell": {"family": "info", "qualifier": "name", "value": "grace"}})
        };
        assert_eq!(run(&svc, cas(Value::Null)).unwrap()["applied"], true);
        assert_eq!(run(&svc, cas(Value::Null)).unwrap()["applied"], false);
        assert_eq!(run(&svc, cas(json!("grace"))).unwrap()["applied"], true);
    }

    #[test]
    fn test_delete_and_scan() {
        let svc = service();
        for row in ["a1", "a2", "b1"] {
            run(
                &svc,
                json!({"op": "put", "table": "users", "row": row, "cells": [
                    {"family": "f", "qualifier": "q", "value": row}
                ]}),
            )
            .unwrap();
        }
        let removed = run(
            &svc,
            json!({"op": "delete", "table": "users", "row": "a2", "columns": ["f:q"]}),
        )
        .unwrap();
        assert_eq!(removed["removed"], true);

        let data = run(&svc, json!({"op": "scan", "table": "users", "prefix": "a"})).unwrap();
        let rows = data["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["row"], "a1");

        let data = run(
            &svc,
            json!({"op": "scan", "table": "users", "reversed": true, "limit": 2}),
        )
        .unwrap();
        let keys: Vec<&str> = data["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["row"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["b1", "a1"]);
    }

    #[test]
    fn test_labelled_column_delete_sends_one_batch() {
        let transport = Arc::new(RecordingTransport::new());
        let config = ServiceConfig::new(["zk1:2181"]).with_table("users");
        let svc = ClientService::enable(config, transport.clone()).unwrap();
        run(
            &svc,
            json!({"op": "put", "table": "users", "row": "r", "cells": [
                {"family": "f", "qualifier": "a", "value": "1", "visibility": "ops"},
                {"family": "f", "qualifier": "b", "value": "2", "visibility": "ops"}
            ]}),
        )
        .unwrap();

        let removed = run(
            &svc,
            json!({"op": "delete", "table": "users", "row": "r",
                   "columns": ["f:a", "f:b"], "visibility": "ops"}),
        )
        .unwrap();
        assert_eq!(removed["removed"], true);
        assert_eq!(transport.delete_batches().len(), 1);

        let data = run(
            &svc,
            json!({"op": "get", "table": "users", "row": "r", "authorizations": ["ops"]}),
        )
        .unwrap();
        assert!(data["row"].is_null());
    }

    #[test]
    fn test_errors_carry_service_codes() {
        let svc = service();
        let err = run(&svc, json!({"op": "get", "table": "nope", "row": "r"})).unwrap_err();
        assert_eq!(err.code_str(), "ROWSTORE_UNKNOWN_TABLE");

        let err = run(&svc, json!({"op": "explode"})).unwrap_err();
        assert_eq!(err.code_str(), "ROWSTORE_CLI_BAD_REQUEST");

        let err = run(
            &svc,
            json!({"op": "put", "table": "users", "row": "r", "cells": [
                {"family": "f", "qualifier": "q"}
            ]}),
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "ROWSTORE_CLI_BAD_REQUEST");
    }

    #[test]
    fn test_metrics_and_tables() {
        let svc = service();
        let tables = run(&svc, json!({"op": "tables"})).unwrap();
        assert_eq!(tables["tables"], json!(["users"]));
        let metrics = run(&svc, json!({"op": "metrics"})).unwrap();
        assert_eq!(metrics["puts"], 0);
    }
}
