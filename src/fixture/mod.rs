//! JSON fixtures
//!
//! A fixture file stages rows into a `RecordingTransport` ahead of
//! `ClientService::enable`, which then hydrates the table from them.
//!
//! ```json
//! {"table": "users",
//!  "rows": [{"row": "u1", "timestamp": 1700000000000,
//!            "cells": [{"family": "info", "qualifier": "name", "value": "ada"},
//!                      {"family": "info", "qualifier": "key", "value_b64": "AAE=",
//!                       "visibility": "admin"}]}]}
//! ```
//!
//! A file holds one such document or an array of them. A cell timestamp
//! overrides the row timestamp; with neither the cell is stamped 0.

mod errors;

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::model::{Cell, Column, RowKey, RowResult, TableName};
use crate::observability::{log_event, Event};
use crate::transport::RecordingTransport;
use crate::visibility::VisibilityExpr;

pub use errors::{FixtureError, FixtureResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub table: String,
    #[serde(default)]
    pub rows: Vec<FixtureRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRow {
    pub row: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub cells: Vec<FixtureCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureCell {
    pub family: String,
    pub qualifier: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_b64: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureDocument {
    One(Fixture),
    Many(Vec<Fixture>),
}

impl Fixture {
    /// Parses one fixture document or an array of them.
    pub fn from_json(json: &str) -> FixtureResult<Vec<Fixture>> {
        Ok(match serde_json::from_str(json)? {
            FixtureDocument::One(fixture) => vec![fixture],
            FixtureDocument::Many(fixtures) => fixtures,
        })
    }

    pub fn load(path: &Path) -> FixtureResult<Vec<Fixture>> {
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Converts every row, failing on the first malformed one.
    pub fn to_rows(&self) -> FixtureResult<Vec<RowResult>> {
        TableName::new(self.table.as_str())?;
        self.rows.iter().map(FixtureRow::to_row).collect()
    }

    /// Validates the whole fixture, then stages its rows.
    pub fn stage_into(&self, transport: &RecordingTransport) -> FixtureResult<usize> {
        let rows = self.to_rows()?;
        let count = rows.len();
        for row in rows {
            transport.stage(&self.table, row);
        }
        let staged = count.to_string();
        log_event(
            Event::FixtureLoaded,
            &[("rows", staged.as_str()), ("table", self.table.as_str())],
        );
        Ok(count)
    }
}

impl FixtureRow {
    fn to_row(&self) -> FixtureResult<RowResult> {
        let key = RowKey::for_write(self.row.as_str())?;
        let cells = self
            .cells
            .iter()
            .map(|cell| -> FixtureResult<Cell> {
                let column = Column::new(cell.family.as_str(), cell.qualifier.as_str());
                column.validate()?;
                let value = match (&cell.value, &cell.value_b64) {
                    (Some(text), None) => text.as_bytes().to_vec(),
                    (None, Some(encoded)) => {
                        STANDARD
                            .decode(encoded)
                            .map_err(|source| FixtureError::Base64 {
                                row: self.row.clone(),
                                source,
                            })?
                    }
                    _ => {
                        return Err(FixtureError::Value {
                            row: self.row.clone(),
                        })
                    }
                };
                if let Some(expression) = &cell.visibility {
                    VisibilityExpr::parse(expression).map_err(|source| {
                        FixtureError::Visibility {
                            row: self.row.clone(),
                            expression: expression.clone(),
                            source,
                        }
                    })?;
                }
                let timestamp = cell.timestamp.or(self.timestamp).unwrap_or(0);
                Ok(Cell::new(column, value, timestamp, 0, cell.visibility.clone()))
            })
            .collect::<FixtureResult<Vec<_>>>()?;
        Ok(RowResult::new(key, cells))
    }
}

/// Loads every fixture in `path` into `transport`. Returns rows staged.
pub fn load_into(path: &Path, transport: &RecordingTransport) -> FixtureResult<usize> {
    let mut staged = 0;
    for fixture in Fixture::load(path)? {
        staged += fixture.stage_into(transport)?;
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{ColumnFilter, RowRange};
    use crate::transport::Transport;
    use std::io::Write;

    const USERS: &str = r#"{
        "table": "users",
        "rows": [
            {"row": "u1", "timestamp": 5, "cells": [
                {"family": "info", "qualifier": "name", "value": "ada"},
                {"family": "info", "qualifier": "raw", "value_b64": "AAE=", "timestamp": 9}
            ]},
            {"row": "u2", "cells": [
                {"family": "info", "qualifier": "name", "value": "bob", "visibility": "admin"}
            ]}
        ]
    }"#;

    #[test]
    fn test_parse_and_convert() {
        let fixtures = Fixture::from_json(USERS).unwrap();
        assert_eq!(fixtures.len(), 1);
        let rows = fixtures[0].to_rows().unwrap();

        let u1 = &rows[0];
        assert_eq!(u1.value(b"info", b"name"), Some(&b"ada"[..]));
        assert_eq!(u1.latest(b"info", b"name").unwrap().timestamp(), 5);
        let raw = u1.latest(b"info", b"raw").unwrap();
        assert_eq!(raw.value(), &[0x00, 0x01]);
        assert_eq!(raw.timestamp(), 9);

        let u2 = &rows[1];
        assert_eq!(u2.cells()[0].visibility(), Some("admin"));
        assert_eq!(u2.cells()[0].timestamp(), 0);
    }

    #[test]
    fn test_array_document() {
        let json = format!("[{}, {{\"table\": \"empty\"}}]", USERS);
        let fixtures = Fixture::from_json(&json).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert!(fixtures[1].rows.is_empty());
    }

    #[test]
    fn test_rejects_ambiguous_value() {
        let json = r#"{"table": "t", "rows": [{"row": "r", "cells": [
            {"family": "f", "qualifier": "q", "value": "a", "value_b64": "YQ=="}]}]}"#;
        let err = Fixture::from_json(json).unwrap()[0].to_rows().unwrap_err();
        assert!(matches!(err, FixtureError::Value { .. }));
    }

    #[test]
    fn test_rejects_bad_labels_and_names() {
        let json = r#"{"table": "t", "rows": [{"row": "r", "cells": [
            {"family": "f", "qualifier": "q", "value": "a", "visibility": "a&"}]}]}"#;
        let err = Fixture::from_json(json).unwrap()[0].to_rows().unwrap_err();
        assert_eq!(err.code(), "ROWSTORE_INVALID_VISIBILITY");

        let bad_table = Fixture {
            table: "has space".to_string(),
            rows: Vec::new(),
        };
        assert!(matches!(bad_table.to_rows(), Err(FixtureError::Model(_))));
    }

    #[test]
    fn test_load_into_stages_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USERS.as_bytes()).unwrap();

        let transport = RecordingTransport::new();
        assert_eq!(load_into(file.path(), &transport).unwrap(), 2);

        let rows = transport
            .get("users", &RowRange::all(), &ColumnFilter::all())
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
