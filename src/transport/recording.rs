//! RecordingTransport - in-process transport for tests, fixtures and the CLI
//!
//! Records every batch it is sent, serves `get` from rows staged ahead of
//! time, and can be told to fail the next call of a given kind.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::model::{RowKey, RowResult};
use crate::scan::{ColumnFilter, RowRange};

use super::errors::{TransportError, TransportResult};
use super::{ConnectionSettings, RowDelete, RowMutation, Transport};

#[derive(Debug, Default)]
struct Recording {
    settings: Option<ConnectionSettings>,
    closed: bool,
    staged: BTreeMap<String, BTreeMap<RowKey, RowResult>>,
    puts: Vec<(String, Vec<RowMutation>)>,
    deletes: Vec<(String, Vec<RowDelete>)>,
    gets: usize,
    fail_open: Option<String>,
    fail_put: Option<String>,
    fail_delete: Option<String>,
    fail_get: Option<String>,
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    state: Mutex<Recording>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `row` so later `get` calls on `table` return it.
    ///
    /// Staging the same row twice merges the cells.
    pub fn stage(&self, table: &str, row: RowResult) {
        let mut state = self.lock();
        let rows = state.staged.entry(table.to_string()).or_default();
        let (key, cells) = row.into_parts();
        let merged = match rows.remove(&key) {
            Some(existing) => {
                let (_, mut old) = existing.into_parts();
                old.extend(cells);
                old
            }
            None => cells,
        };
        rows.insert(key.clone(), RowResult::new(key, merged));
    }

    pub fn fail_next_open(&self, reason: impl Into<String>) {
        self.lock().fail_open = Some(reason.into());
    }

    pub fn fail_next_put(&self, reason: impl Into<String>) {
        self.lock().fail_put = Some(reason.into());
    }

    pub fn fail_next_delete(&self, reason: impl Into<String>) {
        self.lock().fail_delete = Some(reason.into());
    }

    pub fn fail_next_get(&self, reason: impl Into<String>) {
        self.lock().fail_get = Some(reason.into());
    }

    /// Every put batch sent, in order.
    pub fn put_batches(&self) -> Vec<(String, Vec<RowMutation>)> {
        self.lock().puts.clone()
    }

    /// Every delete batch sent, in order.
    pub fn delete_batches(&self) -> Vec<(String, Vec<RowDelete>)> {
        self.lock().deletes.clone()
    }

    /// Row mutations sent for `table`, flattened.
    pub fn mutations(&self, table: &str) -> Vec<RowMutation> {
        self.lock()
            .puts
            .iter()
            .filter(|(t, _)| t == table)
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect()
    }

    pub fn get_count(&self) -> usize {
        self.lock().gets
    }

    pub fn settings(&self) -> Option<ConnectionSettings> {
        self.lock().settings.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        // Recording state stays readable after a panicking test thread.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn open_state(&self) -> TransportResult<MutexGuard<'_, Recording>> {
        let state = self.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        Ok(state)
    }
}

impl Transport for RecordingTransport {
    fn open(&self, settings: &ConnectionSettings) -> TransportResult<()> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_open.take() {
            return Err(TransportError::Connect(reason));
        }
        state.settings = Some(settings.clone());
        state.closed = false;
        Ok(())
    }

    fn put(&self, table: &str, mutations: &[RowMutation]) -> TransportResult<()> {
        let mut state = self.open_state()?;
        if let Some(reason) = state.fail_put.take() {
            return Err(TransportError::failed("put", reason));
        }
        state.puts.push((table.to_string(), mutations.to_vec()));
        Ok(())
    }

    fn get(
        &self,
        table: &str,
        range: &RowRange,
        columns: &ColumnFilter,
    ) -> TransportResult<Vec<RowResult>> {
        let mut state = self.open_state()?;
        if let Some(reason) = state.fail_get.take() {
            return Err(TransportError::failed("get", reason));
        }
        state.gets += 1;
        let Some(rows) = state.staged.get(table) else {
            return Ok(Vec::new());
        };
        if range.is_empty() {
            return Ok(Vec::new());
        }
        Ok(rows
            .range::<RowKey, _>(range.bounds())
            .filter_map(|(key, row)| {
                let cells: Vec<_> = row
                    .cells()
                    .iter()
                    .filter(|c| columns.matches(c.column()))
                    .cloned()
                    .collect();
                (!cells.is_empty()).then(|| RowResult::new(key.clone(), cells))
            })
            .collect())
    }

    fn delete(&self, table: &str, deletes: &[RowDelete]) -> TransportResult<()> {
        let mut state = self.open_state()?;
        if let Some(reason) = state.fail_delete.take() {
            return Err(TransportError::failed("delete", reason));
        }
        state.deletes.push((table.to_string(), deletes.to_vec()));
        Ok(())
    }

    fn close(&self) {
        self.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Column};
    use crate::store::DeleteTarget;

    fn row(key: &str, cells: &[(&str, &str, &str)]) -> RowResult {
        RowResult::new(
            RowKey::from(key),
            cells
                .iter()
                .map(|(f, q, v)| Cell::new(Column::new(*f, *q), v.as_bytes().to_vec(), 1, 0, None))
                .collect(),
        )
    }

    #[test]
    fn test_get_serves_staged_rows_in_range() {
        let transport = RecordingTransport::new();
        transport.stage("t", row("a", &[("f", "q", "1")]));
        transport.stage("t", row("c", &[("f", "q", "3")]));
        transport.stage("other", row("b", &[("f", "q", "2")]));

        let rows = transport
            .get("t", &RowRange::between("a", "b"), &ColumnFilter::all())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row(), &RowKey::from("a"));
        assert_eq!(transport.get_count(), 1);
    }

    #[test]
    fn test_get_applies_column_filter() {
        let transport = RecordingTransport::new();
        transport.stage("t", row("a", &[("f", "q", "1"), ("g", "q", "2")]));
        let rows = transport
            .get("t", &RowRange::all(), &ColumnFilter::all().family("g"))
            .unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].value(b"g", b"q"), Some(&b"2"[..]));
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let transport = RecordingTransport::new();
        transport.fail_next_put("offline");
        let mutation = RowMutation {
            row: RowKey::from("r"),
            cells: Vec::new(),
        };
        assert!(transport.put("t", &[mutation.clone()]).is_err());
        assert!(transport.put("t", &[mutation]).is_ok());
        assert_eq!(transport.put_batches().len(), 1);
    }

    #[test]
    fn test_records_deletes_and_rejects_after_close() {
        let transport = RecordingTransport::new();
        let delete = RowDelete {
            row: RowKey::from("r"),
            target: DeleteTarget::Row,
            visibility: None,
        };
        transport.delete("t", &[delete.clone()]).unwrap();
        assert_eq!(transport.delete_batches()[0].1, vec![delete.clone()]);

        transport.close();
        assert!(transport.is_closed());
        assert_eq!(transport.delete("t", &[delete]), Err(TransportError::Closed));
    }

    #[test]
    fn test_settings_debug_redacts_credentials() {
        let settings = ConnectionSettings {
            endpoints: vec!["zk1:2181".to_string()],
            connection_timeout: std::time::Duration::from_secs(10),
            credentials_ref: Some("vault://secret".to_string()),
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("vault"));
        assert!(rendered.contains("<redacted>"));
    }
}
