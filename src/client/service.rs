//! ClientService - the facade callers use
//!
//! Lifecycle:
//! 1. `enable` validates the config, opens the transport, creates the
//!    configured tables and hydrates each one from the transport
//! 2. verbs run against per-table row stores, writing through to the
//!    transport under the row lock before applying locally
//! 3. `disable` closes the transport
//!
//! A transport failure aborts the operation with nothing applied and is
//! returned to the caller as a resource error; nothing is retried here.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::model::{Column, PutColumn, RowKey, RowResult, TableName};
use crate::observability::{log_event, Event, MetricsRegistry, MetricsSnapshot, OperationScope};
use crate::scan::{self, ColumnFilter, RowRange, ScanOptions, Scanner};
use crate::store::{Clock, Delete, OpControl, RowStore, StoreError};
use crate::transport::{RowDelete, RowMutation, Transport, TransportError};

use super::config::ServiceConfig;
use super::errors::{ClientError, ClientResult};
use super::handler::ResultHandler;

/// One row of a batched put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRow {
    pub row: RowKey,
    pub columns: Vec<PutColumn>,
}

impl PutRow {
    pub fn new(row: impl Into<RowKey>, columns: Vec<PutColumn>) -> Self {
        Self {
            row: row.into(),
            columns,
        }
    }
}

/// One cell-level delete: every version of `column` in `row`, optionally
/// restricted to cells labelled exactly `visibility`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub row: RowKey,
    pub column: Column,
    pub visibility: Option<String>,
}

impl DeleteRequest {
    pub fn new(row: impl Into<RowKey>, column: Column) -> Self {
        Self {
            row: row.into(),
            column,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, label: impl Into<String>) -> Self {
        self.visibility = Some(label.into());
        self
    }
}

pub struct ClientService {
    config: ServiceConfig,
    transport: Arc<dyn Transport>,
    tables: RwLock<BTreeMap<String, Arc<RowStore>>>,
    metrics: Arc<MetricsRegistry>,
    clock: Option<Clock>,
}

impl ClientService {
    /// Validates `config`, connects `transport`, and creates and hydrates
    /// every configured table.
    pub fn enable(config: ServiceConfig, transport: Arc<dyn Transport>) -> ClientResult<Self> {
        Self::enable_inner(config, transport, None)
    }

    /// `enable` with a fixed source of server-assigned timestamps.
    pub fn enable_with_clock(
        config: ServiceConfig,
        transport: Arc<dyn Transport>,
        clock: Clock,
    ) -> ClientResult<Self> {
        Self::enable_inner(config, transport, Some(clock))
    }

    fn enable_inner(
        config: ServiceConfig,
        transport: Arc<dyn Transport>,
        clock: Option<Clock>,
    ) -> ClientResult<Self> {
        let endpoints = config.cluster_endpoints.len().to_string();
        log_event(Event::ServiceEnableBegin, &[("endpoints", endpoints.as_str())]);

        if let Err(e) = config.validate() {
            log_event(
                Event::ConfigRejected,
                &[("code", e.code()), ("reason", e.to_string().as_str())],
            );
            return Err(e);
        }

        if let Err(e) = transport.open(&config.connection_settings()) {
            let err = ClientError::from(e);
            log_event(
                Event::ServiceEnableFailed,
                &[("code", err.code()), ("reason", err.to_string().as_str())],
            );
            return Err(err);
        }

        let service = Self {
            tables: RwLock::new(BTreeMap::new()),
            metrics: Arc::new(MetricsRegistry::new()),
            config,
            transport,
            clock,
        };

        let tables = service.config.tables.clone();
        for table in &tables {
            if let Err(e) = service.create_table(table) {
                log_event(
                    Event::ServiceEnableFailed,
                    &[("code", e.code()), ("reason", e.to_string().as_str()), ("table", table.as_str())],
                );
                service.transport.close();
                return Err(e);
            }
        }

        let count = tables.len().to_string();
        log_event(Event::ServiceEnabled, &[("tables", count.as_str())]);
        Ok(service)
    }

    /// Closes the transport. The service cannot be used afterwards.
    pub fn disable(self) {
        self.transport.close();
        let tables = self.table_names().len().to_string();
        log_event(Event::ServiceDisabled, &[("tables", tables.as_str())]);
    }

    /// Creates `table` if it does not exist yet and hydrates it from the
    /// transport. Returns the number of rows loaded (0 if it existed).
    pub fn create_table(&self, table: &str) -> ClientResult<usize> {
        let name = TableName::new(table)?;
        if self.lookup(name.as_str())?.is_some() {
            return Ok(0);
        }

        let store = match &self.clock {
            Some(clock) => {
                let clock = Arc::clone(clock);
                RowStore::with_clock(move || clock())
            }
            None => RowStore::new(),
        };
        let rows = self.hydrate(name.as_str(), &store)?;

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("table map"))?;
        tables
            .entry(name.as_str().to_string())
            .or_insert_with(|| Arc::new(store));
        Ok(rows)
    }

    fn hydrate(&self, table: &str, store: &RowStore) -> ClientResult<usize> {
        let rows = self
            .transport
            .get(table, &RowRange::all(), &ColumnFilter::all())
            .map_err(|e| self.transport_failure("get", table, e))?;

        for result in &rows {
            let columns: Vec<PutColumn> = result
                .cells()
                .iter()
                .map(|cell| PutColumn {
                    column: cell.column().clone(),
                    value: cell.value().to_vec(),
                    timestamp: Some(cell.timestamp()),
                    visibility: cell.visibility().map(str::to_string),
                })
                .collect();
            if !columns.is_empty() {
                store.put(result.row(), &columns)?;
            }
        }

        let count = rows.len().to_string();
        log_event(Event::TableHydrated, &[("rows", count.as_str()), ("table", table)]);
        Ok(rows.len())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Inserts or overwrites `columns` in `row`, all or nothing.
    pub fn put(&self, table: &str, row: &RowKey, columns: &[PutColumn]) -> ClientResult<()> {
        let scope = OperationScope::new("PUT", &[("table", table)]);
        let result = self.put_row(table, row, columns);
        observe(scope, result)
    }

    /// Puts each row in order. Every row is atomic; the batch stops at the
    /// first failure, leaving earlier rows applied.
    pub fn put_batch(&self, table: &str, rows: &[PutRow]) -> ClientResult<usize> {
        let scope = OperationScope::new("PUT_BATCH", &[("table", table)]);
        let result = rows
            .iter()
            .try_for_each(|put| self.put_row(table, &put.row, &put.columns))
            .map(|()| rows.len());
        observe(scope, result)
    }

    fn put_row(&self, table: &str, row: &RowKey, columns: &[PutColumn]) -> ClientResult<()> {
        let store = self.store(table)?;
        store.put_with(row, columns, &self.write_control(), |cells| {
            let mutation = RowMutation {
                row: row.clone(),
                cells: cells.to_vec(),
            };
            self.transport
                .put(table, std::slice::from_ref(&mutation))
                .map_err(|e| self.transport_failure("put", table, e))
        })?;
        self.metrics.record_put(columns.len());
        Ok(())
    }

    /// Writes `column` only if `(family, qualifier)` currently holds
    /// `expected` (`None`: must not exist). Returns whether it was written.
    pub fn check_and_put(
        &self,
        table: &str,
        row: &RowKey,
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        column: &PutColumn,
    ) -> ClientResult<bool> {
        let scope = OperationScope::new("CHECK_AND_PUT", &[("table", table)]);
        let result = self.store(table).and_then(|store| {
            store.check_and_put_with(
                row,
                family,
                qualifier,
                expected,
                column,
                &self.write_control(),
                |cells| {
                    let mutation = RowMutation {
                        row: row.clone(),
                        cells: cells.to_vec(),
                    };
                    self.transport
                        .put(table, std::slice::from_ref(&mutation))
                        .map_err(|e| self.transport_failure("put", table, e))
                },
            )
        });
        if let Ok(applied) = result {
            self.metrics.record_cas(applied);
        }
        observe(scope, result)
    }

    /// Deletes the whole row. Returns false if it held no data.
    pub fn delete(&self, table: &str, row: &RowKey) -> ClientResult<bool> {
        self.delete_one(table, row, &Delete::row())
    }

    /// Deletes the cells of `row` labelled exactly `label`.
    pub fn delete_with_visibility(
        &self,
        table: &str,
        row: &RowKey,
        label: &str,
    ) -> ClientResult<bool> {
        self.delete_one(table, row, &Delete::row().with_visibility(label))
    }

    pub fn delete_column(&self, table: &str, row: &RowKey, column: &Column) -> ClientResult<bool> {
        self.delete_one(table, row, &Delete::column(column.clone()))
    }

    pub fn delete_columns(
        &self,
        table: &str,
        row: &RowKey,
        columns: &[Column],
    ) -> ClientResult<bool> {
        self.delete_one(table, row, &Delete::columns(columns.to_vec()))
    }

    /// Deletes the cells of `columns` labelled exactly `label`, as one
    /// mutation.
    pub fn delete_columns_with_visibility(
        &self,
        table: &str,
        row: &RowKey,
        columns: &[Column],
        label: &str,
    ) -> ClientResult<bool> {
        self.delete_one(
            table,
            row,
            &Delete::columns(columns.to_vec()).with_visibility(label),
        )
    }

    /// Deletes each row in order, stopping at the first failure. Returns
    /// how many rows held data.
    pub fn delete_rows(&self, table: &str, rows: &[RowKey]) -> ClientResult<usize> {
        self.delete_many(table, rows.iter().map(|row| (row, Delete::row())))
    }

    pub fn delete_rows_with_visibility(
        &self,
        table: &str,
        rows: &[RowKey],
        label: &str,
    ) -> ClientResult<usize> {
        self.delete_many(
            table,
            rows.iter().map(|row| (row, Delete::row().with_visibility(label))),
        )
    }

    /// Applies cell-level deletes in order, stopping at the first failure.
    /// Returns how many removed data.
    pub fn delete_cells(&self, table: &str, requests: &[DeleteRequest]) -> ClientResult<usize> {
        self.delete_many(
            table,
            requests.iter().map(|req| {
                let delete = Delete::column(req.column.clone());
                let delete = match &req.visibility {
                    Some(label) => delete.with_visibility(label.as_str()),
                    None => delete,
                };
                (&req.row, delete)
            }),
        )
    }

    fn delete_one(&self, table: &str, row: &RowKey, delete: &Delete) -> ClientResult<bool> {
        let scope = OperationScope::new("DELETE", &[("table", table)]);
        let result = self.delete_row(table, row, delete);
        observe(scope, result)
    }

    fn delete_many<'r>(
        &self,
        table: &str,
        deletes: impl Iterator<Item = (&'r RowKey, Delete)>,
    ) -> ClientResult<usize> {
        let scope = OperationScope::new("DELETE_BATCH", &[("table", table)]);
        let mut removed = 0;
        let mut result = Ok(());
        for (row, delete) in deletes {
            match self.delete_row(table, row, &delete) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        observe(scope, result.map(|()| removed))
    }

    fn delete_row(&self, table: &str, row: &RowKey, delete: &Delete) -> ClientResult<bool> {
        let store = self.store(table)?;
        let removed = store.delete_with(row, delete, &self.write_control(), || {
            let request = RowDelete {
                row: row.clone(),
                target: delete.target().clone(),
                visibility: delete.visibility().map(str::to_string),
            };
            self.transport
                .delete(table, std::slice::from_ref(&request))
                .map_err(|e| self.transport_failure("delete", table, e))
        })?;
        if removed {
            self.metrics.increment_deletes();
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Pushes every matching row to `handler`. Returns the number of rows
    /// delivered. On error, rows already delivered stay delivered.
    pub fn scan<H: ResultHandler + ?Sized>(
        &self,
        table: &str,
        options: &ScanOptions,
        handler: &mut H,
    ) -> ClientResult<usize> {
        let scope = OperationScope::new("SCAN", &[("table", table)]);
        let result = self.scanner(table, options).and_then(|scanner| {
            let mut delivered = 0;
            for row in scanner {
                let row = row?;
                handler.handle(row.row(), row.cells());
                delivered += 1;
            }
            Ok(delivered)
        });
        observe(scope, result)
    }

    /// Opens a pull-style scanner. Config defaults fill in an unset
    /// version cap and deadline.
    pub fn scanner(&self, table: &str, options: &ScanOptions) -> ClientResult<Scanner> {
        let store = self.store(table)?;
        let options = self.with_defaults(options.clone());
        Ok(Scanner::open_observed(
            store,
            options,
            Some(Arc::clone(&self.metrics)),
        )?)
    }

    /// Point lookup of `row` restricted to `columns` (empty: all columns).
    pub fn scan_row(
        &self,
        table: &str,
        row: &RowKey,
        columns: &ColumnFilter,
    ) -> ClientResult<Option<RowResult>> {
        self.scan_row_with(table, row, &ScanOptions::new().columns(columns.clone()))
    }

    /// Point lookup with full scan options (labels, time range, versions).
    pub fn scan_row_with(
        &self,
        table: &str,
        row: &RowKey,
        options: &ScanOptions,
    ) -> ClientResult<Option<RowResult>> {
        let store = self.store(table)?;
        let options = self.with_defaults(options.clone());
        Ok(scan::scan_row(&store, row, &options)?)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn table_names(&self) -> Vec<String> {
        match self.tables.read() {
            Ok(tables) => tables.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    /// The row store behind `table`.
    pub fn store(&self, table: &str) -> ClientResult<Arc<RowStore>> {
        self.lookup(table)?
            .ok_or_else(|| ClientError::UnknownTable(table.to_string()))
    }

    fn lookup(&self, table: &str) -> ClientResult<Option<Arc<RowStore>>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("table map"))?;
        Ok(tables.get(table).cloned())
    }

    /// Bounds the wait for a row lock by the configured operation timeout.
    fn write_control(&self) -> OpControl {
        match self.config.operation_timeout() {
            Some(timeout) => OpControl::none().with_timeout(timeout),
            None => OpControl::none(),
        }
    }

    fn with_defaults(&self, mut options: ScanOptions) -> ScanOptions {
        if options.max_versions.is_none() {
            options.max_versions = self.config.max_versions;
        }
        if options.timeout.is_none() {
            options.timeout = self.config.operation_timeout();
        }
        options
    }

    fn transport_failure(&self, op: &str, table: &str, e: TransportError) -> ClientError {
        self.metrics.increment_transport_failures();
        log_event(
            Event::TransportFailure,
            &[("code", e.code()), ("op", op), ("reason", e.to_string().as_str()), ("table", table)],
        );
        ClientError::Transport(e)
    }
}

impl fmt::Debug for ClientService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientService")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("tables", &self.table_names())
            .finish()
    }
}

/// Closes `scope` according to `result`.
fn observe<T>(scope: OperationScope, result: ClientResult<T>) -> ClientResult<T> {
    match &result {
        Ok(_) => scope.complete(&[]),
        Err(e) => scope.fail(e.code(), &e.to_string()),
    }
    result
}
