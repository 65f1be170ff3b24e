//! Scanner - lazy, snapshot-bound row iteration
//!
//! A scanner pins a read view when it is opened and yields one row at a
//! time. The row map lock is held only while seeking the next row key and
//! the row lock only while copying out that row's cells, so writers are
//! never blocked for the duration of a scan.
//!
//! Read-time merge, per row:
//! 1. version chain resolution against the pinned view
//! 2. tombstone masking
//! 3. label check against the scan's authorizations
//! 4. time range and column filter
//! 5. top-K newest versions per column
//!
//! Rows with no surviving cells are skipped. After the first error the
//! scanner is exhausted.

use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use uuid::Uuid;

use crate::model::{Cell, Column, RowKey, RowResult};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::store::{read_row, Label, OpControl, ReadView, RowStore, VersionedRow};
use crate::visibility;

use super::errors::{ScanError, ScanResult};
use super::options::ScanOptions;

pub struct Scanner {
    id: Uuid,
    store: Arc<RowStore>,
    /// `Some` until released
    view: Option<ReadView>,
    options: ScanOptions,
    ctl: OpControl,
    /// Last row key examined
    cursor: Option<RowKey>,
    delivered: usize,
    done: bool,
    interrupted: bool,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Scanner {
    /// Validates `options` and pins a read view on `store`.
    pub fn open(store: Arc<RowStore>, options: ScanOptions) -> ScanResult<Self> {
        Self::open_observed(store, options, None)
    }

    /// Like [`Scanner::open`], also tracking the scan in `metrics`.
    pub fn open_observed(
        store: Arc<RowStore>,
        options: ScanOptions,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> ScanResult<Self> {
        options.validate()?;
        let ctl = options.control();
        let view = store.read_view()?;
        if let Some(metrics) = &metrics {
            metrics.scan_opened();
        }
        Ok(Self {
            id: Uuid::new_v4(),
            store,
            view: Some(view),
            options,
            ctl,
            cursor: None,
            delivered: 0,
            done: false,
            interrupted: false,
            metrics,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The pinned view, until the scanner is exhausted.
    pub fn view(&self) -> Option<ReadView> {
        self.view
    }

    /// Rows yielded so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    fn advance(&mut self, view: ReadView) -> ScanResult<Option<RowResult>> {
        loop {
            if self.options.limit.is_some_and(|limit| self.delivered >= limit) {
                return Ok(None);
            }
            self.ctl.check()?;

            let (start, end) = self.options.range.bounds();
            let (lower, upper) = match (&self.cursor, self.options.reversed) {
                (None, _) => (start, end),
                (Some(cursor), false) => (Bound::Excluded(cursor), end),
                (Some(cursor), true) => (start, Bound::Excluded(cursor)),
            };
            let Some((row, slot)) = self.store.seek(lower, upper, self.options.reversed)? else {
                return Ok(None);
            };
            self.cursor = Some(row.clone());

            if !self.options.row_matches(&row) {
                continue;
            }
            let cells = {
                let guard = read_row(&slot, &self.ctl)?;
                select_cells(&guard, view, &self.options)
            };
            if cells.is_empty() {
                continue;
            }
            self.delivered += 1;
            return Ok(Some(RowResult::new(row, cells)));
        }
    }

    fn release(&mut self) {
        if let Some(view) = self.view.take() {
            self.store.release_view(view);
            if let Some(metrics) = &self.metrics {
                metrics.scan_closed(self.interrupted);
            }
        }
    }

    fn log_interruption(&self, error: &ScanError) {
        let event = match error {
            ScanError::Cancelled => Event::ScanCancelled,
            _ => Event::ScanTimedOut,
        };
        let id = self.id.to_string();
        let rows = self.delivered.to_string();
        log_event(event, &[("scan_id", id.as_str()), ("rows", rows.as_str())]);
    }
}

impl Iterator for Scanner {
    type Item = ScanResult<RowResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(view) = self.view else {
            self.done = true;
            return None;
        };
        let outcome = self.advance(view);
        match outcome {
            Ok(Some(row)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_rows_returned();
                }
                Some(Ok(row))
            }
            Ok(None) => {
                self.done = true;
                self.release();
                None
            }
            Err(e) => {
                self.done = true;
                if e.is_interrupted() {
                    self.interrupted = true;
                    self.log_interruption(&e);
                }
                self.release();
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Scanner {}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("id", &self.id)
            .field("view", &self.view)
            .field("delivered", &self.delivered)
            .field("done", &self.done)
            .finish()
    }
}

/// Applies the read-time merge to one row.
pub(crate) fn select_cells(row: &VersionedRow, view: ReadView, options: &ScanOptions) -> Vec<Cell> {
    let mut out = Vec::new();
    let mut current: Option<&Column> = None;
    let mut kept = 0usize;

    for cell in row.visible(view) {
        if !options.columns.matches(cell.column)
            || !options.time_range.contains(cell.timestamp)
            || !visibility::is_visible(
                cell.label.map(Label::expr),
                options.authorizations.as_ref(),
            )
        {
            continue;
        }
        if current != Some(cell.column) {
            current = Some(cell.column);
            kept = 0;
        }
        if options.max_versions.is_some_and(|k| kept >= k) {
            continue;
        }
        kept += 1;
        out.push(cell.to_cell());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PutColumn;
    use crate::scan::options::{ColumnFilter, RowRange, TimeRange};
    use crate::store::CancellationToken;
    use crate::visibility::Authorizations;

    fn key(s: &str) -> RowKey {
        RowKey::from(s)
    }

    fn store_with(rows: &[&str]) -> Arc<RowStore> {
        let store = RowStore::with_clock(|| 1_000);
        for row in rows {
            store
                .put(&key(row), &[PutColumn::new("f", "q", row.as_bytes())])
                .unwrap();
        }
        Arc::new(store)
    }

    fn rows(scanner: Scanner) -> Vec<String> {
        scanner
            .map(|r| r.unwrap().row().to_string())
            .collect()
    }

    #[test]
    fn test_forward_and_reversed_order() {
        let store = store_with(&["b", "a", "c"]);
        let forward = Scanner::open(Arc::clone(&store), ScanOptions::new()).unwrap();
        assert_eq!(rows(forward), vec!["a", "b", "c"]);

        let reversed = Scanner::open(store, ScanOptions::new().reversed(true)).unwrap();
        assert_eq!(rows(reversed), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_range_and_limit() {
        let store = store_with(&["a", "b", "c", "d"]);
        let options = ScanOptions::new().range(RowRange::between("b", "d"));
        assert_eq!(rows(Scanner::open(Arc::clone(&store), options).unwrap()), vec!["b", "c"]);

        let limited = ScanOptions::new().limit(3).reversed(true);
        assert_eq!(rows(Scanner::open(store, limited).unwrap()), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_view_pinned_at_open() {
        let store = store_with(&["a"]);
        let scanner = Scanner::open(Arc::clone(&store), ScanOptions::new()).unwrap();
        store
            .put(&key("b"), &[PutColumn::new("f", "q", "late")])
            .unwrap();
        assert_eq!(rows(scanner), vec!["a"]);
    }

    #[test]
    fn test_view_released_on_exhaustion_and_drop() {
        let store = store_with(&["a", "b"]);
        let mut scanner = Scanner::open(Arc::clone(&store), ScanOptions::new()).unwrap();
        assert_eq!(store.active_views(), 1);
        scanner.next();
        drop(scanner);
        assert_eq!(store.active_views(), 0);

        let scanner = Scanner::open(Arc::clone(&store), ScanOptions::new()).unwrap();
        assert_eq!(scanner.count(), 2);
        assert_eq!(store.active_views(), 0);
    }

    #[test]
    fn test_cancel_yields_one_error_then_ends() {
        let store = store_with(&["a", "b", "c"]);
        let token = CancellationToken::new();
        let metrics = Arc::new(MetricsRegistry::new());
        let mut scanner = Scanner::open_observed(
            Arc::clone(&store),
            ScanOptions::new().cancel_with(token.clone()),
            Some(Arc::clone(&metrics)),
        )
        .unwrap();

        assert!(scanner.next().unwrap().is_ok());
        token.cancel();
        assert!(matches!(scanner.next(), Some(Err(ScanError::Cancelled))));
        assert!(scanner.next().is_none());
        assert_eq!(store.active_views(), 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.scans_cancelled, 1);
        assert_eq!(snapshot.open_scanners, 0);
        assert_eq!(snapshot.rows_returned, 1);
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let store = store_with(&["a"]);
        let options = ScanOptions::new().timeout(std::time::Duration::ZERO);
        let mut scanner = Scanner::open(store, options).unwrap();
        assert!(matches!(scanner.next(), Some(Err(ScanError::TimedOut))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_rows_without_surviving_cells_are_skipped() {
        let store = store_with(&["a", "b"]);
        store.delete(&key("a")).unwrap();
        let options = ScanOptions::new().columns(ColumnFilter::parse(&["f:q"]).unwrap());
        assert_eq!(rows(Scanner::open(Arc::clone(&store), options).unwrap()), vec!["b"]);

        let other = ScanOptions::new().columns(ColumnFilter::parse(&["g"]).unwrap());
        assert!(rows(Scanner::open(store, other).unwrap()).is_empty());
    }

    #[test]
    fn test_top_k_and_time_range() {
        let store = RowStore::new();
        for ts in [10, 20, 30] {
            store
                .put(&key("r"), &[PutColumn::new("f", "q", ts.to_string()).at(ts)])
                .unwrap();
        }
        let store = Arc::new(store);

        let options = ScanOptions::new().max_versions(2);
        let row = Scanner::open(Arc::clone(&store), options).unwrap().next().unwrap().unwrap();
        let stamps: Vec<i64> = row.cells().iter().map(Cell::timestamp).collect();
        assert_eq!(stamps, vec![30, 20]);

        let options = ScanOptions::new().time_range(TimeRange::between(10, 30)).max_versions(1);
        let row = Scanner::open(store, options).unwrap().next().unwrap().unwrap();
        let stamps: Vec<i64> = row.cells().iter().map(Cell::timestamp).collect();
        assert_eq!(stamps, vec![20]);
    }

    #[test]
    fn test_labels_filtered_by_authorizations() {
        let store = RowStore::with_clock(|| 5);
        store
            .put(
                &key("r"),
                &[
                    PutColumn::new("f", "open", "o"),
                    PutColumn::new("f", "secret", "s").with_visibility("pii&!guest"),
                ],
            )
            .unwrap();
        let store = Arc::new(store);

        let anonymous = Scanner::open(Arc::clone(&store), ScanOptions::new()).unwrap();
        let row = anonymous.into_iter().next().unwrap().unwrap();
        assert_eq!(row.len(), 1);

        let granted = ScanOptions::new().authorizations(Authorizations::new(["pii"]));
        let row = Scanner::open(Arc::clone(&store), granted).unwrap().next().unwrap().unwrap();
        assert_eq!(row.value(b"f", b"secret"), Some(&b"s"[..]));

        let denied = ScanOptions::new().authorizations(Authorizations::new(["pii", "guest"]));
        let row = Scanner::open(store, denied).unwrap().next().unwrap().unwrap();
        assert!(row.value(b"f", b"secret").is_none());
    }

    #[test]
    fn test_row_regex_filters_keys() {
        let store = store_with(&["user-1", "user-2", "admin-1"]);
        let options = ScanOptions::new().row_regex("^user-").unwrap();
        assert_eq!(rows(Scanner::open(store, options).unwrap()), vec!["user-1", "user-2"]);
    }

    #[test]
    fn test_invalid_options_take_no_view() {
        let store = store_with(&["a"]);
        let err = Scanner::open(Arc::clone(&store), ScanOptions::new().max_versions(0)).unwrap_err();
        assert!(matches!(err, ScanError::InvalidMaxVersions));
        assert_eq!(store.active_views(), 0);
    }
}
