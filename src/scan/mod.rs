//! Scan engine
//!
//! Range scans and point lookups over a `RowStore`:
//! - `ScanOptions` - range, column filter, labels, time window, top-K,
//!   row limit, direction, row-key regex, cancellation and deadline
//! - `Scanner` - lazy iterator bound to a read view taken at open
//! - `scan_row` - single-row lookup with the same read-time merge

mod errors;
mod options;
mod scanner;

pub use errors::{ScanError, ScanResult};
pub use options::{ColumnFilter, RowRange, ScanOptions, TimeRange};
pub use scanner::Scanner;

pub use crate::store::{CancellationToken, OpControl};

use crate::model::{RowKey, RowResult};
use crate::store::{read_row, ReadView, RowStore};

/// Reads one row at the latest state through the scan filters.
///
/// The range, limit, direction and row regex of `options` are ignored.
/// Returns `None` when the row is absent or no cell survives.
pub fn scan_row(
    store: &RowStore,
    row: &RowKey,
    options: &ScanOptions,
) -> ScanResult<Option<RowResult>> {
    options.validate()?;
    let ctl = options.control();
    ctl.check()?;
    let Some(slot) = store.slot(row)? else {
        return Ok(None);
    };
    let cells = {
        let guard = read_row(&slot, &ctl)?;
        scanner::select_cells(&guard, ReadView::latest(), options)
    };
    Ok((!cells.is_empty()).then(|| RowResult::new(row.clone(), cells)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, PutColumn};

    #[test]
    fn test_scan_row_applies_column_filter() {
        let store = RowStore::with_clock(|| 1);
        let row = RowKey::from("r");
        store
            .put(
                &row,
                &[PutColumn::new("a", "x", "1"), PutColumn::new("b", "y", "2")],
            )
            .unwrap();

        let options = ScanOptions::new().columns(ColumnFilter::columns([Column::new("b", "y")]));
        let result = scan_row(&store, &row, &options).unwrap().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.value(b"b", b"y"), Some(&b"2"[..]));

        let missing = ScanOptions::new().columns(ColumnFilter::columns([Column::new("c", "z")]));
        assert!(scan_row(&store, &row, &missing).unwrap().is_none());
    }

    #[test]
    fn test_scan_row_absent() {
        let store = RowStore::new();
        assert!(scan_row(&store, &RowKey::from("nope"), &ScanOptions::new())
            .unwrap()
            .is_none());
        assert_eq!(store.row_count().unwrap(), 0);
    }
}
