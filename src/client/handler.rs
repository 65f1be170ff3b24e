//! Push-style consumer for scan results

use crate::model::{Cell, RowKey};

/// Receives one callback per row of a scan, in scan order.
///
/// Any `FnMut(&RowKey, &[Cell])` closure is a handler.
pub trait ResultHandler {
    fn handle(&mut self, row: &RowKey, cells: &[Cell]);
}

impl<F> ResultHandler for F
where
    F: FnMut(&RowKey, &[Cell]),
{
    fn handle(&mut self, row: &RowKey, cells: &[Cell]) {
        self(row, cells)
    }
}

/// Collects every delivered row as `(row, cells)`.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    pub rows: Vec<(RowKey, Vec<Cell>)>,
}

impl ResultHandler for CollectingHandler {
    fn handle(&mut self, row: &RowKey, cells: &[Cell]) {
        self.rows.push((row.clone(), cells.to_vec()));
    }
}
