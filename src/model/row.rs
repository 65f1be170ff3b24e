//! RowResult - a row key and its ordered cells

use super::{Cell, RowKey};

/// A row as produced by a read.
///
/// Cells are always sorted by family, then qualifier, then descending
/// timestamp, so the first cell of each column is its latest version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowResult {
    row: RowKey,
    cells: Vec<Cell>,
}

impl RowResult {
    /// Builds a result, sorting `cells` into canonical order.
    pub fn new(row: RowKey, mut cells: Vec<Cell>) -> Self {
        cells.sort_by(|a, b| {
            a.column()
                .cmp(b.column())
                .then_with(|| b.timestamp().cmp(&a.timestamp()))
        });
        Self { row, cells }
    }

    #[inline]
    pub fn row(&self) -> &RowKey {
        &self.row
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Latest version of `(family, qualifier)`.
    pub fn latest(&self, family: &[u8], qualifier: &[u8]) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|c| c.column().is(family, qualifier))
    }

    /// Value of the latest version of `(family, qualifier)`.
    pub fn value(&self, family: &[u8], qualifier: &[u8]) -> Option<&[u8]> {
        self.latest(family, qualifier).map(Cell::value)
    }

    /// All versions of one column, newest first.
    pub fn versions<'a>(
        &'a self,
        family: &'a [u8],
        qualifier: &'a [u8],
    ) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells
            .iter()
            .filter(move |c| c.column().is(family, qualifier))
    }

    pub fn into_parts(self) -> (RowKey, Vec<Cell>) {
        (self.row, self.cells)
    }
}
