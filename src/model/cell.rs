//! Cell - a single versioned datum, and PutColumn - a cell to be written
//!
//! A cell is immutable once produced by the store. Its identity inside a
//! row is (family, qualifier, timestamp); the sequence id records which
//! write produced the value that is currently visible.

use super::Column;

/// A single immutable cell as returned by reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    column: Column,
    value: Vec<u8>,
    timestamp: i64,
    sequence_id: u64,
    visibility: Option<String>,
}

impl Cell {
    pub fn new(
        column: Column,
        value: Vec<u8>,
        timestamp: i64,
        sequence_id: u64,
        visibility: Option<String>,
    ) -> Self {
        Self {
            column,
            value,
            timestamp,
            sequence_id,
            visibility,
        }
    }

    #[inline]
    pub fn column(&self) -> &Column {
        &self.column
    }

    #[inline]
    pub fn family(&self) -> &[u8] {
        self.column.family()
    }

    #[inline]
    pub fn qualifier(&self) -> &[u8] {
        self.column.qualifier()
    }

    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The store-wide sequence number of the write that produced this value.
    #[inline]
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// The visibility expression attached at write time, if any.
    #[inline]
    pub fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

/// A column value to write.
///
/// `timestamp: None` means the store assigns the current epoch millis at
/// write time; every column of one put without an explicit timestamp
/// shares the same assigned value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutColumn {
    pub column: Column,
    pub value: Vec<u8>,
    pub timestamp: Option<i64>,
    pub visibility: Option<String>,
}

impl PutColumn {
    pub fn new(
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            column: Column::new(family, qualifier),
            value: value.into(),
            timestamp: None,
            visibility: None,
        }
    }

    /// Pins the cell timestamp.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attaches a visibility expression such as `secret&(ops|admin)`.
    pub fn with_visibility(mut self, expression: impl Into<String>) -> Self {
        self.visibility = Some(expression.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_column_builder() {
        let put = PutColumn::new("cf", "q", "v").at(42).with_visibility("a&b");
        assert_eq!(put.column, Column::new("cf", "q"));
        assert_eq!(put.value, b"v");
        assert_eq!(put.timestamp, Some(42));
        assert_eq!(put.visibility.as_deref(), Some("a&b"));
    }

    #[test]
    fn test_cell_accessors() {
        let cell = Cell::new(Column::new("cf", "q"), b"v".to_vec(), 7, 3, None);
        assert_eq!(cell.family(), b"cf");
        assert_eq!(cell.qualifier(), b"q");
        assert_eq!(cell.timestamp(), 7);
        assert_eq!(cell.sequence_id(), 3);
        assert!(cell.visibility().is_none());
    }
}
