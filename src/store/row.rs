//! VersionedRow - the stored form of one row
//!
//! Layout:
//! - `cells`: one version chain per (column, timestamp), keyed so that
//!   iteration yields family, qualifier, then descending timestamp
//! - `tombstones`: delete markers, each with a scope and sequence id
//!
//! Visibility under a read view `R`:
//! 1. For each (column, timestamp), take the chain entry with the largest
//!    sequence id `<= R`
//! 2. That entry is invisible if a tombstone with sequence id `<= R`
//!    and greater than the entry's covers it
//! 3. Otherwise the entry is the visible cell for that timestamp
//!
//! A row is only ever touched under its own lock; nothing here locks.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::model::{Cell, Column};
use crate::visibility::VisibilityExpr;

use super::errors::{StoreError, StoreResult};
use super::read_view::ReadView;

/// Chain key: column first, newest timestamp first within a column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CellKey {
    column: Column,
    timestamp: Reverse<i64>,
}

/// A visibility expression kept in both source and parsed form.
#[derive(Debug, Clone)]
pub(crate) struct Label {
    text: String,
    expr: VisibilityExpr,
}

impl Label {
    pub(crate) fn parse(text: &str) -> StoreResult<Self> {
        let text = text.trim().to_string();
        let expr =
            VisibilityExpr::parse(&text).map_err(|source| StoreError::InvalidVisibility {
                expression: text.clone(),
                source,
            })?;
        Ok(Self { text, expr })
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn expr(&self) -> &VisibilityExpr {
        &self.expr
    }
}

#[derive(Debug, Clone)]
struct CellVersion {
    sequence_id: u64,
    value: Vec<u8>,
    label: Option<Label>,
}

/// What a delete marker covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeleteScope {
    Row,
    Column(Column),
}

impl DeleteScope {
    fn covers(&self, column: &Column) -> bool {
        match self {
            DeleteScope::Row => true,
            DeleteScope::Column(c) => c == column,
        }
    }
}

#[derive(Debug, Clone)]
struct Tombstone {
    scope: DeleteScope,
    label: Option<String>,
    sequence_id: u64,
}

impl Tombstone {
    /// Whether this marker hides `version`, ignoring read views.
    fn hides(&self, column: &Column, version: &CellVersion) -> bool {
        version.sequence_id < self.sequence_id
            && self.scope.covers(column)
            && match &self.label {
                None => true,
                Some(label) => version.label.as_ref().is_some_and(|l| l.text() == label),
            }
    }
}

/// A cell ready to be written: timestamp resolved, label parsed.
#[derive(Debug, Clone)]
pub(crate) struct PreparedCell {
    pub(crate) column: Column,
    pub(crate) timestamp: i64,
    pub(crate) value: Vec<u8>,
    pub(crate) label: Option<Label>,
}

/// A borrowed view of one visible cell.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VisibleCell<'a> {
    pub(crate) column: &'a Column,
    pub(crate) timestamp: i64,
    pub(crate) sequence_id: u64,
    pub(crate) value: &'a [u8],
    pub(crate) label: Option<&'a Label>,
}

impl VisibleCell<'_> {
    pub(crate) fn to_cell(self) -> Cell {
        Cell::new(
            self.column.clone(),
            self.value.to_vec(),
            self.timestamp,
            self.sequence_id,
            self.label.map(|l| l.text().to_string()),
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct VersionedRow {
    cells: BTreeMap<CellKey, Vec<CellVersion>>,
    tombstones: Vec<Tombstone>,
}

impl VersionedRow {
    /// Writes every cell under one sequence id.
    ///
    /// Rewriting the same (column, timestamp) twice within one put keeps
    /// the last value.
    pub(crate) fn apply_put(&mut self, sequence_id: u64, cells: Vec<PreparedCell>) {
        for cell in cells {
            let key = CellKey {
                column: cell.column,
                timestamp: Reverse(cell.timestamp),
            };
            let version = CellVersion {
                sequence_id,
                value: cell.value,
                label: cell.label,
            };
            let chain = self.cells.entry(key).or_default();
            match chain.last_mut() {
                Some(last) if last.sequence_id == sequence_id => *last = version,
                _ => chain.push(version),
            }
        }
    }

    pub(crate) fn apply_delete(&mut self, scope: DeleteScope, label: Option<String>, sequence_id: u64) {
        self.tombstones.push(Tombstone {
            scope,
            label,
            sequence_id,
        });
    }

    fn resolve<'a>(&'a self, key: &CellKey, chain: &'a [CellVersion], view: ReadView) -> Option<&'a CellVersion> {
        let version = chain.iter().rev().find(|v| view.sees(v.sequence_id))?;
        let masked = self
            .tombstones
            .iter()
            .any(|t| view.sees(t.sequence_id) && t.hides(&key.column, version));
        (!masked).then_some(version)
    }

    /// Every cell visible under `view`, in canonical order.
    pub(crate) fn visible(&self, view: ReadView) -> impl Iterator<Item = VisibleCell<'_>> + '_ {
        self.cells.iter().filter_map(move |(key, chain)| {
            self.resolve(key, chain, view).map(|v| VisibleCell {
                column: &key.column,
                timestamp: key.timestamp.0,
                sequence_id: v.sequence_id,
                value: &v.value,
                label: v.label.as_ref(),
            })
        })
    }

    /// Whether a delete with this scope and label would hide anything now.
    pub(crate) fn has_visible(&self, scope: &DeleteScope, label: Option<&str>) -> bool {
        self.visible(ReadView::latest()).any(|cell| {
            scope.covers(cell.column)
                && match label {
                    None => true,
                    Some(label) => cell.label.is_some_and(|l| l.text() == label),
                }
        })
    }

    /// Value of the newest visible version of `column`, labels ignored.
    pub(crate) fn current_value(&self, column: &Column) -> Option<&[u8]> {
        let lo = CellKey {
            column: column.clone(),
            timestamp: Reverse(i64::MAX),
        };
        let hi = CellKey {
            column: column.clone(),
            timestamp: Reverse(i64::MIN),
        };
        self.cells
            .range((Bound::Included(lo), Bound::Included(hi)))
            .find_map(|(key, chain)| self.resolve(key, chain, ReadView::latest()))
            .map(|v| v.value.as_slice())
    }

    /// Drops versions and tombstones no reader at or above `floor` can observe.
    pub(crate) fn prune(&mut self, floor: u64) {
        for chain in self.cells.values_mut() {
            let at_or_below = chain.partition_point(|v| v.sequence_id <= floor);
            if at_or_below > 1 {
                chain.drain(..at_or_below - 1);
            }
        }

        let settled: Vec<&Tombstone> = self
            .tombstones
            .iter()
            .filter(|t| t.sequence_id <= floor)
            .collect();
        if !settled.is_empty() {
            for (key, chain) in self.cells.iter_mut() {
                chain.retain(|v| !settled.iter().any(|t| t.hides(&key.column, v)));
            }
        }
        self.cells.retain(|_, chain| !chain.is_empty());
        self.tombstones.retain(|t| t.sequence_id > floor);
    }

    /// Number of stored (column, timestamp) chains.
    pub(crate) fn chain_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of stored chain entries across all chains.
    pub(crate) fn version_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub(crate) fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }
}
