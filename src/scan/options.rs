//! Scan parameters
//!
//! `ScanOptions` is built once and never mutated by the scan it drives.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::time::Duration;

use regex::bytes::Regex;

use crate::model::{Column, ModelError, RowKey};
use crate::store::{CancellationToken, OpControl};
use crate::visibility::Authorizations;

use super::errors::{ScanError, ScanResult};

/// A contiguous interval of row keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRange {
    pub start: Bound<RowKey>,
    pub end: Bound<RowKey>,
}

impl RowRange {
    /// Every row.
    pub fn all() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// `start` inclusive to `end` exclusive. An empty key on either side
    /// leaves that side open.
    pub fn between(start: impl Into<RowKey>, end: impl Into<RowKey>) -> Self {
        Self {
            start: open_if_empty(start.into(), Bound::Included),
            end: open_if_empty(end.into(), Bound::Excluded),
        }
    }

    /// `start` inclusive to `end` inclusive.
    pub fn between_inclusive(start: impl Into<RowKey>, end: impl Into<RowKey>) -> Self {
        Self {
            start: open_if_empty(start.into(), Bound::Included),
            end: open_if_empty(end.into(), Bound::Included),
        }
    }

    /// Every row at or after `start`.
    pub fn starting_at(start: impl Into<RowKey>) -> Self {
        Self {
            start: open_if_empty(start.into(), Bound::Included),
            end: Bound::Unbounded,
        }
    }

    /// Exactly one row.
    pub fn point(row: impl Into<RowKey>) -> Self {
        let row = row.into();
        Self {
            start: Bound::Included(row.clone()),
            end: Bound::Included(row),
        }
    }

    /// Every row whose key starts with `prefix`.
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        let prefix = prefix.into();
        let end = match prefix_successor(&prefix) {
            Some(next) => Bound::Excluded(RowKey::new(next)),
            None => Bound::Unbounded,
        };
        Self {
            start: open_if_empty(RowKey::new(prefix), Bound::Included),
            end,
        }
    }

    pub fn contains(&self, row: &RowKey) -> bool {
        let above = match &self.start {
            Bound::Included(s) => row >= s,
            Bound::Excluded(s) => row > s,
            Bound::Unbounded => true,
        };
        let below = match &self.end {
            Bound::Included(e) => row <= e,
            Bound::Excluded(e) => row < e,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// True when no key can fall inside the range.
    pub fn is_empty(&self) -> bool {
        use Bound::{Excluded, Included};
        match (&self.start, &self.end) {
            (Included(s), Included(e)) => s > e,
            (Included(s), Excluded(e)) | (Excluded(s), Included(e)) | (Excluded(s), Excluded(e)) => {
                s >= e
            }
            _ => false,
        }
    }

    pub(crate) fn bounds(&self) -> (Bound<&RowKey>, Bound<&RowKey>) {
        (self.start.as_ref(), self.end.as_ref())
    }
}

impl Default for RowRange {
    fn default() -> Self {
        Self::all()
    }
}

fn open_if_empty(key: RowKey, bound: fn(RowKey) -> Bound<RowKey>) -> Bound<RowKey> {
    if key.is_empty() {
        Bound::Unbounded
    } else {
        bound(key)
    }
}

/// Smallest key greater than every key starting with `prefix`, if any.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut next = prefix.to_vec();
    while let Some(last) = next.pop() {
        if last < u8::MAX {
            next.push(last + 1);
            return Some(next);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum ColumnSelector {
    Family(Vec<u8>),
    Column(Column),
}

/// Which columns a scan returns. Empty means every column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    selectors: BTreeSet<ColumnSelector>,
}

impl ColumnFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn columns(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            selectors: columns.into_iter().map(ColumnSelector::Column).collect(),
        }
    }

    /// Adds one (family, qualifier) pair.
    pub fn column(mut self, column: Column) -> Self {
        self.selectors.insert(ColumnSelector::Column(column));
        self
    }

    /// Adds every qualifier of `family`.
    pub fn family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.selectors.insert(ColumnSelector::Family(family.into()));
        self
    }

    /// Parses `"family:qualifier"` and bare `"family"` entries.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> ScanResult<Self> {
        let mut filter = Self::all();
        for spec in specs {
            let spec = spec.as_ref();
            filter = if spec.contains(':') {
                filter.column(Column::parse(spec).map_err(store_input)?)
            } else if spec.is_empty() {
                return Err(store_input(ModelError::InvalidColumnSpec(spec.to_string())));
            } else {
                filter.family(spec.as_bytes())
            };
        }
        Ok(filter)
    }

    pub fn is_all(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn matches(&self, column: &Column) -> bool {
        self.is_all()
            || self.selectors.iter().any(|s| match s {
                ColumnSelector::Family(f) => column.family() == f.as_slice(),
                ColumnSelector::Column(c) => c == column,
            })
    }
}

fn store_input(e: ModelError) -> ScanError {
    ScanError::Store(e.into())
}

/// Cell timestamp window: `min` inclusive, `max` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn at_least(min: i64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.min.map_or(true, |min| timestamp >= min)
            && self.max.map_or(true, |max| timestamp < max)
    }

    pub fn validate(&self) -> ScanResult<()> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min >= max => Err(ScanError::InvalidTimeRange { min, max }),
            _ => Ok(()),
        }
    }
}

/// Everything that shapes one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub range: RowRange,
    pub columns: ColumnFilter,
    /// `None` hides every labelled cell
    pub authorizations: Option<Authorizations>,
    pub time_range: TimeRange,
    /// Newest versions kept per column; `None` keeps all
    pub max_versions: Option<usize>,
    /// Stop after this many rows
    pub limit: Option<usize>,
    pub reversed: bool,
    pub row_regex: Option<Regex>,
    pub cancel: Option<CancellationToken>,
    pub timeout: Option<Duration>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, range: RowRange) -> Self {
        self.range = range;
        self
    }

    pub fn columns(mut self, columns: ColumnFilter) -> Self {
        self.columns = columns;
        self
    }

    pub fn authorizations(mut self, auths: Authorizations) -> Self {
        self.authorizations = Some(auths);
        self
    }

    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = range;
        self
    }

    /// Only cells with `timestamp >= min`.
    pub fn min_timestamp(mut self, min: i64) -> Self {
        self.time_range.min = Some(min);
        self
    }

    pub fn max_versions(mut self, versions: usize) -> Self {
        self.max_versions = Some(versions);
        self
    }

    pub fn limit(mut self, rows: usize) -> Self {
        self.limit = Some(rows);
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Only rows whose key matches `pattern` (unanchored, on raw key bytes).
    pub fn row_regex(mut self, pattern: &str) -> ScanResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| ScanError::InvalidRowRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        self.row_regex = Some(regex);
        Ok(self)
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> ScanResult<()> {
        self.time_range.validate()?;
        if self.max_versions == Some(0) {
            return Err(ScanError::InvalidMaxVersions);
        }
        Ok(())
    }

    /// Operation control for a scan starting now.
    pub(crate) fn control(&self) -> OpControl {
        let mut ctl = OpControl::none();
        if let Some(token) = &self.cancel {
            ctl = ctl.with_cancel(token.clone());
        }
        if let Some(timeout) = self.timeout {
            ctl = ctl.with_timeout(timeout);
        }
        ctl
    }

    pub(crate) fn row_matches(&self, row: &RowKey) -> bool {
        self.row_regex
            .as_ref()
            .map_or(true, |re| re.is_match(row.as_bytes()))
    }
}
