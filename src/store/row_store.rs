//! RowStore - ordered, versioned, row-locked cell storage
//!
//! Concurrency model:
//! - The row map lock is held only long enough to find or insert a row slot
//! - Every mutation of a row happens under that row's exclusive lock
//! - Sequence ids are assigned under the row lock, so one row's writes are
//!   totally ordered and a put's cells become visible together
//! - Readers take a row's shared lock only while copying out visible cells
//!
//! Writers to different rows therefore never wait on each other beyond the
//! brief slot lookup, and `check_and_put` cannot interleave with any other
//! write to the same row.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use parking_lot::{
    RwLock as RowLock, RwLockReadGuard as RowReadGuard, RwLockWriteGuard as RowWriteGuard,
};

use crate::model::{Cell, Column, PutColumn, RowKey, RowResult};

use super::control::OpControl;
use super::errors::{StoreError, StoreResult};
use super::read_view::{ReadView, ViewRegistry};
use super::row::{DeleteScope, Label, PreparedCell, VersionedRow};

/// Source of server-assigned timestamps (epoch millis).
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

type RowSlot = Arc<RowLock<VersionedRow>>;

/// What a delete removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Every cell of the row
    Row,
    /// Every version of each listed column
    Columns(Vec<Column>),
}

/// A delete request for one row.
///
/// With a visibility label, only cells whose visibility expression is
/// exactly that label are removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    target: DeleteTarget,
    visibility: Option<String>,
}

impl Delete {
    pub fn row() -> Self {
        Self {
            target: DeleteTarget::Row,
            visibility: None,
        }
    }

    pub fn column(column: Column) -> Self {
        Self::columns(vec![column])
    }

    pub fn columns(columns: Vec<Column>) -> Self {
        Self {
            target: DeleteTarget::Columns(columns),
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, label: impl Into<String>) -> Self {
        self.visibility = Some(label.into().trim().to_string());
        self
    }

    pub fn target(&self) -> &DeleteTarget {
        &self.target
    }

    pub fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }

    fn scopes(&self, row: &RowKey) -> StoreResult<Vec<DeleteScope>> {
        match &self.target {
            DeleteTarget::Row => Ok(vec![DeleteScope::Row]),
            DeleteTarget::Columns(columns) => {
                if columns.is_empty() {
                    return Err(StoreError::NoColumns(row.to_string()));
                }
                columns
                    .iter()
                    .map(|c| -> StoreResult<DeleteScope> {
                        c.validate()?;
                        Ok(DeleteScope::Column(c.clone()))
                    })
                    .collect()
            }
        }
    }
}

/// The row store.
pub struct RowStore {
    rows: RwLock<BTreeMap<RowKey, RowSlot>>,
    sequence: AtomicU64,
    views: ViewRegistry,
    clock: Clock,
}

impl fmt::Debug for RowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStore")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .field("active_views", &self.views.active_count())
            .finish_non_exhaustive()
    }
}

impl Default for RowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RowStore {
    /// Creates an empty store stamping unpinned cells with wall-clock millis.
    pub fn new() -> Self {
        Self::with_clock(|| chrono::Utc::now().timestamp_millis())
    }

    /// Creates an empty store with a custom timestamp source.
    pub fn with_clock(clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
            views: ViewRegistry::default(),
            clock: Arc::new(clock),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Inserts or overwrites `columns` in `row`. Returns the sequence id.
    pub fn put(&self, row: &RowKey, columns: &[PutColumn]) -> StoreResult<u64> {
        self.put_with(row, columns, &OpControl::none(), |_| Ok::<(), StoreError>(()))
    }

    /// `put` with operation control and a hook run under the row lock.
    ///
    /// `before_apply` sees the exact cells about to be written. If it fails
    /// nothing is applied and its error is returned.
    pub fn put_with<E, F>(
        &self,
        row: &RowKey,
        columns: &[PutColumn],
        ctl: &OpControl,
        before_apply: F,
    ) -> Result<u64, E>
    where
        E: From<StoreError>,
        F: FnOnce(&[Cell]) -> Result<(), E>,
    {
        row.require_non_empty().map_err(StoreError::from)?;
        let prepared = self.prepare(row, columns)?;
        ctl.check()?;

        let slot = self.slot_or_create(row)?;
        let mut guard = write_row(&slot, ctl)?;
        let sequence_id = self.next_sequence();

        before_apply(&to_cells(&prepared, sequence_id))?;
        guard.apply_put(sequence_id, prepared);
        self.prune(&mut guard);
        Ok(sequence_id)
    }

    /// Atomically puts `column` if `(family, qualifier)` currently holds
    /// `expected`; `None` means the column must not exist.
    pub fn check_and_put(
        &self,
        row: &RowKey,
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        column: &PutColumn,
    ) -> StoreResult<bool> {
        self.check_and_put_with(
            row,
            family,
            qualifier,
            expected,
            column,
            &OpControl::none(),
            |_| Ok::<(), StoreError>(()),
        )
    }

    /// `check_and_put` with operation control and a hook run under the row lock.
    ///
    /// The hook only runs when the comparison succeeds.
    #[allow(clippy::too_many_arguments)]
    pub fn check_and_put_with<E, F>(
        &self,
        row: &RowKey,
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        column: &PutColumn,
        ctl: &OpControl,
        before_apply: F,
    ) -> Result<bool, E>
    where
        E: From<StoreError>,
        F: FnOnce(&[Cell]) -> Result<(), E>,
    {
        row.require_non_empty().map_err(StoreError::from)?;
        let checked = Column::new(family, qualifier);
        checked.validate().map_err(StoreError::from)?;
        let prepared = self.prepare(row, std::slice::from_ref(column))?;
        ctl.check()?;

        let slot = self.slot_or_create(row)?;
        let mut guard = write_row(&slot, ctl)?;

        let matches = match (expected, guard.current_value(&checked)) {
            (None, None) => true,
            (Some(expected), Some(current)) => expected == current,
            _ => false,
        };
        if !matches {
            return Ok(false);
        }

        let sequence_id = self.next_sequence();
        before_apply(&to_cells(&prepared, sequence_id))?;
        guard.apply_put(sequence_id, prepared);
        self.prune(&mut guard);
        Ok(true)
    }

    /// Deletes the whole row. Returns false if there was nothing to delete.
    pub fn delete(&self, row: &RowKey) -> StoreResult<bool> {
        self.delete_with(row, &Delete::row(), &OpControl::none(), || {
            Ok::<(), StoreError>(())
        })
    }

    /// Deletes every version of one column.
    pub fn delete_column(&self, row: &RowKey, column: &Column) -> StoreResult<bool> {
        self.delete_with(
            row,
            &Delete::column(column.clone()),
            &OpControl::none(),
            || Ok::<(), StoreError>(()),
        )
    }

    /// Deletes every version of each listed column.
    pub fn delete_columns(&self, row: &RowKey, columns: &[Column]) -> StoreResult<bool> {
        self.delete_with(
            row,
            &Delete::columns(columns.to_vec()),
            &OpControl::none(),
            || Ok::<(), StoreError>(()),
        )
    }

    /// Applies `delete` under the row lock.
    ///
    /// Deleting something that has no visible data is a no-op: no tombstone
    /// is written, no row is created, and the hook is not run.
    pub fn delete_with<E, F>(
        &self,
        row: &RowKey,
        delete: &Delete,
        ctl: &OpControl,
        before_apply: F,
    ) -> Result<bool, E>
    where
        E: From<StoreError>,
        F: FnOnce() -> Result<(), E>,
    {
        row.require_non_empty().map_err(StoreError::from)?;
        let scopes = delete.scopes(row)?;
        ctl.check()?;

        let Some(slot) = self.slot(row)? else {
            return Ok(false);
        };
        let mut guard = write_row(&slot, ctl)?;

        let label = delete.visibility();
        if !scopes.iter().any(|s| guard.has_visible(s, label)) {
            return Ok(false);
        }

        let sequence_id = self.next_sequence();
        before_apply()?;
        for scope in scopes {
            guard.apply_delete(scope, label.map(str::to_string), sequence_id);
        }
        self.prune(&mut guard);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Every currently visible cell of `row`, ignoring visibility labels'
    /// access control. `None` when the row has no visible cells.
    pub fn get(&self, row: &RowKey) -> StoreResult<Option<RowResult>> {
        let Some(slot) = self.slot(row)? else {
            return Ok(None);
        };
        let guard = read_row(&slot, &OpControl::none())?;
        let cells: Vec<Cell> = guard
            .visible(ReadView::latest())
            .map(|c| c.to_cell())
            .collect();
        Ok((!cells.is_empty()).then(|| RowResult::new(row.clone(), cells)))
    }

    /// Takes and registers a read view at the current high-water mark.
    ///
    /// Every view must be handed back with [`RowStore::release_view`].
    pub fn read_view(&self) -> StoreResult<ReadView> {
        self.views.acquire(&self.sequence)
    }

    pub fn release_view(&self, view: ReadView) {
        self.views.release(view);
    }

    /// Number of row slots ever created.
    pub fn row_count(&self) -> StoreResult<usize> {
        Ok(self.rows_read()?.len())
    }

    /// Highest sequence id handed out so far.
    pub fn sequence_high(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of read views currently registered.
    pub fn active_views(&self) -> usize {
        self.views.active_count()
    }

    /// Looks up the existing slot for `row`.
    pub(crate) fn slot(&self, row: &RowKey) -> StoreResult<Option<RowSlot>> {
        Ok(self.rows_read()?.get(row).cloned())
    }

    /// First row (or last, when `reversed`) inside the given bounds.
    pub(crate) fn seek(
        &self,
        lower: Bound<&RowKey>,
        upper: Bound<&RowKey>,
        reversed: bool,
    ) -> StoreResult<Option<(RowKey, RowSlot)>> {
        if bounds_are_empty(lower, upper) {
            return Ok(None);
        }
        let rows = self.rows_read()?;
        let mut range = rows.range::<RowKey, _>((lower, upper));
        let found = if reversed {
            range.next_back()
        } else {
            range.next()
        };
        Ok(found.map(|(k, slot)| (k.clone(), Arc::clone(slot))))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn rows_read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<RowKey, RowSlot>>> {
        self.rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("row map"))
    }

    fn slot_or_create(&self, row: &RowKey) -> StoreResult<RowSlot> {
        if let Some(slot) = self.slot(row)? {
            return Ok(slot);
        }
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("row map"))?;
        Ok(Arc::clone(rows.entry(row.clone()).or_default()))
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Validates columns, parses labels and resolves unpinned timestamps.
    ///
    /// All unpinned columns of one put share a single clock reading.
    fn prepare(&self, row: &RowKey, columns: &[PutColumn]) -> StoreResult<Vec<PreparedCell>> {
        if columns.is_empty() {
            return Err(StoreError::NoColumns(row.to_string()));
        }
        let mut now = None;
        columns
            .iter()
            .map(|put| -> StoreResult<PreparedCell> {
                put.column.validate()?;
                let label = put.visibility.as_deref().map(Label::parse).transpose()?;
                let timestamp = match put.timestamp {
                    Some(ts) => ts,
                    None => *now.get_or_insert_with(|| (self.clock)()),
                };
                Ok(PreparedCell {
                    column: put.column.clone(),
                    timestamp,
                    value: put.value.clone(),
                    label,
                })
            })
            .collect()
    }

    fn prune(&self, row: &mut VersionedRow) {
        // A poisoned registry only means pruning waits for a later write.
        if let Ok(floor) = self.views.floor(&self.sequence) {
            row.prune(floor);
        }
    }
}

fn to_cells(prepared: &[PreparedCell], sequence_id: u64) -> Vec<Cell> {
    prepared
        .iter()
        .map(|p| {
            Cell::new(
                p.column.clone(),
                p.value.clone(),
                p.timestamp,
                sequence_id,
                p.label.as_ref().map(|l| l.text().to_string()),
            )
        })
        .collect()
}

fn bounds_are_empty(lower: Bound<&RowKey>, upper: Bound<&RowKey>) -> bool {
    use Bound::{Excluded, Included};
    match (lower, upper) {
        (Included(l), Included(u)) => l > u,
        (Included(l), Excluded(u)) | (Excluded(l), Included(u)) | (Excluded(l), Excluded(u)) => {
            l >= u
        }
        _ => false,
    }
}

/// Longest single timed wait on a row lock, so a cancelled operation
/// stops waiting promptly.
const LOCK_WAIT_SLICE: Duration = Duration::from_millis(10);

fn next_wait(ctl: &OpControl) -> StoreResult<Duration> {
    ctl.check()?;
    Ok(match ctl.deadline() {
        Some(deadline) => deadline
            .saturating_duration_since(Instant::now())
            .min(LOCK_WAIT_SLICE),
        None => LOCK_WAIT_SLICE,
    })
}

/// Takes a row's exclusive lock, honouring `ctl` while waiting.
pub(crate) fn write_row<'r>(
    slot: &'r RowLock<VersionedRow>,
    ctl: &OpControl,
) -> StoreResult<RowWriteGuard<'r, VersionedRow>> {
    if ctl.is_unbounded() {
        return Ok(slot.write());
    }
    loop {
        if let Some(guard) = slot.try_write_for(next_wait(ctl)?) {
            return Ok(guard);
        }
    }
}

/// Takes a row's shared lock, honouring `ctl` while waiting.
pub(crate) fn read_row<'r>(
    slot: &'r RowLock<VersionedRow>,
    ctl: &OpControl,
) -> StoreResult<RowReadGuard<'r, VersionedRow>> {
    if ctl.is_unbounded() {
        return Ok(slot.read());
    }
    loop {
        if let Some(guard) = slot.try_read_for(next_wait(ctl)?) {
            return Ok(guard);
        }
    }
}
