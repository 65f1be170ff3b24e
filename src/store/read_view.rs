//! ReadView - stable snapshot boundary, and the registry of active views
//!
//! A read view is a single sequence number: every cell version written
//! with a sequence id at or below it may be visible, everything above is
//! invisible. A view never changes once taken.
//!
//! The registry tracks the views currently held by open scanners. Its
//! minimum is the pruning floor: version-chain entries that no active view
//! (and not the latest state) can observe are safe to drop.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::errors::{StoreError, StoreResult};

/// A stable snapshot boundary for reads.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReadView {
    upper_bound: u64,
}

impl ReadView {
    #[inline]
    pub fn new(upper_bound: u64) -> Self {
        Self { upper_bound }
    }

    /// A view that sees every write applied so far and in the future.
    #[inline]
    pub fn latest() -> Self {
        Self::new(u64::MAX)
    }

    #[inline]
    pub fn upper_bound(&self) -> u64 {
        self.upper_bound
    }

    #[inline]
    pub fn sees(&self, sequence_id: u64) -> bool {
        sequence_id <= self.upper_bound
    }
}

/// Reference-counted set of active read view bounds.
#[derive(Debug, Default)]
pub(crate) struct ViewRegistry {
    active: Mutex<BTreeMap<u64, usize>>,
}

impl ViewRegistry {
    /// Takes a view at the current sequence high-water mark and registers it.
    ///
    /// The sequence is read under the registry lock so a concurrent floor
    /// computation never misses a view it should have honoured.
    pub(crate) fn acquire(&self, sequence: &AtomicU64) -> StoreResult<ReadView> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| StoreError::LockPoisoned("view registry"))?;
        let bound = sequence.load(Ordering::SeqCst);
        *active.entry(bound).or_insert(0) += 1;
        Ok(ReadView::new(bound))
    }

    /// Releases a view taken with `acquire`. Safe to call from `Drop`.
    pub(crate) fn release(&self, view: ReadView) {
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(count) = active.get_mut(&view.upper_bound()) {
            *count -= 1;
            if *count == 0 {
                active.remove(&view.upper_bound());
            }
        }
    }

    /// Lowest bound any reader may still use.
    pub(crate) fn floor(&self, sequence: &AtomicU64) -> StoreResult<u64> {
        let active = self
            .active
            .lock()
            .map_err(|_| StoreError::LockPoisoned("view registry"))?;
        let high = sequence.load(Ordering::SeqCst);
        Ok(active.keys().next().copied().unwrap_or(high).min(high))
    }

    pub(crate) fn active_count(&self) -> usize {
        match self.active.lock() {
            Ok(guard) => guard.values().sum(),
            Err(poisoned) => poisoned.into_inner().values().sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_view_sees() {
        let view = ReadView::new(10);
        assert!(view.sees(10));
        assert!(view.sees(1));
        assert!(!view.sees(11));
        assert!(ReadView::latest().sees(u64::MAX));
    }

    #[test]
    fn test_floor_is_minimum_active_view() {
        let registry = ViewRegistry::default();
        let seq = AtomicU64::new(5);

        let v5 = registry.acquire(&seq).unwrap();
        seq.store(9, Ordering::SeqCst);
        let v9 = registry.acquire(&seq).unwrap();

        assert_eq!(registry.floor(&seq).unwrap(), 5);
        registry.release(v5);
        assert_eq!(registry.floor(&seq).unwrap(), 9);
        registry.release(v9);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_duplicate_bounds_are_counted() {
        let registry = ViewRegistry::default();
        let seq = AtomicU64::new(3);

        let a = registry.acquire(&seq).unwrap();
        let b = registry.acquire(&seq).unwrap();
        assert_eq!(registry.active_count(), 2);

        registry.release(a);
        assert_eq!(registry.floor(&seq).unwrap(), 3);
        seq.store(7, Ordering::SeqCst);
        assert_eq!(registry.floor(&seq).unwrap(), 3);

        registry.release(b);
        assert_eq!(registry.floor(&seq).unwrap(), 7);
    }

    #[test]
    fn test_floor_without_views_is_high_water_mark() {
        let registry = ViewRegistry::default();
        let seq = AtomicU64::new(42);
        assert_eq!(registry.floor(&seq).unwrap(), 42);
    }
}
