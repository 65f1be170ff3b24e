//! Row Store Semantics Tests
//!
//! - Put atomicity and overwrite of the same (column, timestamp)
//! - Server-assigned timestamps
//! - Deletes: row, column, label-qualified, no-op
//! - Read views pin a point in the sequence

use rowstore::model::{Column, PutColumn, RowKey};
use rowstore::store::{Delete, OpControl, ReadView, RowStore, StoreError};

// =============================================================================
// Helper Functions
// =============================================================================

fn key(s: &str) -> RowKey {
    RowKey::from(s)
}

fn clocked(ts: i64) -> RowStore {
    RowStore::with_clock(move || ts)
}

// =============================================================================
// Puts
// =============================================================================

/// Unpinned cells of one put share a single server timestamp.
#[test]
fn test_put_stamps_unpinned_cells_with_clock() {
    let store = clocked(42);
    store
        .put(
            &key("r"),
            &[
                PutColumn::new("f", "a", "1"),
                PutColumn::new("f", "b", "2"),
                PutColumn::new("f", "c", "3").at(7),
            ],
        )
        .unwrap();

    let row = store.get(&key("r")).unwrap().unwrap();
    assert_eq!(row.latest(b"f", b"a").unwrap().timestamp(), 42);
    assert_eq!(row.latest(b"f", b"b").unwrap().timestamp(), 42);
    assert_eq!(row.latest(b"f", b"c").unwrap().timestamp(), 7);
}

/// Rewriting the same (column, timestamp) replaces the value.
#[test]
fn test_same_timestamp_overwrites() {
    let store = clocked(1);
    store.put(&key("r"), &[PutColumn::new("f", "q", "old").at(5)]).unwrap();
    store.put(&key("r"), &[PutColumn::new("f", "q", "new").at(5)]).unwrap();

    let row = store.get(&key("r")).unwrap().unwrap();
    assert_eq!(row.len(), 1);
    assert_eq!(row.value(b"f", b"q"), Some(&b"new"[..]));
}

/// Distinct timestamps are kept as versions, newest first.
#[test]
fn test_versions_newest_first() {
    let store = clocked(1);
    for ts in [3, 9, 5] {
        let value = ts.to_string();
        store
            .put(&key("r"), &[PutColumn::new("f", "q", value.as_bytes()).at(ts)])
            .unwrap();
    }
    let row = store.get(&key("r")).unwrap().unwrap();
    let stamps: Vec<i64> = row.versions(b"f", b"q").map(|c| c.timestamp()).collect();
    assert_eq!(stamps, vec![9, 5, 3]);
    assert_eq!(row.value(b"f", b"q"), Some(&b"9"[..]));
}

/// Invalid input is rejected before anything is written.
#[test]
fn test_put_rejects_invalid_input() {
    let store = clocked(1);
    assert!(store.put(&key(""), &[PutColumn::new("f", "q", "v")]).is_err());
    assert!(matches!(
        store.put(&key("r"), &[]),
        Err(StoreError::NoColumns(_))
    ));
    let err = store
        .put(
            &key("r"),
            &[
                PutColumn::new("f", "ok", "v"),
                PutColumn::new("f", "bad", "v").with_visibility("a&"),
            ],
        )
        .unwrap_err();
    assert_eq!(err.code(), "ROWSTORE_INVALID_VISIBILITY");
    assert!(store.get(&key("r")).unwrap().is_none());
    assert_eq!(store.sequence_high(), 0);
}

/// A failing hook leaves the row untouched.
#[test]
fn test_failed_hook_applies_nothing() {
    let store = clocked(1);
    let result: Result<u64, StoreError> = store.put_with(
        &key("r"),
        &[PutColumn::new("f", "q", "v")],
        &OpControl::none(),
        |_| Err(StoreError::TimedOut),
    );
    assert!(result.is_err());
    assert!(store.get(&key("r")).unwrap().is_none());
}

// =============================================================================
// Deletes
// =============================================================================

#[test]
fn test_delete_row_and_column() {
    let store = clocked(1);
    store
        .put(
            &key("r"),
            &[PutColumn::new("f", "a", "1"), PutColumn::new("f", "b", "2")],
        )
        .unwrap();

    assert!(store.delete_column(&key("r"), &Column::new("f", "a")).unwrap());
    let row = store.get(&key("r")).unwrap().unwrap();
    assert!(row.latest(b"f", b"a").is_none());
    assert!(row.latest(b"f", b"b").is_some());

    assert!(store.delete(&key("r")).unwrap());
    assert!(store.get(&key("r")).unwrap().is_none());
}

/// Deleting nothing reports false and consumes no sequence id.
#[test]
fn test_delete_of_nothing_is_noop() {
    let store = clocked(1);
    assert!(!store.delete(&key("missing")).unwrap());
    assert_eq!(store.row_count().unwrap(), 0);

    store.put(&key("r"), &[PutColumn::new("f", "a", "1")]).unwrap();
    let before = store.sequence_high();
    assert!(!store.delete_column(&key("r"), &Column::new("f", "zzz")).unwrap());
    assert_eq!(store.sequence_high(), before);
}

/// A put after a delete is visible regardless of its timestamp.
#[test]
fn test_put_after_delete_is_visible() {
    let store = clocked(100);
    store.put(&key("r"), &[PutColumn::new("f", "q", "a")]).unwrap();
    store.delete(&key("r")).unwrap();
    store.put(&key("r"), &[PutColumn::new("f", "q", "b").at(1)]).unwrap();

    let row = store.get(&key("r")).unwrap().unwrap();
    assert_eq!(row.value(b"f", b"q"), Some(&b"b"[..]));
}

/// A label-qualified delete removes only cells labelled exactly that.
#[test]
fn test_label_qualified_delete() {
    let store = clocked(1);
    store
        .put(
            &key("r"),
            &[
                PutColumn::new("f", "a", "secret").with_visibility("admin"),
                PutColumn::new("f", "b", "mixed").with_visibility("admin|ops"),
                PutColumn::new("f", "c", "open"),
            ],
        )
        .unwrap();

    let delete = Delete::row().with_visibility(" admin ");
    let removed = store
        .delete_with(&key("r"), &delete, &OpControl::none(), || {
            Ok::<(), StoreError>(())
        })
        .unwrap();
    assert!(removed);

    let row = store.get(&key("r")).unwrap().unwrap();
    assert!(row.latest(b"f", b"a").is_none());
    assert!(row.latest(b"f", b"b").is_some());
    assert!(row.latest(b"f", b"c").is_some());
}

// =============================================================================
// Read Views
// =============================================================================

#[test]
fn test_read_views_register_and_release() {
    let store = clocked(1);
    store.put(&key("r"), &[PutColumn::new("f", "q", "v")]).unwrap();

    let view = store.read_view().unwrap();
    assert_eq!(view.upper_bound(), store.sequence_high());
    assert_eq!(store.active_views(), 1);
    store.release_view(view);
    assert_eq!(store.active_views(), 0);

    assert!(ReadView::latest().sees(u64::MAX));
    assert!(!ReadView::new(3).sees(4));
}
