//! Metrics registry
//!
//! - Monotonic counters, plus one gauge for open scanners
//! - Reset only on service start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one client service.
///
/// All counters use Relaxed ordering; values are exact once the
/// operations that produced them have returned.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    puts: AtomicU64,
    cells_written: AtomicU64,
    cas_applied: AtomicU64,
    cas_rejected: AtomicU64,
    deletes: AtomicU64,
    scans_started: AtomicU64,
    scans_completed: AtomicU64,
    scans_cancelled: AtomicU64,
    rows_returned: AtomicU64,
    transport_failures: AtomicU64,
    /// Gauge
    open_scanners: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Writes

    /// Records one applied put of `cells` cells
    pub fn record_put(&self, cells: usize) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.cells_written.fetch_add(cells as u64, Ordering::Relaxed);
    }

    pub fn record_cas(&self, applied: bool) {
        if applied {
            self.cas_applied.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cas_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transport_failures(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Scans

    /// A scanner was opened; raises the open-scanner gauge
    pub fn scan_opened(&self) {
        self.scans_started.fetch_add(1, Ordering::Relaxed);
        self.open_scanners.fetch_add(1, Ordering::Relaxed);
    }

    /// A scanner was released; lowers the open-scanner gauge
    pub fn scan_closed(&self, cancelled: bool) {
        if cancelled {
            self.scans_cancelled.fetch_add(1, Ordering::Relaxed);
        } else {
            self.scans_completed.fetch_add(1, Ordering::Relaxed);
        }
        // Saturate rather than wrap if open/close were ever mismatched.
        let _ = self
            .open_scanners
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn increment_rows_returned(&self) {
        self.rows_returned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn open_scanners(&self) -> u64 {
        self.open_scanners.load(Ordering::Relaxed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            puts: self.puts.load(Ordering::Relaxed),
            cells_written: self.cells_written.load(Ordering::Relaxed),
            cas_applied: self.cas_applied.load(Ordering::Relaxed),
            cas_rejected: self.cas_rejected.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            scans_started: self.scans_started.load(Ordering::Relaxed),
            scans_completed: self.scans_completed.load(Ordering::Relaxed),
            scans_cancelled: self.scans_cancelled.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            open_scanners: self.open_scanners.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub puts: u64,
    pub cells_written: u64,
    pub cas_applied: u64,
    pub cas_rejected: u64,
    pub deletes: u64,
    pub scans_started: u64,
    pub scans_completed: u64,
    pub scans_cancelled: u64,
    pub rows_returned: u64,
    pub transport_failures: u64,
    pub open_scanners: u64,
}
