//! Cumulative operation counters shared by the stores
//!
//! Counters accumulate over the lifetime of a store and are never reset.
//! They feed the `kvbench.stats` property the harness attaches to each
//! stage report.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one store instance
#[derive(Debug, Default)]
pub struct StoreCounters {
    puts: AtomicU64,
    gets: AtomicU64,
    get_hits: AtomicU64,
    deletes: AtomicU64,
    iterators: AtomicU64,
    bytes_written: AtomicU64,
}

/// Point-in-time copy of [`StoreCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Total put calls that succeeded
    pub puts: u64,
    /// Total get calls that succeeded
    pub gets: u64,
    /// Gets that found a value
    pub get_hits: u64,
    /// Total delete calls that succeeded
    pub deletes: u64,
    /// Iterators created
    pub iterators: u64,
    /// Bytes appended to persistent storage (0 for in-memory stores)
    pub bytes_written: u64,
}

impl StoreCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_put(&self, bytes: u64) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.get_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_delete(&self, bytes: u64) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_iterator(&self) {
        self.iterators.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            get_hits: self.get_hits.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            iterators: self.iterators.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

impl CounterSnapshot {
    /// Format as the operation line of a stats property
    pub fn summary(&self) -> String {
        format!(
            "ops: puts={}, gets={} (hits={}), deletes={}, iterators={}, bytes_written={}",
            self.puts, self.gets, self.get_hits, self.deletes, self.iterators, self.bytes_written
        )
    }
}
