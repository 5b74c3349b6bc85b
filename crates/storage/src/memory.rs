//! MemoryStore: ordered in-memory backend
//!
//! A `BTreeMap<Vec<u8>, Vec<u8>>` behind the [`Backend`] interface.
//!
//! # Design Notes
//!
//! - **No persistence**: `open` ignores the path; every open starts empty
//! - **Iterator consistency**: iterators borrow the map immutably, so the
//!   store cannot change while one is alive
//! - **Baseline**: latencies measured against this store are the harness's
//!   own overhead floor

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;

use kvbench_core::{Backend, BackendIterator, Error, OpenOptions, Result};

use crate::stats::StoreCounters;

/// Property names understood by [`MemoryStore`]
pub mod properties {
    /// Multi-line summary of store state and counters
    pub const STATS: &str = kvbench_core::STATS_PROPERTY;
    /// Number of live keys
    pub const NUM_KEYS: &str = "kvbench.num-keys";
}

/// In-memory ordered backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Live entries in key order
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Cumulative operation counters
    counters: StoreCounters,
    /// Set by `close()`
    closed: bool,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }
}

impl Backend for MemoryStore {
    fn open(_path: &Path, _options: &OpenOptions) -> Result<Self> {
        Ok(Self::new())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_open()?;
        self.data.insert(key.to_vec(), value.to_vec());
        self.counters.record_put(0);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let found = self.data.get(key).cloned();
        self.counters.record_get(found.is_some());
        Ok(found)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.check_open()?;
        self.data.remove(key);
        self.counters.record_delete(0);
        Ok(())
    }

    fn iter(&self) -> Box<dyn BackendIterator + '_> {
        self.counters.record_iterator();
        let error = if self.closed { Some(Error::Closed) } else { None };
        Box::new(MemoryIter {
            data: &self.data,
            current: None,
            error,
        })
    }

    fn property(&self, name: &str) -> Option<String> {
        match name {
            properties::STATS => Some(format!(
                "backend: memory\nlive keys: {}\n{}",
                self.data.len(),
                self.counters.snapshot().summary()
            )),
            properties::NUM_KEYS => Some(self.data.len().to_string()),
            _ => None,
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Iterator over a [`MemoryStore`]
pub struct MemoryIter<'a> {
    data: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    current: Option<(&'a [u8], &'a [u8])>,
    error: Option<Error>,
}

impl<'a> MemoryIter<'a> {
    fn position(&mut self, lower: Bound<&[u8]>) {
        if self.error.is_some() {
            self.current = None;
            return;
        }
        let data = self.data;
        self.current = data
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.as_slice(), v.as_slice()));
    }
}

impl<'a> BackendIterator for MemoryIter<'a> {
    fn seek(&mut self, target: &[u8]) {
        self.position(Bound::Included(target));
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) {
        if let Some((key, _)) = self.current {
            self.position(Bound::Excluded(key));
        }
    }

    fn key(&self) -> &[u8] {
        self.current.map(|(k, _)| k).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.map(|(_, v)| v).unwrap_or_default()
    }

    fn status(&mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
