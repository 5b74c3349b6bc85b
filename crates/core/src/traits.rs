//! Backend capability interface
//!
//! This module defines the narrow operation surface the benchmark drives.
//! A storage engine only has to implement [`Backend`] and
//! [`BackendIterator`] to be benchmarked and correctness-checked; nothing
//! else about it is visible to the harness.

use std::path::Path;

use crate::error::Result;

/// Options applied when opening a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the database if it does not exist
    pub create_if_missing: bool,
    /// Fail if the database already exists
    pub error_if_exists: bool,
    /// Force every write to stable storage before returning
    pub sync_writes: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            sync_writes: false,
        }
    }
}

impl OpenOptions {
    /// Set `create_if_missing`
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Set `error_if_exists`
    pub fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Set `sync_writes`
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }
}

/// Key-value storage engine under test
///
/// Keys and values are opaque byte strings. Keys are ordered
/// lexicographically (byte-wise), which is the order iterators must
/// produce.
///
/// `get` returning `Ok(None)` is the not-found outcome; it is not an error.
///
/// # Examples
///
/// ```ignore
/// use kvbench_core::{Backend, OpenOptions};
///
/// let mut db = MyStore::open(Path::new("db"), &OpenOptions::default())?;
/// db.put(b"k", b"v")?;
/// assert_eq!(db.get(b"k")?, Some(b"v".to_vec()));
/// db.close()?;
/// ```
pub trait Backend {
    /// Open (or create) the database at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened with the given
    /// options, or if its persisted state fails validation.
    fn open(path: &Path, options: &OpenOptions) -> Result<Self>
    where
        Self: Sized;

    /// Insert or overwrite `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be applied.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Read the current value of `key`, `None` if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails; absence is not an error.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove `key`; removing an absent key succeeds
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be applied.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Create an iterator over the store in ascending key order
    ///
    /// The iterator reflects the store's contents at the time it is
    /// positioned. It starts unpositioned; call `seek` first.
    fn iter(&self) -> Box<dyn BackendIterator + '_>;

    /// Engine-specific diagnostic text for `name`, if the engine knows it
    fn property(&self, name: &str) -> Option<String>;

    /// Flush and release the database
    ///
    /// Further operations fail with `Error::Closed`. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered state cannot be flushed.
    fn close(&mut self) -> Result<()>;
}

/// Forward cursor over a [`Backend`]
pub trait BackendIterator {
    /// Position at the first key `>= target`
    fn seek(&mut self, target: &[u8]);

    /// True when positioned at an entry
    fn valid(&self) -> bool;

    /// Advance to the next entry; requires `valid()`
    fn next(&mut self);

    /// Key at the current position; requires `valid()`
    fn key(&self) -> &[u8];

    /// Value at the current position; requires `valid()`
    fn value(&self) -> &[u8];

    /// Take the error encountered while iterating, if any
    ///
    /// An iterator that hit an error becomes invalid; the error is
    /// reported here rather than by `valid()`. The error is handed out
    /// once: later calls return `Ok(())` while the iterator stays invalid.
    fn status(&mut self) -> Result<()>;
}

/// Property name every backend is asked for after each stage
pub const STATS_PROPERTY: &str = "kvbench.stats";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_create_database() {
        let options = OpenOptions::default();
        assert!(options.create_if_missing);
        assert!(!options.error_if_exists);
        assert!(!options.sync_writes);
    }

    #[test]
    fn options_builder_sets_fields() {
        let options = OpenOptions::default()
            .create_if_missing(false)
            .error_if_exists(true)
            .sync_writes(true);
        assert_eq!(
            options,
            OpenOptions {
                create_if_missing: false,
                error_if_exists: true,
                sync_writes: true,
            }
        );
    }
}
