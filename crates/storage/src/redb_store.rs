//! RedbStore: the [`Backend`] interface over a redb database
//!
//! One redb file (`<dir>/data.redb`) holds a single `&[u8] -> &[u8]`
//! table. Every `put` and `delete` is its own write transaction; every
//! `get` opens a read transaction. redb orders `&[u8]` keys byte-wise,
//! which is the order the harness expects from iterators.
//!
//! # Durability
//!
//! With `sync_writes` each commit is durable before it returns. Without it
//! commits use `Durability::None`: they are visible to later reads but only
//! reach disk with the next durable commit, which `close` always issues.
//!
//! # Iterators
//!
//! An iterator holds one read transaction for its whole life, so every
//! position it reaches comes from the same snapshot. Entries are copied
//! out of redb in small batches.

use std::collections::VecDeque;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use redb::{Database, Durability, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use tracing::{debug, info, warn};

use kvbench_core::{Backend, BackendIterator, Error, OpenOptions, Result};

use crate::stats::StoreCounters;

/// Database file name inside the database directory
pub const DB_FILE_NAME: &str = "data.redb";

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kvbench");

/// Entries copied per range read; covers a default range scan in one read
const SCAN_BATCH: usize = 64;

/// Property names understood by [`RedbStore`]
pub mod properties {
    /// Multi-line summary of engine statistics and counters
    pub const STATS: &str = kvbench_core::STATS_PROPERTY;
}

/// Convert any redb error into a backend error, keeping redb's text
fn engine_error(e: impl Into<redb::Error>) -> Error {
    match e.into() {
        redb::Error::Io(e) => Error::IoError(e),
        redb::Error::Corrupted(msg) => Error::Corruption(msg),
        other => Error::engine(other.to_string()),
    }
}

/// Backend adapter for redb
pub struct RedbStore {
    /// Database directory
    dir: PathBuf,
    /// `None` once closed
    db: Option<Database>,
    /// Commit with `Durability::Immediate` instead of `None`
    sync_writes: bool,
    /// Cumulative operation counters
    counters: StoreCounters,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("dir", &self.dir)
            .field("sync_writes", &self.sync_writes)
            .field("closed", &self.db.is_none())
            .finish()
    }
}

impl RedbStore {
    /// Path of the database file for a database directory
    pub fn db_path(dir: &Path) -> PathBuf {
        dir.join(DB_FILE_NAME)
    }

    /// Database directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn database(&self) -> Result<&Database> {
        self.db.as_ref().ok_or(Error::Closed)
    }

    fn begin_write(&self) -> Result<WriteTransaction> {
        let mut txn = self.database()?.begin_write().map_err(engine_error)?;
        if !self.sync_writes {
            txn.set_durability(Durability::None);
        }
        Ok(txn)
    }

    fn engine_stats(&self) -> Result<String> {
        let txn = self.database()?.begin_write().map_err(engine_error)?;
        let stats = txn.stats().map_err(engine_error)?;
        txn.abort().map_err(engine_error)?;
        Ok(format!(
            "tree height: {}\nallocated pages: {} (page size {})\nleaf pages: {}, branch pages: {}\nstored bytes: {}, metadata bytes: {}, fragmented bytes: {}",
            stats.tree_height(),
            stats.allocated_pages(),
            stats.page_size(),
            stats.leaf_pages(),
            stats.branch_pages(),
            stats.stored_bytes(),
            stats.metadata_bytes(),
            stats.fragmented_bytes()
        ))
    }
}

impl Backend for RedbStore {
    fn open(path: &Path, options: &OpenOptions) -> Result<Self> {
        let db_path = Self::db_path(path);
        let exists = db_path.exists();

        if exists && options.error_if_exists {
            return Err(Error::AlreadyExists(path.to_path_buf()));
        }
        if !exists {
            if !options.create_if_missing {
                return Err(Error::NotFound(path.to_path_buf()));
            }
            fs::create_dir_all(path)?;
        }

        let db = Database::create(&db_path).map_err(engine_error)?;

        // Create the table up front so reads never see it missing
        let txn = db.begin_write().map_err(engine_error)?;
        txn.open_table(TABLE).map_err(engine_error)?;
        txn.commit().map_err(engine_error)?;

        info!(
            target: "kvbench::storage",
            path = ?path,
            existed = exists,
            sync_writes = options.sync_writes,
            "Opened redb store"
        );

        Ok(Self {
            dir: path.to_path_buf(),
            db: Some(db),
            sync_writes: options.sync_writes,
            counters: StoreCounters::new(),
        })
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(TABLE).map_err(engine_error)?;
            table.insert(key, value).map_err(engine_error)?;
        }
        txn.commit().map_err(engine_error)?;
        self.counters.record_put((key.len() + value.len()) as u64);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.database()?.begin_read().map_err(engine_error)?;
        let table = txn.open_table(TABLE).map_err(engine_error)?;
        let found = table
            .get(key)
            .map_err(engine_error)?
            .map(|guard| guard.value().to_vec());
        self.counters.record_get(found.is_some());
        Ok(found)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(TABLE).map_err(engine_error)?;
            table.remove(key).map_err(engine_error)?;
        }
        txn.commit().map_err(engine_error)?;
        self.counters.record_delete(key.len() as u64);
        Ok(())
    }

    fn iter(&self) -> Box<dyn BackendIterator + '_> {
        self.counters.record_iterator();
        let (txn, error) = match self.database().and_then(|db| db.begin_read().map_err(engine_error)) {
            Ok(txn) => (Some(txn), None),
            Err(e) => (None, Some(e)),
        };
        Box::new(RedbIter {
            txn,
            current: None,
            pending: VecDeque::with_capacity(SCAN_BATCH),
            more: false,
            error,
        })
    }

    fn property(&self, name: &str) -> Option<String> {
        match name {
            properties::STATS => {
                let engine = self
                    .engine_stats()
                    .unwrap_or_else(|e| format!("engine stats unavailable: {}", e));
                Some(format!(
                    "backend: redb\npath: {}\n{}\n{}",
                    Self::db_path(&self.dir).display(),
                    engine,
                    self.counters.snapshot().summary()
                ))
            }
            _ => None,
        }
    }

    fn close(&mut self) -> Result<()> {
        let db = match self.db.take() {
            Some(db) => db,
            None => return Ok(()),
        };
        // Persist any commits made with Durability::None
        let txn = db.begin_write().map_err(engine_error)?;
        txn.commit().map_err(engine_error)?;
        drop(db);
        debug!(target: "kvbench::storage", path = ?self.dir, "Closed redb store");
        Ok(())
    }
}

impl Drop for RedbStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(target: "kvbench::storage", error = %e, "Failed to close redb store on drop");
        }
    }
}

/// Iterator over a [`RedbStore`]
///
/// Reads from the snapshot of the read transaction taken when the
/// iterator was created.
pub struct RedbIter {
    txn: Option<ReadTransaction>,
    current: Option<(Vec<u8>, Vec<u8>)>,
    /// Entries read ahead of `current`
    pending: VecDeque<(Vec<u8>, Vec<u8>)>,
    /// The last batch was full, so the table may hold more entries
    more: bool,
    error: Option<Error>,
}

impl RedbIter {
    fn load(&mut self, lower: Bound<&[u8]>) {
        self.pending.clear();
        self.more = false;
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.read_batch(lower) {
            self.pending.clear();
            self.error = Some(e);
        }
    }

    fn read_batch(&mut self, lower: Bound<&[u8]>) -> Result<()> {
        let txn = match &self.txn {
            Some(txn) => txn,
            None => return Ok(()),
        };
        let table = txn.open_table(TABLE).map_err(engine_error)?;
        let range = table
            .range::<&[u8]>((lower, Bound::Unbounded))
            .map_err(engine_error)?;
        for entry in range.take(SCAN_BATCH) {
            let (key, value) = entry.map_err(engine_error)?;
            self.pending
                .push_back((key.value().to_vec(), value.value().to_vec()));
        }
        self.more = self.pending.len() == SCAN_BATCH;
        Ok(())
    }
}

impl BackendIterator for RedbIter {
    fn seek(&mut self, target: &[u8]) {
        self.current = None;
        self.load(Bound::Included(target));
        self.current = self.pending.pop_front();
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) {
        let key = match self.current.take() {
            Some((key, _)) => key,
            None => return,
        };
        if self.pending.is_empty() && self.more {
            self.load(Bound::Excluded(&key));
        }
        self.current = self.pending.pop_front();
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_slice()).unwrap_or_default()
    }

    fn status(&mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
