//! Storage backends for kvbench
//!
//! Two engines sit behind the `kvbench_core::Backend` interface:
//! - MemoryStore: BTreeMap-based, no persistence; the harness's baseline
//!   and the backend its own tests drive
//! - RedbStore: a thin adapter over the redb embedded database, the
//!   on-disk engine a default run benchmarks
//!
//! Neither adds storage logic of its own. Persistence, recovery and page
//! management are redb's.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod redb_store;
pub mod stats;

pub use memory::{MemoryIter, MemoryStore};
pub use redb_store::{RedbIter, RedbStore, DB_FILE_NAME};
pub use stats::{CounterSnapshot, StoreCounters};
