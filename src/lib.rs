//! kvbench - correctness-checked micro-benchmark for key-value engines
//!
//! kvbench drives a storage engine through five fixed stages (fill, point
//! read, delete, update, range scan), records per-operation latency, and
//! checks every observed result against an in-memory oracle. The first
//! divergence aborts the run with the stage, key and both values.
//!
//! # Quick Start
//!
//! ```ignore
//! use kvbench::{BenchConfig, Harness, RedbStore};
//!
//! let config = BenchConfig { insert_count: 1000, ..BenchConfig::default() };
//! let report = Harness::new(config)?.run::<RedbStore>()?;
//! for stage in &report.stages {
//!     println!("{:?}", stage.recorder.statistics());
//! }
//! ```
//!
//! # Architecture
//!
//! - [`kvbench_core`]: the [`Backend`] interface an engine implements
//! - [`kvbench_storage`]: two reference backends
//! - [`kvbench_harness`]: stages, oracle, statistics and reports

pub use kvbench_core::{
    display_bytes, Backend, BackendIterator, Error, KvPair, OpenOptions, STATS_PROPERTY,
};
pub use kvbench_harness::{
    format_statistics, verify_consistency, BackendKind, BenchConfig, BenchError, Harness,
    KeyValueSampler, LatencyRecorder, OracleMirror, RunReport, Stage, StageReport, Statistics,
};
pub use kvbench_storage::{MemoryStore, RedbStore};
