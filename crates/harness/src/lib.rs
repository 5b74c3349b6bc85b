//! Correctness-checked key-value benchmark harness
//!
//! This crate drives a [`Backend`](kvbench_core::Backend) through a fixed
//! sequence of workload stages and checks every result against an
//! in-memory oracle:
//! - Sampler: random printable key/value pairs
//! - Mirror: expected backend contents
//! - Recorder: per-operation latency and nearest-rank statistics
//! - Workload: the five stage executors
//! - Verify: whole-store consistency scan
//! - Report: text, raw sample and JSON artifacts
//! - Harness: stage sequencing, the single abort point
//!
//! # Example
//!
//! ```ignore
//! use kvbench_harness::{BenchConfig, Harness};
//! use kvbench_storage::RedbStore;
//!
//! let mut harness = Harness::new(BenchConfig::default())?;
//! let report = harness.run::<RedbStore>()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod harness;
pub mod mirror;
pub mod recorder;
pub mod report;
pub mod sampler;
pub mod stage;
pub mod verify;
pub mod workload;

pub use config::{BackendKind, BenchConfig, CONFIG_FILE_NAME};
pub use error::{BenchError, Result};
pub use harness::{Harness, RunReport, StageObserver};
pub use mirror::{EmptyMirror, OracleMirror};
pub use recorder::{LatencyRecorder, Statistics};
pub use report::{format_statistics, stage_heading, ReportWriter};
pub use sampler::KeyValueSampler;
pub use stage::{Stage, StageReport};
pub use verify::verify_consistency;
pub use workload::StageContext;
