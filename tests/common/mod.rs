//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use std::path::Path;

pub use kvbench::{
    Backend, BackendKind, BenchConfig, BenchError, Harness, MemoryStore, OpenOptions, RedbStore,
    RunReport, Stage,
};
use tempfile::TempDir;

// ============================================================================
// Configuration
// ============================================================================

/// Seed used by every end-to-end run
pub const SEED: u64 = 20_240_601;

/// Small run: 100 inserts, 10 iterations per later stage
pub fn small_config(dir: &Path, backend: BackendKind) -> BenchConfig {
    BenchConfig {
        insert_count: 100,
        backend,
        db_path: dir.join("db"),
        output_dir: dir.join("reports"),
        seed: Some(SEED),
        progress_interval: 25,
        verify_after_stage: true,
        ..BenchConfig::default()
    }
}

/// Fresh temporary directory
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

// ============================================================================
// Running
// ============================================================================

/// Run `config` against the backend it names
pub fn run(config: &BenchConfig) -> Result<RunReport, BenchError> {
    let mut harness = Harness::new(config.clone())?;
    match config.backend {
        BackendKind::Memory => harness.run::<MemoryStore>(),
        BackendKind::Redb => harness.run::<RedbStore>(),
    }
}

/// All live pairs of a backend in key order
pub fn scan_all<B: Backend>(backend: &B) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut it = backend.iter();
    it.seek(b"");
    let mut pairs = Vec::new();
    while it.valid() {
        pairs.push((it.key().to_vec(), it.value().to_vec()));
        it.next();
    }
    it.status().expect("scan failed");
    pairs
}
