//! Benchmark configuration via `kvbench.toml`
//!
//! One TOML file describes a run: workload sizes, where the database and
//! the reports live, which backend to drive and how. Every field has a
//! default, so an empty file (or no file) is a valid configuration.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use kvbench_core::PRINTABLE_ALPHABET_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::stage::Stage;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "kvbench.toml";

/// Which shipped backend the CLI drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory ordered map
    Memory,
    /// redb database on disk
    #[default]
    Redb,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Redb => f.write_str("redb"),
        }
    }
}

/// Benchmark configuration loaded from `kvbench.toml`
///
/// # Example
///
/// ```toml
/// insert_count = 10000
/// key_length = 24
/// value_length = 1000
/// backend = "redb"
/// db_path = "kvbench-db"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Pairs written by the fill stage
    pub insert_count: usize,
    /// Key length in bytes
    pub key_length: usize,
    /// Value length in bytes
    pub value_length: usize,
    /// Maximum pairs read per range scan
    pub range_scan_limit: usize,
    /// Database directory
    pub db_path: PathBuf,
    /// Directory for report artifacts
    pub output_dir: PathBuf,
    /// File name prefix of report artifacts
    pub log_prefix: String,
    /// Backend to drive
    pub backend: BackendKind,
    /// RNG seed; drawn from OS entropy when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Ask the backend to make every write durable before returning
    pub sync_writes: bool,
    /// Remove `db_path` before opening the backend
    pub clean_start: bool,
    /// Iterations between progress events
    pub progress_interval: usize,
    /// Compare the whole backend against the mirror after every stage
    pub verify_after_stage: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            insert_count: 10_000,
            key_length: 24,
            value_length: 1000,
            range_scan_limit: 16,
            db_path: PathBuf::from("kvbench-db"),
            output_dir: PathBuf::from("."),
            log_prefix: "timing".to_string(),
            backend: BackendKind::default(),
            seed: None,
            sync_writes: false,
            clean_start: true,
            progress_interval: 1000,
            verify_after_stage: false,
        }
    }
}

impl BenchConfig {
    /// Iterations of every stage after fill: `insert_count / 10`
    pub fn test_count(&self) -> usize {
        self.insert_count / 10
    }

    /// Check the configuration can drive a complete run
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.key_length == 0 {
            return Err(BenchError::Config("key_length must be at least 1".to_string()));
        }
        if self.range_scan_limit == 0 {
            return Err(BenchError::Config(
                "range_scan_limit must be at least 1".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(BenchError::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        if self.log_prefix.is_empty() {
            return Err(BenchError::Config("log_prefix must not be empty".to_string()));
        }
        if self.clean_start {
            self.check_removable_db_path()?;
        }
        if key_space(self.key_length, self.insert_count as u64) < self.insert_count as u64 {
            return Err(BenchError::Config(format!(
                "key_length {} allows fewer than insert_count {} distinct keys",
                self.key_length, self.insert_count
            )));
        }
        Ok(())
    }

    /// `clean_start` removes `db_path` recursively; refuse paths whose
    /// removal would take the working directory or the reports with it
    fn check_removable_db_path(&self) -> Result<()> {
        let cwd = std::env::current_dir().ok();
        let db = lexical_absolute(&self.db_path, cwd.as_deref());
        let output = lexical_absolute(&self.output_dir, cwd.as_deref());

        if db.file_name().is_none() {
            return Err(BenchError::Config(format!(
                "db_path '{}' names no directory that clean_start could remove",
                self.db_path.display()
            )));
        }
        if cwd.as_deref().map_or(false, |cwd| cwd.starts_with(&db)) {
            return Err(BenchError::Config(format!(
                "db_path '{}' contains the working directory; clean_start would remove it",
                self.db_path.display()
            )));
        }
        if output.starts_with(&db) {
            return Err(BenchError::Config(format!(
                "db_path '{}' contains output_dir '{}'; clean_start would remove the reports",
                self.db_path.display(),
                self.output_dir.display()
            )));
        }
        Ok(())
    }

    /// Cumulative summary: `<output_dir>/<prefix>.log`
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.log", self.log_prefix))
    }

    /// Raw samples of one stage: `<output_dir>/<prefix>-stage_N.log`
    pub fn stage_log_path(&self, stage: Stage) -> PathBuf {
        self.output_dir
            .join(format!("{}-stage_{}.log", self.log_prefix, stage.number()))
    }

    /// Machine-readable summary: `<output_dir>/<prefix>.json`
    pub fn json_summary_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.log_prefix))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kvbench configuration
#
# Workload size. Every stage after the fill runs insert_count / 10 times.
insert_count = 10000

# Key and value sizes in bytes. Bytes are random printable ASCII.
key_length = 24
value_length = 1000

# Maximum pairs read by each range scan
range_scan_limit = 16

# Backend to drive: "redb" (on-disk database, default) or "memory"
backend = "redb"

# Database directory, removed before the run when clean_start is true
db_path = "kvbench-db"
clean_start = true

# Make every commit durable before it returns (redb backend only)
sync_writes = false

# Reports: <prefix>.log, <prefix>-stage_N.log and <prefix>.json
output_dir = "."
log_prefix = "timing"

# Fixed RNG seed for reproducible runs (default: random, logged at start)
# seed = 42

# Emit a progress event every N operations
progress_interval = 1000

# Scan the whole backend against the expected contents after every stage
verify_after_stage = false
"#
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: BenchConfig = toml::from_str(&content).map_err(|e| {
            BenchError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `true` if the file was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            BenchError::Config(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BenchError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            BenchError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Resolve `path` against `cwd` and fold `.` and `..` without touching
/// the filesystem
fn lexical_absolute(path: &Path, cwd: Option<&Path>) -> PathBuf {
    let joined = match cwd {
        Some(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `95^key_length`, saturating once it reaches `cap`
fn key_space(key_length: usize, cap: u64) -> u64 {
    let mut space = 1u64;
    for _ in 0..key_length {
        if space >= cap {
            break;
        }
        space = space.saturating_mul(PRINTABLE_ALPHABET_SIZE);
    }
    space
}
