//! Error types for benchmark runs
//!
//! Every variant is fatal. Stage executors return these through `Result`
//! and the [`Harness`](crate::Harness) is the only place that stops the run.

use std::io;
use std::path::PathBuf;

use kvbench_core::display_bytes;
use thiserror::Error;

use crate::stage::Stage;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Reasons a benchmark run aborts
#[derive(Debug, Error)]
pub enum BenchError {
    /// A backend operation returned an error
    #[error("{}", describe_failure(.stage, .operation, .key.as_deref(), .source))]
    BackendFailure {
        /// Stage in progress, `None` outside stages (open, close)
        stage: Option<Stage>,
        /// Backend operation that failed
        operation: &'static str,
        /// Key involved, if any
        key: Option<Vec<u8>>,
        /// Error reported by the backend
        #[source]
        source: kvbench_core::Error,
    },

    /// The backend disagreed with the mirror
    #[error(
        "correctness violation in {stage} for key \"{}\": expected {}, observed {}",
        display_bytes(.key),
        describe_value(.expected.as_deref()),
        describe_value(.observed.as_deref())
    )]
    CorrectnessViolation {
        /// Stage that observed the divergence
        stage: Stage,
        /// Offending key
        key: Vec<u8>,
        /// Mirror's value, `None` when the mirror holds no such key
        expected: Option<Vec<u8>>,
        /// Backend's value, `None` when the backend reported not-found
        observed: Option<Vec<u8>>,
    },

    /// A stage needed a random existing key but none were left
    #[error("{stage} needs an existing key but the mirror is empty")]
    EmptyMirror {
        /// Stage that asked for the key
        stage: Stage,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Writing a report artifact failed
    #[error("failed to write report '{}': {source}", .path.display())]
    Report {
        /// Artifact being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl BenchError {
    /// Stage the error occurred in, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BenchError::BackendFailure { stage, .. } => *stage,
            BenchError::CorrectnessViolation { stage, .. } => Some(*stage),
            BenchError::EmptyMirror { stage } => Some(*stage),
            BenchError::Config(_) | BenchError::Report { .. } => None,
        }
    }

    /// True for correctness violations
    pub fn is_violation(&self) -> bool {
        matches!(self, BenchError::CorrectnessViolation { .. })
    }

    pub(crate) fn backend(
        stage: Option<Stage>,
        operation: &'static str,
        key: Option<&[u8]>,
        source: kvbench_core::Error,
    ) -> Self {
        BenchError::BackendFailure {
            stage,
            operation,
            key: key.map(<[u8]>::to_vec),
            source,
        }
    }

    pub(crate) fn violation(
        stage: Stage,
        key: &[u8],
        expected: Option<&[u8]>,
        observed: Option<&[u8]>,
    ) -> Self {
        BenchError::CorrectnessViolation {
            stage,
            key: key.to_vec(),
            expected: expected.map(<[u8]>::to_vec),
            observed: observed.map(<[u8]>::to_vec),
        }
    }

    pub(crate) fn report(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BenchError::Report {
            path: path.into(),
            source,
        }
    }
}

fn describe_failure(
    stage: &Option<Stage>,
    operation: &str,
    key: Option<&[u8]>,
    source: &kvbench_core::Error,
) -> String {
    let mut msg = format!("backend {} failed", operation);
    if let Some(stage) = stage {
        msg.push_str(&format!(" in {}", stage));
    }
    if let Some(key) = key {
        msg.push_str(&format!(" for key \"{}\"", display_bytes(key)));
    }
    msg.push_str(&format!(": {}", source));
    msg
}

fn describe_value(value: Option<&[u8]>) -> String {
    match value {
        Some(v) => format!("\"{}\"", display_bytes(v)),
        None => "<absent>".to_string(),
    }
}
