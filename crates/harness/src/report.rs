//! Report artifacts
//!
//! A run leaves three kinds of files in `output_dir`:
//! - `<prefix>.log`: one statistics block per stage, appended as stages finish
//! - `<prefix>-stage_N.log`: raw samples of stage N, one per line
//! - `<prefix>.json`: every stage's statistics, written once at the end

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{BackendKind, BenchConfig};
use crate::error::{BenchError, Result};
use crate::recorder::{LatencyRecorder, Statistics};
use crate::stage::{Stage, StageReport};

/// Statistics block for one recorder
///
/// ```text
/// Total operations: 1000
/// Timing (us): avg=3.250, median=2.900, min=1.100, max=88.000, p99=12.400
/// DB stats:
/// <diagnostic text>
/// ```
pub fn format_statistics(recorder: &LatencyRecorder) -> String {
    let stats = match recorder.statistics() {
        Some(stats) => stats,
        None => return "No operations recorded.".to_string(),
    };
    format!(
        "Total operations: {}\nTiming (us): avg={:.3}, median={:.3}, min={:.3}, max={:.3}, p99={:.3}\nDB stats:\n{}\n",
        stats.count,
        stats.avg,
        stats.median,
        stats.min,
        stats.max,
        stats.p99,
        recorder.diagnostics().unwrap_or_default()
    )
}

/// Header line of a stage in the cumulative summary
pub fn stage_heading(stage: Stage, count: usize) -> String {
    format!("[Stage {}] {} {} keys", stage.number(), stage.label(), count)
}

#[derive(Debug, Serialize)]
struct StageSummary {
    stage: Stage,
    count: usize,
    statistics: Option<Statistics>,
    diagnostics: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    seed: u64,
    backend: BackendKind,
    insert_count: usize,
    test_count: usize,
    stages: &'a [StageSummary],
}

/// Writes report artifacts as stages complete
#[derive(Debug)]
pub struct ReportWriter {
    config: BenchConfig,
    stages: Vec<StageSummary>,
}

impl ReportWriter {
    /// Prepare `output_dir` and start an empty cumulative summary
    ///
    /// # Errors
    ///
    /// Returns `Report` if the directory or summary file cannot be created.
    pub fn create(config: &BenchConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)
            .map_err(|e| BenchError::report(&config.output_dir, e))?;
        let summary = config.summary_path();
        File::create(&summary).map_err(|e| BenchError::report(&summary, e))?;

        Ok(Self {
            config: config.clone(),
            stages: Vec::with_capacity(Stage::ALL.len()),
        })
    }

    /// Persist one finished stage: raw samples, then its summary block
    pub fn write_stage(&mut self, report: &StageReport) -> Result<()> {
        let raw_path = self.config.stage_log_path(report.stage);
        write_raw_samples(&raw_path, report.recorder.raw())
            .map_err(|e| BenchError::report(&raw_path, e))?;

        let summary_path = self.config.summary_path();
        let block = format!(
            "{}\n{}\n\n",
            stage_heading(report.stage, report.count),
            format_statistics(&report.recorder)
        );
        append(&summary_path, &block).map_err(|e| BenchError::report(&summary_path, e))?;

        debug!(
            target: "kvbench::harness",
            stage = %report.stage,
            path = %raw_path.display(),
            "Stage report written"
        );

        self.stages.push(StageSummary {
            stage: report.stage,
            count: report.count,
            statistics: report.recorder.statistics(),
            diagnostics: report.recorder.diagnostics().map(str::to_string),
        });
        Ok(())
    }

    /// Write the JSON summary of every stage written so far
    pub fn finish(&self, seed: u64) -> Result<PathBuf> {
        let path = self.config.json_summary_path();
        let summary = RunSummary {
            generated_at: Utc::now(),
            seed,
            backend: self.config.backend,
            insert_count: self.config.insert_count,
            test_count: self.config.test_count(),
            stages: &self.stages,
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| BenchError::report(&path, e.into()))?;
        fs::write(&path, json).map_err(|e| BenchError::report(&path, e))?;
        Ok(path)
    }
}

fn write_raw_samples(path: &Path, samples: &[f64]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for sample in samples {
        writeln!(out, "{}", sample)?;
    }
    out.flush()
}

fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(text.as_bytes())
}
