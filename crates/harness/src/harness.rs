//! Harness: runs the fixed stage sequence against one backend
//!
//! The harness owns the configuration, the generator and, for the length
//! of a run, the mirror. It is the single place a run stops: the first
//! error from any stage ends the sequence, the backend is closed, and the
//! error is returned to the caller.

use std::fmt;
use std::path::PathBuf;

use kvbench_core::{Backend, OpenOptions, STATS_PROPERTY};
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::mirror::OracleMirror;
use crate::report::ReportWriter;
use crate::sampler::KeyValueSampler;
use crate::stage::{Stage, StageReport};
use crate::verify::verify_consistency;
use crate::workload::StageContext;

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Seed the generator was created from
    pub seed: u64,
    /// One report per stage, in execution order
    pub stages: Vec<StageReport>,
    /// Where the JSON summary was written
    pub json_summary: PathBuf,
}

/// Callback run with each stage report once it is written
pub type StageObserver = Box<dyn FnMut(&StageReport)>;

/// Benchmark driver
pub struct Harness {
    config: BenchConfig,
    seed: u64,
    rng: StdRng,
    observer: Option<StageObserver>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Harness {
    /// Validate `config` and seed the generator
    ///
    /// Without a configured seed one is drawn from the OS and logged so
    /// the run can be repeated.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration fails validation.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| OsRng.gen());
        info!(
            target: "kvbench::harness",
            seed,
            configured = config.seed.is_some(),
            "Generator seeded"
        );
        Ok(Self {
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
            observer: None,
        })
    }

    /// Call `observer` with every stage report as soon as that stage's
    /// artifacts are written, before the next stage starts
    pub fn with_stage_observer(mut self, observer: impl FnMut(&StageReport) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// The run configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// The generator seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Open backend `B` at `db_path` and run every stage
    ///
    /// # Errors
    ///
    /// Returns `BackendFailure` if the backend cannot be opened, or any
    /// error [`run_with`](Self::run_with) returns.
    pub fn run<B: Backend>(&mut self) -> Result<RunReport> {
        let db_path = self.config.db_path.clone();
        if self.config.clean_start && db_path.exists() {
            debug!(target: "kvbench::harness", path = %db_path.display(), "Removing previous database");
            std::fs::remove_dir_all(&db_path)
                .map_err(|e| BenchError::backend(None, "open", None, e.into()))?;
        }

        let options = OpenOptions::default().sync_writes(self.config.sync_writes);
        let mut backend = B::open(&db_path, &options).map_err(|e| {
            error!(target: "kvbench::harness", path = %db_path.display(), error = %e, "Failed to open backend");
            BenchError::backend(None, "open", None, e)
        })?;
        info!(
            target: "kvbench::harness",
            path = %db_path.display(),
            backend = %self.config.backend,
            "Backend opened"
        );

        self.run_with(&mut backend)
    }

    /// Run every stage against an open backend
    ///
    /// The backend is closed when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first `BackendFailure`, `CorrectnessViolation`,
    /// `EmptyMirror` or `Report` error. A close failure after a successful
    /// run is returned as `BackendFailure`.
    pub fn run_with<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<RunReport> {
        let outcome = self.drive(backend);
        let closed = backend
            .close()
            .map_err(|e| BenchError::backend(None, "close", None, e));

        match (outcome, closed) {
            (Ok(report), Ok(())) => {
                info!(target: "kvbench::harness", stages = report.stages.len(), "Run complete");
                Ok(report)
            }
            (Ok(_), Err(e)) => {
                error!(target: "kvbench::harness", error = %e, "Run aborted");
                Err(e)
            }
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(target: "kvbench::harness", error = %close_err, "Backend close failed after abort");
                }
                error!(
                    target: "kvbench::harness",
                    stage = ?e.stage().map(Stage::name),
                    error = %e,
                    "Run aborted"
                );
                Err(e)
            }
        }
    }

    fn drive<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<RunReport> {
        let mut writer = ReportWriter::create(&self.config)?;
        let mut mirror = OracleMirror::new();
        let sampler = KeyValueSampler::new(self.config.key_length, self.config.value_length);
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        for stage in Stage::ALL {
            let count = match stage {
                Stage::Fill => self.config.insert_count,
                _ => self.config.test_count(),
            };
            info!(
                target: "kvbench::harness",
                stage = %stage,
                count,
                "[Stage {}] {} {} keys...",
                stage.number(),
                stage.label(),
                count
            );

            let mut ctx = StageContext {
                backend: &mut *backend,
                mirror: &mut mirror,
                rng: &mut self.rng,
                sampler: &sampler,
                range_scan_limit: self.config.range_scan_limit,
                progress_interval: self.config.progress_interval,
            };
            let mut report = ctx.run(stage, count)?;

            if self.config.verify_after_stage {
                verify_consistency(&*backend, &mirror, stage)?;
            }
            if let Some(stats) = backend.property(STATS_PROPERTY) {
                report.recorder.attach_diagnostics(stats);
            }

            writer.write_stage(&report)?;
            if let Some(stats) = report.recorder.statistics() {
                info!(
                    target: "kvbench::harness",
                    stage = %stage,
                    avg_us = stats.avg,
                    p99_us = stats.p99,
                    live_keys = mirror.len(),
                    "Stage complete"
                );
            }
            if let Some(observer) = self.observer.as_mut() {
                observer(&report);
            }
            stages.push(report);
        }

        let json_summary = writer.finish(self.seed)?;
        Ok(RunReport {
            seed: self.seed,
            stages,
            json_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvbench_storage::MemoryStore;
    use tempfile::TempDir;

    fn small_config(dir: &TempDir) -> BenchConfig {
        BenchConfig {
            insert_count: 200,
            key_length: 8,
            value_length: 16,
            db_path: dir.path().join("db"),
            output_dir: dir.path().join("out"),
            seed: Some(17),
            progress_interval: 50,
            verify_after_stage: true,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = BenchConfig {
            range_scan_limit: 0,
            ..BenchConfig::default()
        };
        assert!(matches!(Harness::new(config), Err(BenchError::Config(_))));
    }

    #[test]
    fn configured_seed_is_used() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(small_config(&dir)).unwrap();
        assert_eq!(harness.seed(), 17);
    }

    #[test]
    fn run_completes_all_stages() {
        let dir = TempDir::new().unwrap();
        let mut harness = Harness::new(small_config(&dir)).unwrap();
        let report = harness.run::<MemoryStore>().unwrap();

        let stages: Vec<Stage> = report.stages.iter().map(|r| r.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(report.stages[0].recorder.len(), 200);
        for stage in &report.stages[1..] {
            assert_eq!(stage.recorder.len(), 20);
        }
        assert!(report.stages[0]
            .recorder
            .diagnostics()
            .unwrap()
            .contains("backend: memory"));
        assert!(report.json_summary.exists());
    }

    #[test]
    fn run_with_closes_backend() {
        let dir = TempDir::new().unwrap();
        let mut harness = Harness::new(small_config(&dir)).unwrap();
        let mut store = MemoryStore::new();
        harness.run_with(&mut store).unwrap();
        assert!(store.get(b"anything").is_err());
    }

    #[test]
    fn observer_sees_each_stage_in_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let dir = TempDir::new().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let config = small_config(&dir);
        let summary = config.summary_path();
        let mut harness = Harness::new(config).unwrap().with_stage_observer(move |report| {
            // The stage's block is already in the cumulative summary
            let text = std::fs::read_to_string(&summary).unwrap();
            assert!(text.contains(&crate::report::stage_heading(report.stage, report.count)));
            sink.borrow_mut().push((report.stage, report.recorder.len()));
        });
        harness.run::<MemoryStore>().unwrap();

        let seen = seen.borrow();
        let stages: Vec<Stage> = seen.iter().map(|(stage, _)| *stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(seen[0].1, 200);
    }

    #[test]
    fn seeded_runs_are_repeatable() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let mut store_a = MemoryStore::new();
        let mut store_b = MemoryStore::new();
        Harness::new(small_config(&dir_a))
            .unwrap()
            .run_with(&mut store_a)
            .unwrap();
        Harness::new(small_config(&dir_b))
            .unwrap()
            .run_with(&mut store_b)
            .unwrap();
        assert_eq!(store_a.len(), store_b.len());
        assert_eq!(store_a.len(), 180);
    }
}
