//! Workload stage executors
//!
//! Each stage runs a fixed number of iterations against the backend and
//! the mirror. One iteration:
//!
//! 1. picks a key (a fresh unique pair for fill, a random live key otherwise)
//! 2. times exactly one backend call with a monotonic clock
//! 3. records the elapsed microseconds
//! 4. applies the same change to the mirror
//! 5. checks what the backend returned
//!
//! Delete and update keep the keys they touched and read them all back once
//! the timed loop is over.
//!
//! # Design Notes
//!
//! - Stages never stop the run themselves. Every failure is returned and
//!   the harness decides.
//! - Only the backend call sits inside the clock; sampling, mirror updates
//!   and checks do not count toward latency.

use std::time::Instant;

use kvbench_core::Backend;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{BenchError, Result};
use crate::mirror::OracleMirror;
use crate::recorder::LatencyRecorder;
use crate::sampler::KeyValueSampler;
use crate::stage::{Stage, StageReport};
use crate::verify::Lockstep;

/// Everything a stage works on, lent by the harness for one stage
pub struct StageContext<'a, B: ?Sized, R: ?Sized> {
    /// Backend under test
    pub backend: &'a mut B,
    /// Expected backend contents
    pub mirror: &'a mut OracleMirror,
    /// Run-wide generator
    pub rng: &'a mut R,
    /// Pair generator
    pub sampler: &'a KeyValueSampler,
    /// Maximum pairs per range scan
    pub range_scan_limit: usize,
    /// Iterations between progress events
    pub progress_interval: usize,
}

impl<'a, B, R> StageContext<'a, B, R>
where
    B: Backend + ?Sized,
    R: Rng + ?Sized,
{
    /// Run `stage` for `count` iterations
    pub fn run(&mut self, stage: Stage, count: usize) -> Result<StageReport> {
        let recorder = match stage {
            Stage::Fill => self.fill(count)?,
            Stage::PointRead => self.point_read(count)?,
            Stage::Delete => self.delete(count)?,
            Stage::Update => self.update(count)?,
            Stage::RangeScan => self.range_scan(count)?,
        };
        Ok(StageReport::new(stage, count, recorder))
    }

    /// Insert `count` fresh pairs
    pub fn fill(&mut self, count: usize) -> Result<LatencyRecorder> {
        let stage = Stage::Fill;
        let progress = Progress::new(stage, count, self.progress_interval);
        let mut recorder = LatencyRecorder::with_capacity(count);
        let mut collisions = 0u64;

        for done in 1..=count {
            let pair = loop {
                let pair = self.sampler.sample(&mut *self.rng);
                if !self.mirror.contains(pair.key()) {
                    break pair;
                }
                collisions += 1;
            };

            let result = timed(&mut recorder, || self.backend.put(pair.key(), pair.value()));
            result.map_err(|e| BenchError::backend(Some(stage), "put", Some(pair.key()), e))?;
            self.mirror.insert(pair.key(), pair.value());

            progress.tick(done);
        }

        if collisions > 0 {
            debug!(target: "kvbench::stage", stage = %stage, collisions, "Resampled colliding keys");
        }
        Ok(recorder)
    }

    /// Read `count` random live keys and compare with the mirror
    pub fn point_read(&mut self, count: usize) -> Result<LatencyRecorder> {
        let stage = Stage::PointRead;
        let progress = Progress::new(stage, count, self.progress_interval);
        let mut recorder = LatencyRecorder::with_capacity(count);

        for done in 1..=count {
            let key = self.pick_key(stage)?;

            let result = timed(&mut recorder, || self.backend.get(&key));
            let observed =
                result.map_err(|e| BenchError::backend(Some(stage), "get", Some(&key), e))?;

            let expected = self.mirror.lookup(&key);
            if observed.as_deref() != expected {
                return Err(BenchError::violation(stage, &key, expected, observed.as_deref()));
            }

            progress.tick(done);
        }
        Ok(recorder)
    }

    /// Delete `count` random live keys, then check none of them reads back
    pub fn delete(&mut self, count: usize) -> Result<LatencyRecorder> {
        let stage = Stage::Delete;
        let progress = Progress::new(stage, count, self.progress_interval);
        let mut recorder = LatencyRecorder::with_capacity(count);
        let mut deleted = Vec::with_capacity(count);

        for done in 1..=count {
            let key = self.pick_key(stage)?;

            let result = timed(&mut recorder, || self.backend.delete(&key));
            result.map_err(|e| BenchError::backend(Some(stage), "delete", Some(&key), e))?;
            self.mirror.delete(&key);
            deleted.push(key);

            progress.tick(done);
        }

        for key in &deleted {
            let observed = self
                .backend
                .get(key)
                .map_err(|e| BenchError::backend(Some(stage), "get", Some(key), e))?;
            if let Some(value) = observed {
                return Err(BenchError::violation(stage, key, None, Some(&value)));
            }
        }
        debug!(target: "kvbench::stage", stage = %stage, keys = deleted.len(), "Deleted keys read back as absent");
        Ok(recorder)
    }

    /// Overwrite `count` random live keys, then check each reads its
    /// newest value
    pub fn update(&mut self, count: usize) -> Result<LatencyRecorder> {
        let stage = Stage::Update;
        let progress = Progress::new(stage, count, self.progress_interval);
        let mut recorder = LatencyRecorder::with_capacity(count);
        let mut updated = Vec::with_capacity(count);

        for done in 1..=count {
            let key = self.pick_key(stage)?;
            let value = self.sampler.sample_value(&mut *self.rng);

            let result = timed(&mut recorder, || self.backend.put(&key, &value));
            result.map_err(|e| BenchError::backend(Some(stage), "put", Some(&key), e))?;
            self.mirror.update(&key, &value);
            updated.push(key);

            progress.tick(done);
        }

        // A key drawn twice only needs one read
        updated.sort_unstable();
        updated.dedup();
        for key in &updated {
            let observed = self
                .backend
                .get(key)
                .map_err(|e| BenchError::backend(Some(stage), "get", Some(key), e))?;
            let expected = self.mirror.lookup(key);
            if observed.as_deref() != expected {
                return Err(BenchError::violation(stage, key, expected, observed.as_deref()));
            }
        }
        debug!(target: "kvbench::stage", stage = %stage, keys = updated.len(), "Updated keys read back their newest value");
        Ok(recorder)
    }

    /// Run `count` bounded scans from random live keys
    ///
    /// Iterator creation, the seek and every read are timed together.
    pub fn range_scan(&mut self, count: usize) -> Result<LatencyRecorder> {
        let stage = Stage::RangeScan;
        let progress = Progress::new(stage, count, self.progress_interval);
        let mut recorder = LatencyRecorder::with_capacity(count);
        let limit = self.range_scan_limit;
        let mut scanned = Vec::with_capacity(limit);

        for done in 1..=count {
            let key = self.pick_key(stage)?;
            scanned.clear();

            let start = Instant::now();
            let status = {
                let mut it = self.backend.iter();
                it.seek(&key);
                while it.valid() && scanned.len() < limit {
                    scanned.push((it.key().to_vec(), it.value().to_vec()));
                    it.next();
                }
                it.status()
            };
            recorder.record(start.elapsed());

            status.map_err(|e| BenchError::backend(Some(stage), "iterator", Some(&key), e))?;

            let mut lockstep = Lockstep::new(stage, self.mirror.range_from(&key, limit).into_iter());
            for (k, v) in &scanned {
                lockstep.observe(k, v)?;
            }
            lockstep.finish()?;

            progress.tick(done);
        }
        Ok(recorder)
    }

    fn pick_key(&mut self, stage: Stage) -> Result<Vec<u8>> {
        self.mirror
            .random_existing_key(&mut *self.rng)
            .map(<[u8]>::to_vec)
            .map_err(|_| BenchError::EmptyMirror { stage })
    }
}

/// Time one backend call into `recorder`
fn timed<T>(recorder: &mut LatencyRecorder, op: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = op();
    recorder.record(start.elapsed());
    out
}

/// Emits an `info` event every `interval` completed iterations
struct Progress {
    stage: Stage,
    total: usize,
    interval: usize,
}

impl Progress {
    fn new(stage: Stage, total: usize, interval: usize) -> Self {
        Self {
            stage,
            total,
            interval: interval.max(1),
        }
    }

    fn tick(&self, done: usize) {
        if done % self.interval == 0 {
            let percent = format!("{:.1}%", done as f64 * 100.0 / self.total as f64);
            info!(
                target: "kvbench::stage",
                stage = %self.stage,
                done,
                total = self.total,
                percent = %percent,
                "Progress"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvbench_storage::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        store: MemoryStore,
        mirror: OracleMirror,
        rng: StdRng,
        sampler: KeyValueSampler,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                mirror: OracleMirror::new(),
                rng: StdRng::seed_from_u64(1234),
                sampler: KeyValueSampler::new(8, 32),
            }
        }

        fn ctx(&mut self) -> StageContext<'_, MemoryStore, StdRng> {
            StageContext {
                backend: &mut self.store,
                mirror: &mut self.mirror,
                rng: &mut self.rng,
                sampler: &self.sampler,
                range_scan_limit: 16,
                progress_interval: 50,
            }
        }
    }

    #[test]
    fn fill_inserts_unique_keys() {
        let mut fx = Fixture::new();
        let recorder = fx.ctx().fill(200).unwrap();
        assert_eq!(recorder.len(), 200);
        assert_eq!(fx.mirror.len(), 200);
        assert_eq!(fx.store.len(), 200);
    }

    #[test]
    fn fill_resamples_collisions() {
        // One-byte keys: 95 possible, so collisions are certain
        let mut fx = Fixture::new();
        fx.sampler = KeyValueSampler::new(1, 4);
        fx.ctx().fill(95).unwrap();
        assert_eq!(fx.mirror.len(), 95);
    }

    #[test]
    fn stages_pass_against_correct_backend() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        for stage in Stage::ALL {
            let count = if stage == Stage::Fill { 300 } else { 30 };
            let report = ctx.run(stage, count).unwrap();
            assert_eq!(report.stage, stage);
            assert_eq!(report.recorder.len(), count);
        }
        assert_eq!(fx.mirror.len(), 270);
        assert_eq!(fx.store.len(), 270);
    }

    #[test]
    fn point_read_on_empty_mirror_fails() {
        let mut fx = Fixture::new();
        let err = fx.ctx().point_read(1).unwrap_err();
        assert!(matches!(err, BenchError::EmptyMirror { stage: Stage::PointRead }));
    }

    #[test]
    fn zero_iterations_record_nothing() {
        let mut fx = Fixture::new();
        let recorder = fx.ctx().point_read(0).unwrap();
        assert!(recorder.statistics().is_none());
    }

    #[test]
    fn point_read_reports_missing_key() {
        let mut fx = Fixture::new();
        fx.ctx().fill(1).unwrap();
        let key = fx.mirror.iter().next().unwrap().0.to_vec();
        fx.store.delete(&key).unwrap();

        match fx.ctx().point_read(1).unwrap_err() {
            BenchError::CorrectnessViolation {
                stage,
                key: k,
                expected,
                observed,
            } => {
                assert_eq!(stage, Stage::PointRead);
                assert_eq!(k, key);
                assert!(expected.is_some());
                assert!(observed.is_none());
            }
            other => panic!("expected violation, got {}", other),
        }
    }

    #[test]
    fn delete_removes_from_mirror() {
        let mut fx = Fixture::new();
        fx.ctx().fill(100).unwrap();
        fx.ctx().delete(10).unwrap();
        assert_eq!(fx.mirror.len(), 90);
        assert_eq!(fx.store.len(), 90);
    }

    #[test]
    fn range_scan_reports_unexpected_key() {
        let mut fx = Fixture::new();
        fx.ctx().fill(1).unwrap();
        // A key the mirror does not know sorts after every printable key
        fx.store.put(b"\x7f", b"stray").unwrap();

        let err = fx.ctx().range_scan(1).unwrap_err();
        match err {
            BenchError::CorrectnessViolation {
                key,
                expected,
                observed,
                ..
            } => {
                assert_eq!(key, b"\x7f".to_vec());
                assert_eq!(expected, None);
                assert_eq!(observed, Some(b"stray".to_vec()));
            }
            other => panic!("expected violation, got {}", other),
        }
    }

    #[test]
    fn range_scan_respects_limit() {
        let mut fx = Fixture::new();
        fx.ctx().fill(100).unwrap();
        let mut ctx = fx.ctx();
        ctx.range_scan_limit = 1;
        assert!(ctx.range_scan(20).is_ok());
    }

    #[test]
    fn timed_records_one_sample() {
        let mut recorder = LatencyRecorder::new();
        let out = timed(&mut recorder, || 7);
        assert_eq!(out, 7);
        assert_eq!(recorder.len(), 1);
        assert!(recorder.raw()[0] >= 0.0);
    }
}
