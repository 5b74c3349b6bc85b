//! Latency samples and their summary statistics
//!
//! Percentiles use nearest-rank over a sorted copy of the samples:
//! `median = sorted[n / 2]`, `p99 = sorted[floor(n * 0.99)]`. No
//! interpolation is done.

use std::time::Duration;

use serde::Serialize;

/// Summary of a non-empty sample set, all times in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Number of samples
    pub count: usize,
    /// Arithmetic mean
    pub avg: f64,
    /// `sorted[n / 2]`
    pub median: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// `sorted[floor(n * 0.99)]`
    pub p99: f64,
}

/// Per-operation latencies of one stage
#[derive(Debug, Clone, Default)]
pub struct LatencyRecorder {
    samples: Vec<f64>,
    diagnostics: Option<String>,
}

impl LatencyRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty recorder with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            diagnostics: None,
        }
    }

    /// Append a sample in microseconds
    pub fn add(&mut self, sample_us: f64) {
        self.samples.push(sample_us);
    }

    /// Append an elapsed duration
    pub fn record(&mut self, elapsed: Duration) {
        self.add(elapsed.as_secs_f64() * 1_000_000.0);
    }

    /// Samples in recording order
    pub fn raw(&self) -> &[f64] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Summary statistics, `None` when no samples were recorded
    pub fn statistics(&self) -> Option<Statistics> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let sum: f64 = sorted.iter().sum();
        let p99_idx = ((n as f64 * 0.99) as usize).min(n - 1);

        Some(Statistics {
            count: n,
            avg: sum / n as f64,
            median: sorted[n / 2],
            min: sorted[0],
            max: sorted[n - 1],
            p99: sorted[p99_idx],
        })
    }

    /// Attach backend diagnostic text, replacing any earlier text
    pub fn attach_diagnostics(&mut self, text: impl Into<String>) {
        self.diagnostics = Some(text.into());
    }

    /// Attached diagnostic text
    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn recorder_of(samples: &[f64]) -> LatencyRecorder {
        let mut recorder = LatencyRecorder::new();
        for s in samples {
            recorder.add(*s);
        }
        recorder
    }

    #[test]
    fn one_to_ten_nearest_rank() {
        let recorder = recorder_of(&[3.0, 1.0, 4.0, 10.0, 5.0, 9.0, 2.0, 6.0, 8.0, 7.0]);
        let stats = recorder.statistics().unwrap();
        assert_eq!(stats.count, 10);
        assert_eq!(stats.median, 6.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.p99, 10.0);
        assert!((stats.avg - 5.5).abs() < 1e-12);
    }

    #[test]
    fn raw_keeps_recording_order() {
        let recorder = recorder_of(&[3.0, 1.0, 2.0]);
        assert_eq!(recorder.raw(), &[3.0, 1.0, 2.0]);
        recorder.statistics();
        assert_eq!(recorder.raw(), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_recorder_has_no_statistics() {
        let recorder = LatencyRecorder::new();
        assert!(recorder.is_empty());
        assert!(recorder.statistics().is_none());
    }

    #[test]
    fn single_sample() {
        let stats = recorder_of(&[42.0]).statistics().unwrap();
        assert_eq!((stats.min, stats.median, stats.max, stats.p99), (42.0, 42.0, 42.0, 42.0));
    }

    #[test]
    fn p99_of_hundred_is_last() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        let stats = recorder_of(&samples).statistics().unwrap();
        // floor(100 * 0.99) = 99
        assert_eq!(stats.p99, 100.0);
        assert_eq!(stats.median, 51.0);
    }

    #[test]
    fn p99_of_thousand() {
        let samples: Vec<f64> = (1..=1000).map(f64::from).collect();
        let stats = recorder_of(&samples).statistics().unwrap();
        assert_eq!(stats.p99, 991.0);
    }

    #[test]
    fn record_converts_to_microseconds() {
        let mut recorder = LatencyRecorder::new();
        recorder.record(Duration::from_micros(1500));
        recorder.record(Duration::from_nanos(500));
        assert_eq!(recorder.raw(), &[1500.0, 0.5]);
    }

    #[test]
    fn diagnostics_are_verbatim() {
        let mut recorder = LatencyRecorder::new();
        assert!(recorder.diagnostics().is_none());
        recorder.attach_diagnostics("line 1\nline 2");
        assert_eq!(recorder.diagnostics(), Some("line 1\nline 2"));
    }

    proptest! {
        #[test]
        fn statistics_are_ordered(samples in prop::collection::vec(0.0f64..1e6, 1..500)) {
            let stats = recorder_of(&samples).statistics().unwrap();
            prop_assert_eq!(stats.count, samples.len());
            prop_assert!(stats.min <= stats.median);
            prop_assert!(stats.median <= stats.p99);
            prop_assert!(stats.p99 <= stats.max);
            prop_assert!(stats.min <= stats.avg + 1e-6 && stats.avg <= stats.max + 1e-6);
            prop_assert!(samples.contains(&stats.median));
            prop_assert!(samples.contains(&stats.p99));
        }
    }
}
