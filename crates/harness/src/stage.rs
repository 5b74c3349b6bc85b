//! Workload stages and their reports

use std::fmt;

use serde::Serialize;

use crate::recorder::LatencyRecorder;

/// One phase of the fixed benchmark sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Bulk insert of unique pairs
    Fill,
    /// Random point reads of existing keys
    PointRead,
    /// Random deletes of existing keys
    Delete,
    /// Random overwrites of existing keys
    Update,
    /// Bounded forward scans from existing keys
    RangeScan,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 5] = [
        Stage::Fill,
        Stage::PointRead,
        Stage::Delete,
        Stage::Update,
        Stage::RangeScan,
    ];

    /// 1-based position in the sequence, used in artifact names
    pub fn number(self) -> usize {
        match self {
            Stage::Fill => 1,
            Stage::PointRead => 2,
            Stage::Delete => 3,
            Stage::Update => 4,
            Stage::RangeScan => 5,
        }
    }

    /// Short identifier used in log fields
    pub fn name(self) -> &'static str {
        match self {
            Stage::Fill => "fill",
            Stage::PointRead => "point_read",
            Stage::Delete => "delete",
            Stage::Update => "update",
            Stage::RangeScan => "range_scan",
        }
    }

    /// Human label used in the cumulative summary
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fill => "Insert",
            Stage::PointRead => "Point lookup",
            Stage::Delete => "Sequentially delete",
            Stage::Update => "Sequentially update",
            Stage::RangeScan => "Range lookup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one completed stage
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Which stage ran
    pub stage: Stage,
    /// Iterations the stage was asked to run
    pub count: usize,
    /// Latency samples and attached diagnostics
    pub recorder: LatencyRecorder,
}

impl StageReport {
    /// Wrap a finished recorder
    pub fn new(stage: Stage, count: usize, recorder: LatencyRecorder) -> Self {
        Self {
            stage,
            count,
            recorder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_numbered_in_order() {
        let numbers: Vec<usize> = Stage::ALL.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(Stage::RangeScan.to_string(), "range_scan");
        assert_eq!(Stage::Fill.label(), "Insert");
    }
}
