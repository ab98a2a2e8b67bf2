//! Precheck report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CheckOutcome, RunId, Verdict};

/// Aggregated result of one precheck run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unique run identifier.
    pub run_id: RunId,

    /// Name of the task that was checked.
    pub task_name: String,

    /// Overall verdict.
    pub verdict: Verdict,

    /// Non-passing fatal outcomes, in registry order.
    pub failures: Vec<CheckOutcome>,

    /// Non-passing warning outcomes, in registry order.
    pub warnings: Vec<CheckOutcome>,

    /// Number of checks that ran.
    pub total: usize,

    /// Number of checks that passed.
    pub passed: usize,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the report was produced.
    pub finished_at: DateTime<Utc>,
}

impl Report {
    /// Returns true if the task may run.
    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Compact view for listings.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id.clone(),
            task_name: self.task_name.clone(),
            verdict: self.verdict,
            total: self.total,
            passed: self.passed,
            failures: self.failures.len(),
            warnings: self.warnings.len(),
            finished_at: self.finished_at,
        }
    }
}

/// Summary of a Report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: RunId,
    pub task_name: String,
    pub verdict: Verdict,
    pub total: usize,
    pub passed: usize,
    pub failures: usize,
    pub warnings: usize,
    pub finished_at: DateTime<Utc>,
}
