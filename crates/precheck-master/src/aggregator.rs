//! Reduces check outcomes into a report.

use chrono::{DateTime, Utc};

use precheck_core::{CheckOutcome, OutcomeStatus, Report, RunId, Severity, Verdict};

/// Reduce `outcomes` (in registry order) into a report.
///
/// The verdict is `Fail` iff some fatal outcome is not `Pass`. Failures and
/// warnings keep the input order.
pub fn aggregate(
    run_id: RunId,
    task_name: impl Into<String>,
    started_at: DateTime<Utc>,
    outcomes: Vec<CheckOutcome>,
) -> Report {
    let total = outcomes.len();
    let passed = outcomes
        .iter()
        .filter(|o| o.status == OutcomeStatus::Pass)
        .count();

    let (fatal, warning): (Vec<CheckOutcome>, Vec<CheckOutcome>) = outcomes
        .into_iter()
        .filter(CheckOutcome::is_problem)
        .partition(|o| o.severity == Severity::Fatal);

    let verdict = if fatal.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    Report {
        run_id,
        task_name: task_name.into(),
        verdict,
        failures: fatal,
        warnings: warning,
        total,
        passed,
        started_at,
        finished_at: Utc::now(),
    }
}
