//! Terminal rendering of reports and errors.

use std::error::Error;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use precheck_core::{error_chain, CheckOutcome, Report, ReportSummary};

/// Human-readable report.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    if report.is_pass() {
        out.push_str("check pass!!!\n");
    } else {
        let _ = writeln!(
            out,
            "check failed: {} of {} checks must be fixed",
            report.failures.len(),
            report.total
        );
        for outcome in &report.failures {
            render_outcome(&mut out, outcome);
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "warnings ({}):", report.warnings.len());
        for outcome in &report.warnings {
            render_outcome(&mut out, outcome);
        }
    }
    let _ = writeln!(
        out,
        "{}/{} checks passed (run {})",
        report.passed, report.total, report.run_id
    );
    out
}

fn render_outcome(out: &mut String, outcome: &CheckOutcome) {
    let _ = write!(out, "  - [{}] {}: {}", outcome.status, outcome.name, outcome.message);
    if let Some(reason) = outcome.reason {
        let _ = write!(out, " ({})", reason);
    }
    out.push('\n');
    for line in &outcome.detail {
        let _ = writeln!(out, "      {}", line);
    }
}

/// `err` followed by one indented "caused by" line per source.
pub fn render_error_stack(err: &(dyn Error + 'static)) -> String {
    let mut chain = error_chain(err).into_iter();
    let mut out = chain.next().unwrap_or_default();
    for cause in chain {
        let _ = write!(out, "\n    caused by: {}", cause);
    }
    out
}

/// Table of recent runs.
pub fn render_summaries(summaries: &[ReportSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prechecks ({}):", summaries.len());
    let _ = writeln!(
        out,
        "{:<36}  {:<20}  {:<7}  {:<9}  {}",
        "RUN ID", "TASK", "VERDICT", "PASSED", "FINISHED"
    );
    let _ = writeln!(out, "{}", "-".repeat(96));
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<36}  {:<20}  {:<7}  {:<9}  {}",
            s.run_id.as_str(),
            s.task_name,
            s.verdict.to_string(),
            format!("{}/{}", s.passed, s.total),
            format_timestamp(&s.finished_at)
        );
    }
    out
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
