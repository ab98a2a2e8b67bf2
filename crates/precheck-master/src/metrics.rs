//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::Arc;

use crate::state::AppState;

/// Collect all metrics from AppState and format as Prometheus text.
pub async fn collect_metrics(state: &Arc<AppState>) -> String {
    let mut output = String::new();

    collect_run_metrics(state, &mut output).await;
    collect_outcome_metrics(state, &mut output).await;
    collect_pool_metrics(state, &mut output);

    output
}

/// Precheck runs by result.
async fn collect_run_metrics(state: &Arc<AppState>, output: &mut String) {
    let stats = state.stats.read().await;

    writeln!(
        output,
        "# HELP precheck_runs_total Number of precheck runs by result"
    )
    .ok();
    writeln!(output, "# TYPE precheck_runs_total counter").ok();
    writeln!(output, "precheck_runs_total{{result=\"pass\"}} {}", stats.runs_passed).ok();
    writeln!(output, "precheck_runs_total{{result=\"fail\"}} {}", stats.runs_failed).ok();
    writeln!(
        output,
        "precheck_runs_total{{result=\"rejected\"}} {}",
        stats.runs_rejected
    )
    .ok();
    writeln!(
        output,
        "precheck_runs_total{{result=\"cancelled\"}} {}",
        stats.runs_cancelled
    )
    .ok();
}

/// Check outcomes by status.
async fn collect_outcome_metrics(state: &Arc<AppState>, output: &mut String) {
    let stats = state.stats.read().await;

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP precheck_check_outcomes_total Number of check outcomes by status"
    )
    .ok();
    writeln!(output, "# TYPE precheck_check_outcomes_total counter").ok();
    writeln!(
        output,
        "precheck_check_outcomes_total{{status=\"pass\"}} {}",
        stats.outcomes_passed
    )
    .ok();
    writeln!(
        output,
        "precheck_check_outcomes_total{{status=\"fail\"}} {}",
        stats.outcomes_failed
    )
    .ok();
    writeln!(
        output,
        "precheck_check_outcomes_total{{status=\"error\"}} {}",
        stats.outcomes_errored
    )
    .ok();
}

fn collect_pool_metrics(state: &Arc<AppState>, output: &mut String) {
    let pool = state.engine.orchestrator().pool();

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP precheck_probe_permits_available Free probe permits"
    )
    .ok();
    writeln!(output, "# TYPE precheck_probe_permits_available gauge").ok();
    writeln!(output, "precheck_probe_permits_available {}", pool.available()).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_collect_metrics_empty_state() {
        let state = AppState::new(&Config::default());
        let output = collect_metrics(&state).await;

        assert!(output.contains("precheck_runs_total{result=\"pass\"} 0"));
        assert!(output.contains("precheck_check_outcomes_total{status=\"error\"} 0"));
        assert!(output.contains(&format!(
            "precheck_probe_permits_available {}",
            Config::default().engine.max_probes
        )));
    }
}
