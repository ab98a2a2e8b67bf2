//! Shared application state.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use precheck_core::{CoreError, ErrorKind, OutcomeStatus, Report, ReportSummary, Verdict};

use crate::config::Config;
use crate::precheck::Engine;

/// Cumulative counters since startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecheckStats {
    pub runs_passed: u64,
    pub runs_failed: u64,
    pub runs_rejected: u64,
    pub runs_cancelled: u64,
    pub outcomes_passed: u64,
    pub outcomes_failed: u64,
    pub outcomes_errored: u64,
}

/// Shared application state.
pub struct AppState {
    /// Engine every request runs through.
    pub engine: Engine,

    /// Most recent reports, newest last.
    pub history: RwLock<VecDeque<Report>>,

    /// Maximum number of reports kept in `history`.
    pub history_size: usize,

    /// Counters for `/metrics`.
    pub stats: RwLock<PrecheckStats>,

    /// Fires on server shutdown; in-flight prechecks derive their tokens from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(config: &Config) -> Arc<Self> {
        Self::with_engine(config, Engine::new(config.engine.clone()))
    }

    /// Create an AppState around a prebuilt engine.
    pub fn with_engine(config: &Config, engine: Engine) -> Arc<Self> {
        Arc::new(Self {
            engine,
            history: RwLock::new(VecDeque::with_capacity(config.history_size)),
            history_size: config.history_size,
            stats: RwLock::new(PrecheckStats::default()),
            shutdown: CancellationToken::new(),
        })
    }

    /// Store a finished report and update counters.
    pub async fn record_report(&self, report: &Report) {
        {
            let mut stats = self.stats.write().await;
            match report.verdict {
                Verdict::Pass => stats.runs_passed += 1,
                Verdict::Fail => stats.runs_failed += 1,
            }
            stats.outcomes_passed += report.passed as u64;
            for outcome in report.failures.iter().chain(&report.warnings) {
                match outcome.status {
                    OutcomeStatus::Pass => stats.outcomes_passed += 1,
                    OutcomeStatus::Fail => stats.outcomes_failed += 1,
                    OutcomeStatus::Error => stats.outcomes_errored += 1,
                }
            }
        }

        if self.history_size == 0 {
            return;
        }
        let mut history = self.history.write().await;
        while history.len() >= self.history_size {
            history.pop_front();
        }
        history.push_back(report.clone());
    }

    /// Count a precheck that ended without a report.
    pub async fn record_error(&self, err: &CoreError) {
        let mut stats = self.stats.write().await;
        match err.kind() {
            ErrorKind::Cancelled => stats.runs_cancelled += 1,
            ErrorKind::Input | ErrorKind::Internal => stats.runs_rejected += 1,
        }
    }

    /// Find a stored report by run id.
    pub async fn find_report(&self, run_id: &str) -> Option<Report> {
        let history = self.history.read().await;
        history
            .iter()
            .find(|r| r.run_id.as_str() == run_id)
            .cloned()
    }

    /// Summaries of stored reports, newest first.
    pub async fn recent(&self) -> Vec<ReportSummary> {
        let history = self.history.read().await;
        history.iter().rev().map(Report::summary).collect()
    }
}
