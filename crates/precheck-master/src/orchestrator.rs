//! Concurrent check execution.
//!
//! Every check runs as its own tokio task. Results land in a slot indexed by
//! registry position, so completion order never affects output order. The
//! run ends when:
//! - all checks have reported, or
//! - the deadline (or caller cancellation) fired and the grace period has
//!   elapsed since.
//!
//! Any slot still empty at that point is filled with an `error` outcome, so
//! the output always has exactly one outcome per check.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use precheck_core::{CheckOutcome, CheckSpec, ErrorReason, TaskConfig};

use crate::checker::{CheckContext, Checker, SharedChecker};
use crate::config::EngineConfig;
use crate::pool::ProbePool;

/// Why the run stopped waiting for checks.
#[derive(Debug, Clone, Copy)]
struct Abort {
    reason: ErrorReason,
    grace_until: Instant,
}

/// Runs checks concurrently under a deadline.
pub struct Orchestrator {
    pool: ProbePool,
    grace_period: Duration,
    max_parallel: usize,
    probe_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator with its own probe pool.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_pool(config, ProbePool::new(config.max_probes))
    }

    /// Create an orchestrator sharing an existing probe pool.
    pub fn with_pool(config: &EngineConfig, pool: ProbePool) -> Self {
        Self {
            pool,
            grace_period: config.grace_period,
            max_parallel: config.max_parallel.max(1),
            probe_timeout: config.probe_timeout,
        }
    }

    pub fn pool(&self) -> &ProbePool {
        &self.pool
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Run `checks` and return one outcome per check, in the same order.
    ///
    /// Returns within `deadline + grace_period` even if a check never yields.
    /// Cancelling `cancel` behaves like an early deadline, with reason
    /// `cancelled`.
    pub async fn run(
        &self,
        config: Arc<TaskConfig>,
        checks: &[SharedChecker],
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Vec<CheckOutcome> {
        let run_token = cancel.child_token();
        let limit = ProbePool::new(self.max_parallel);
        let mut slots: Vec<Option<CheckOutcome>> = vec![None; checks.len()];
        let mut set = JoinSet::new();

        for (index, checker) in checks.iter().enumerate() {
            let checker = Arc::clone(checker);
            let ctx = CheckContext::new(
                Arc::clone(&config),
                run_token.clone(),
                self.pool.clone(),
                self.probe_timeout,
            );
            let limit = limit.clone();
            set.spawn(async move {
                let outcome = execute(checker.as_ref(), &ctx, &limit).await;
                (index, outcome)
            });
        }

        let deadline_at = Instant::now() + deadline;
        let mut abort: Option<Abort> = None;

        loop {
            let grace_until = abort.map(|a| a.grace_until);
            tokio::select! {
                joined = set.join_next() => match joined {
                    Some(Ok((index, Some(outcome)))) => {
                        slots[index] = Some(outcome);
                    }
                    // Never got a slot; filled below with the abort reason.
                    Some(Ok((_, None))) => {}
                    Some(Err(e)) => {
                        error!(error = %e, "Check task ended without reporting");
                    }
                    None => break,
                },
                _ = sleep_until(deadline_at), if abort.is_none() => {
                    warn!(
                        deadline_ms = deadline.as_millis() as u64,
                        pending = set.len(),
                        "Precheck deadline exceeded, cancelling checks"
                    );
                    run_token.cancel();
                    abort = Some(Abort {
                        reason: ErrorReason::DeadlineExceeded,
                        grace_until: Instant::now() + self.grace_period,
                    });
                }
                _ = cancel.cancelled(), if abort.is_none() => {
                    info!(pending = set.len(), "Precheck cancelled by caller");
                    abort = Some(Abort {
                        reason: ErrorReason::Cancelled,
                        grace_until: Instant::now() + self.grace_period,
                    });
                }
                _ = sleep_until(grace_until.unwrap_or(deadline_at)), if grace_until.is_some() => {
                    warn!(
                        pending = set.len(),
                        grace_ms = self.grace_period.as_millis() as u64,
                        "Checks did not wind down within grace period"
                    );
                    break;
                }
            }
        }

        // Stragglers are dropped at their next await point so they release
        // any pool permits they hold.
        set.abort_all();
        run_token.cancel();

        let reason = abort
            .map(|a| a.reason)
            .or_else(|| cancel.is_cancelled().then_some(ErrorReason::Cancelled));
        slots
            .into_iter()
            .zip(checks)
            .map(|(slot, checker)| slot.unwrap_or_else(|| unresponsive(checker.spec(), reason)))
            .collect()
    }
}

/// Run one check inside its task: wait for a parallelism slot, then run it
/// with panics contained.
///
/// Returns `None` if the run was aborted before the check got a slot.
async fn execute(
    checker: &dyn Checker,
    ctx: &CheckContext,
    limit: &ProbePool,
) -> Option<CheckOutcome> {
    let spec = checker.spec();

    let _slot = match limit.acquire(ctx.cancel_token()).await {
        Ok(permit) => permit,
        Err(_) => {
            debug!(check = %spec.name, "Run aborted before check started");
            return None;
        }
    };
    let started = std::time::Instant::now();

    let outcome = match AssertUnwindSafe(checker.check(ctx)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(check = %spec.name, panic = %message, "Check panicked");
            CheckOutcome::error(
                spec,
                ErrorReason::Panicked,
                format!("check panicked: {}", message),
            )
        }
    };
    debug_assert_eq!(outcome.name, spec.name, "outcome attributed to wrong check");

    let outcome = outcome.with_elapsed(started.elapsed());
    debug!(
        check = %spec.name,
        status = %outcome.status,
        elapsed_ms = outcome.elapsed_ms,
        "Check finished"
    );
    Some(outcome)
}

/// Outcome for a check that never reported.
fn unresponsive(spec: &CheckSpec, reason: Option<ErrorReason>) -> CheckOutcome {
    match reason {
        Some(ErrorReason::DeadlineExceeded) => CheckOutcome::error(
            spec,
            ErrorReason::DeadlineExceeded,
            "no outcome before the deadline and grace period elapsed",
        ),
        Some(ErrorReason::Cancelled) => CheckOutcome::error(
            spec,
            ErrorReason::Cancelled,
            "no outcome within the grace period after cancellation",
        ),
        _ => CheckOutcome::error(
            spec,
            ErrorReason::Internal,
            "check task ended without an outcome",
        ),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
