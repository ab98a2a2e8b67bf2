//! Checker contract.
//!
//! A checker is one independent validation rule. It reads the task config,
//! may probe the systems it names, and produces exactly one outcome. Checkers
//! never return errors: anything that prevents a decision is reported as an
//! `OutcomeStatus::Error` outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use precheck_core::{CheckOutcome, CheckSpec, ErrorReason, TaskConfig};

use crate::pool::{PoolError, ProbePool};

/// A single validation rule.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Identity of this check.
    fn spec(&self) -> &CheckSpec;

    /// Run the check.
    ///
    /// Implementations must return promptly once `ctx.cancel_token()` fires,
    /// typically by wrapping their work in [`CheckContext::guard`].
    async fn check(&self, ctx: &CheckContext) -> CheckOutcome;
}

/// Shared handle to a checker.
pub type SharedChecker = Arc<dyn Checker>;

/// Everything a checker may use while running.
#[derive(Clone)]
pub struct CheckContext {
    config: Arc<TaskConfig>,
    cancel: CancellationToken,
    pool: ProbePool,
    probe_timeout: Duration,
}

impl CheckContext {
    pub fn new(
        config: Arc<TaskConfig>,
        cancel: CancellationToken,
        pool: ProbePool,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            config,
            cancel,
            pool,
            probe_timeout,
        }
    }

    /// Read-only task configuration.
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Pool limiting concurrent probes against source/target systems.
    pub fn pool(&self) -> &ProbePool {
        &self.pool
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Race `work` against cancellation.
    ///
    /// Returns a `cancelled` outcome for `spec` if the token fires first.
    pub async fn guard<F>(&self, spec: &CheckSpec, work: F) -> CheckOutcome
    where
        F: Future<Output = CheckOutcome>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => CheckOutcome::cancelled(spec),
            outcome = work => outcome,
        }
    }

    /// Acquire a probe permit, mapping pool failures to outcomes.
    pub async fn probe_permit(
        &self,
        spec: &CheckSpec,
    ) -> Result<tokio::sync::OwnedSemaphorePermit, CheckOutcome> {
        self.pool.acquire(&self.cancel).await.map_err(|e| match e {
            PoolError::Cancelled => CheckOutcome::cancelled(spec),
            PoolError::Closed => CheckOutcome::error(spec, ErrorReason::Internal, e.to_string()),
        })
    }
}
