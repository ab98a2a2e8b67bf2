//! Check identity and outcome types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CheckCategory, ErrorReason, OutcomeStatus, Severity};

/// Identifies one check within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Unique name within a run, e.g. `mysql-replica-01/connectivity`.
    pub name: String,

    /// What the check looks at.
    pub category: CheckCategory,

    /// Whether a non-passing outcome blocks the task.
    pub severity: Severity,

    /// Label of the endpoint under test, if the check targets one.
    pub endpoint: Option<String>,
}

impl CheckSpec {
    /// Create a new CheckSpec not tied to an endpoint.
    pub fn new(name: impl Into<String>, category: CheckCategory, severity: Severity) -> Self {
        Self {
            name: name.into(),
            category,
            severity,
            endpoint: None,
        }
    }

    /// Create a CheckSpec for `category` against the endpoint labelled `label`.
    ///
    /// The name is `<label>/<category>`.
    pub fn for_endpoint(label: &str, category: CheckCategory, severity: Severity) -> Self {
        Self {
            name: format!("{}/{}", label, category),
            category,
            severity,
            endpoint: Some(label.to_string()),
        }
    }
}

/// Result of running one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Name of the check that produced this outcome.
    pub name: String,

    pub category: CheckCategory,

    pub severity: Severity,

    pub status: OutcomeStatus,

    /// Human-readable explanation.
    pub message: String,

    /// Structured detail, e.g. offending table names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<String>,

    /// Why the check could not decide. Only set for `OutcomeStatus::Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorReason>,

    /// Wall time spent in the check.
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl CheckOutcome {
    fn with_status(spec: &CheckSpec, status: OutcomeStatus, message: String) -> Self {
        Self {
            name: spec.name.clone(),
            category: spec.category,
            severity: spec.severity,
            status,
            message,
            detail: Vec::new(),
            reason: None,
            elapsed_ms: 0,
        }
    }

    /// The rule holds.
    pub fn pass(spec: &CheckSpec, message: impl Into<String>) -> Self {
        Self::with_status(spec, OutcomeStatus::Pass, message.into())
    }

    /// The rule is violated.
    pub fn fail(spec: &CheckSpec, message: impl Into<String>) -> Self {
        Self::with_status(spec, OutcomeStatus::Fail, message.into())
    }

    /// The check could not decide.
    pub fn error(spec: &CheckSpec, reason: ErrorReason, message: impl Into<String>) -> Self {
        let mut outcome = Self::with_status(spec, OutcomeStatus::Error, message.into());
        outcome.reason = Some(reason);
        outcome
    }

    /// The check observed cancellation.
    pub fn cancelled(spec: &CheckSpec) -> Self {
        Self::error(spec, ErrorReason::Cancelled, "check cancelled")
    }

    /// Builder method to attach detail lines.
    pub fn with_detail<I, S>(mut self, detail: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detail.extend(detail.into_iter().map(Into::into));
        self
    }

    /// Builder method to record elapsed time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns true if this outcome counts against its severity class.
    pub fn is_problem(&self) -> bool {
        self.status.is_problem()
    }
}
