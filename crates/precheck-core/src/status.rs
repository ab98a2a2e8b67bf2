//! Status enums for checks, outcomes, and runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a failing check blocks the task or only warns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A non-passing outcome fails the whole precheck.
    Fatal,
    /// A non-passing outcome is reported but does not block.
    Warning,
}

/// What a check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckCategory {
    Connectivity,
    Privilege,
    Schema,
    BinlogFormat,
    Version,
    /// Placeholder for an endpoint kind no checker understands.
    Unsupported,
}

impl CheckCategory {
    /// Kebab-case name, as used in check names and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Privilege => "privilege",
            Self::Schema => "schema",
            Self::BinlogFormat => "binlog-format",
            Self::Version => "version",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The rule holds.
    Pass,
    /// The check ran and the configuration violates the rule.
    Fail,
    /// The check could not decide.
    Error,
}

impl OutcomeStatus {
    /// Returns true for anything other than `Pass`.
    pub fn is_problem(&self) -> bool {
        !matches!(self, Self::Pass)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Why a check ended in `OutcomeStatus::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorReason {
    /// The check observed the cancellation signal.
    Cancelled,
    /// The overall deadline elapsed and the check did not respond in time.
    DeadlineExceeded,
    /// The check panicked.
    Panicked,
    /// The endpoint kind is not supported.
    Unsupported,
    /// Network failure talking to the endpoint.
    Network,
    /// Authentication failure.
    Auth,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::Panicked => "panicked",
            Self::Unsupported => "unsupported",
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Overall precheck verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("pass"),
            Self::Fail => f.write_str("fail"),
        }
    }
}

/// Lifecycle of a precheck run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// Checks are being registered from the task config.
    #[default]
    Building,
    /// Checks are executing.
    Running,
    /// Outcomes are being reduced into a report.
    Aggregating,
    /// Report produced.
    Done,
}

impl RunPhase {
    /// The only phase this one may move to, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Building => Some(Self::Running),
            Self::Running => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Building => "BUILDING",
            Self::Running => "RUNNING",
            Self::Aggregating => "AGGREGATING",
            Self::Done => "DONE",
        };
        f.write_str(s)
    }
}
