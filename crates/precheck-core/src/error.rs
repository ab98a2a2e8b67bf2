//! Core domain errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core domain errors for task precheck.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The task configuration text could not be parsed.
    #[error("Failed to parse task config")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The task configuration parsed but is not usable.
    #[error("Invalid task config: {0}")]
    InvalidConfig(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// The caller aborted the precheck before any report was produced.
    #[error("Precheck cancelled")]
    Cancelled,
}

impl CoreError {
    /// Coarse classification used on the wire and for exit codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigParse(_) | Self::InvalidConfig(_) => ErrorKind::Input,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidStateTransition { .. } => ErrorKind::Internal,
        }
    }
}

/// Error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or unusable configuration; reported before any check runs.
    Input,
    /// Caller aborted.
    Cancelled,
    /// Defect in the engine itself.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Messages of `err` and each of its sources, outermost first.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_parse_error_keeps_source() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{").unwrap_err();
        let err = CoreError::from(yaml_err);
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(err.source().is_some());

        let chain = error_chain(&err);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0], "Failed to parse task config");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::Cancelled.to_string(), "cancelled");
        let err = CoreError::InvalidStateTransition {
            from: "DONE".into(),
            to: "RUNNING".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "Invalid state transition: DONE -> RUNNING");
    }
}
