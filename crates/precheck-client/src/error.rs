//! Error types for the precheck client.

use precheck_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur when talking to the master.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to reach the master.
    #[error("connection to {addr} failed")]
    Connection {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The master refused the request.
    #[error("master rejected request ({status}, {kind}): {message}")]
    Rejected {
        status: u16,
        kind: ErrorKind,
        message: String,
    },

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Returns true if the master judged the task file itself to be invalid.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Rejected { kind: ErrorKind::Input, .. })
    }
}
