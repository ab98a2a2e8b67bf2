//! HTTP request and response types.

use serde::{Deserialize, Serialize};

use precheck_core::ErrorKind;

// ============================================================================
// Precheck types
// ============================================================================

/// Request body for the check-task endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckTaskRequest {
    /// Raw task file contents (YAML or JSON).
    pub task: String,

    /// Overall deadline override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

// ============================================================================
// Error types
// ============================================================================

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message with its causes, outermost first, joined by ": ".
    pub error: String,

    pub kind: ErrorKind,
}

// ============================================================================
// Health types
// ============================================================================

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` while accepting prechecks, `draining` after shutdown began.
    pub status: String,

    pub probe_permits_available: usize,

    pub probe_permits_total: usize,

    /// Reports currently held for `/v1/prechecks`.
    pub stored_reports: usize,
}
