//! Task Precheck Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Runtime specifics
//!
//! The task configuration, check identities, outcomes, and reports live here
//! so that the master, the client, and the CLI agree on one data model.

pub mod check;
pub mod config;
pub mod error;
pub mod ids;
pub mod report;
pub mod status;

// Re-export commonly used types
pub use check::{CheckOutcome, CheckSpec};
pub use config::{
    Endpoint, PrecheckOptions, RouteRule, SourceInstance, TaskConfig, TaskMode, RESERVED_LABELS,
    SCHEMA_LABEL, TARGET_LABEL,
};
pub use error::{error_chain, CoreError, ErrorKind};
pub use ids::RunId;
pub use report::{Report, ReportSummary};
pub use status::{CheckCategory, ErrorReason, OutcomeStatus, RunPhase, Severity, Verdict};
