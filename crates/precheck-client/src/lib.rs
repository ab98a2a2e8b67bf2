//! Client library for the task precheck master.
//!
//! Provides an HTTP client for submitting task files and reading reports.

pub mod error;
pub mod http;

pub use error::ClientError;
pub use http::HttpClient;
