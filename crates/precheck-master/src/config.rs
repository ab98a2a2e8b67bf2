//! Master and engine configuration.

use std::time::Duration;

/// Orchestration settings shared by every precheck run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deadline applied when neither the request nor the task file sets one.
    pub default_deadline: Duration,

    /// How long to wait for checks to wind down after cancellation.
    pub grace_period: Duration,

    /// Maximum number of checks executing at once.
    pub max_parallel: usize,

    /// Maximum number of concurrent probes against source/target systems.
    pub max_probes: usize,

    /// Timeout for a single network probe.
    pub probe_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_deadline: Duration::from_secs(30),
            grace_period: Duration::from_secs(2),
            max_parallel: 8,
            max_probes: 4,
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Master server configuration.
pub struct Config {
    /// HTTP server bind address.
    pub http_bind_addr: String,

    /// Number of recent reports kept for `/v1/prechecks`.
    pub history_size: usize,

    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_bind_addr: "127.0.0.1:8261".to_string(),
            history_size: 64,
            engine: EngineConfig::default(),
        }
    }
}
