//! Task Precheck Master Library
//!
//! This crate provides the precheck engine (checker contract, registry,
//! orchestrator, aggregator) and the HTTP service that exposes it.

pub mod aggregator;
pub mod checker;
pub mod checks;
pub mod config;
pub mod http;
pub mod metrics;
pub mod orchestrator;
pub mod pool;
pub mod precheck;
pub mod registry;
pub mod state;

pub use checker::{CheckContext, Checker, SharedChecker};
pub use config::{Config, EngineConfig};
pub use orchestrator::Orchestrator;
pub use pool::{PoolError, ProbePool};
pub use precheck::{check_task, Engine, PrecheckRun, Registry};
pub use state::AppState;
