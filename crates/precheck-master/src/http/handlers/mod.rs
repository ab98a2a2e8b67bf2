//! HTTP request handlers.

mod health;
mod precheck;

pub use health::{health_check, metrics_handler};
pub use precheck::{check_task, get_precheck, list_prechecks};
