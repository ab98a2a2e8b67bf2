//! HTTP server for the master.
//!
//! Provides endpoints for:
//! - Task precheck (`/v1/check-task`)
//! - Recent reports (`/v1/prechecks`, `/v1/prechecks/:run_id`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // API routes
        .route("/v1/check-task", post(handlers::check_task))
        .route("/v1/prechecks", get(handlers::list_prechecks))
        .route("/v1/prechecks/:run_id", get(handlers::get_precheck))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
