//! Liveness and metrics handlers.

use std::sync::Arc;

use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};

use crate::http::responses::HealthResponse;
use crate::state::AppState;

/// Engine liveness. Answers 503 once shutdown has started so load balancers
/// stop routing new prechecks here.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let draining = state.shutdown.is_cancelled();
    let pool = state.engine.orchestrator().pool();
    let body = HealthResponse {
        status: if draining { "draining" } else { "ok" }.to_string(),
        probe_permits_available: pool.available(),
        probe_permits_total: pool.capacity(),
        stored_reports: state.history.read().await.len(),
    };
    let code = if draining {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(body))
}

/// Prometheus text exposition.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = crate::metrics::collect_metrics(&state).await;
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::Response;

    use crate::config::{Config, EngineConfig};

    async fn health(state: Arc<AppState>) -> (StatusCode, HealthResponse) {
        let response: Response = health_check(State(state)).await.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_pool() {
        let config = Config {
            engine: EngineConfig {
                max_probes: 3,
                ..EngineConfig::default()
            },
            ..Config::default()
        };
        let (status, body) = health(AppState::new(&config)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.probe_permits_total, 3);
        assert_eq!(body.probe_permits_available, 3);
        assert_eq!(body.stored_reports, 0);
    }

    #[tokio::test]
    async fn test_health_draining_after_shutdown() {
        let state = AppState::new(&Config::default());
        state.shutdown.cancel();
        let (status, body) = health(state).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "draining");
    }
}
