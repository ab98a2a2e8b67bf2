//! Precheck handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use precheck_core::{error_chain, CoreError, ErrorKind};

use crate::http::responses::{CheckTaskRequest, ErrorResponse};
use crate::state::AppState;

/// Precheck a task file.
///
/// The run is cancelled on server shutdown, or when the client goes away and
/// this future is dropped.
pub async fn check_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckTaskRequest>,
) -> impl IntoResponse {
    if req.deadline_ms == Some(0) {
        let err = CoreError::InvalidConfig("deadline_ms must be positive".into());
        state.record_error(&err).await;
        return error_response(&err).into_response();
    }

    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();
    let deadline = req.deadline_ms.map(Duration::from_millis);

    match state.engine.check_task(&cancel, &req.task, deadline).await {
        Ok(report) => {
            state.record_report(&report).await;
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            warn!(error = %e, kind = %e.kind(), "Precheck did not produce a report");
            state.record_error(&e).await;
            error_response(&e).into_response()
        }
    }
}

fn error_response(err: &CoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err.kind() {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error_chain(err).join(": "),
            kind: err.kind(),
        }),
    )
}

/// List recent precheck reports, newest first.
pub async fn list_prechecks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent().await)
}

/// Fetch one stored report.
pub async fn get_precheck(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> impl IntoResponse {
    match state.find_report(&run_id).await {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => {
            info!(run_id = %run_id, "Report not found");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("no report for run {}", run_id),
                    kind: ErrorKind::Input,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::to_bytes;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, Severity, TaskConfig};

    use crate::checker::{CheckContext, Checker, SharedChecker};
    use crate::config::{Config, EngineConfig};
    use crate::precheck::Engine;

    /// Hands its run token to the test, then never finishes.
    struct Stalls {
        spec: CheckSpec,
        started: Mutex<Option<oneshot::Sender<CancellationToken>>>,
    }

    #[async_trait]
    impl Checker for Stalls {
        fn spec(&self) -> &CheckSpec {
            &self.spec
        }

        async fn check(&self, ctx: &CheckContext) -> CheckOutcome {
            let sender = self.started.lock().unwrap().take();
            if let Some(sender) = sender {
                let _ = sender.send(ctx.cancel_token().clone());
            }
            std::future::pending().await
        }
    }

    fn stalled_state() -> (Arc<AppState>, oneshot::Receiver<CancellationToken>) {
        let (tx, rx) = oneshot::channel();
        let stalls: SharedChecker = Arc::new(Stalls {
            spec: CheckSpec::new("stalls", CheckCategory::Connectivity, Severity::Fatal),
            started: Mutex::new(Some(tx)),
        });
        let engine = Engine::with_registry(
            EngineConfig {
                grace_period: Duration::from_millis(20),
                ..EngineConfig::default()
            },
            Arc::new(move |_: &TaskConfig| vec![Arc::clone(&stalls)]),
        );
        (AppState::with_engine(&Config::default(), engine), rx)
    }

    fn request() -> CheckTaskRequest {
        CheckTaskRequest {
            task: "name: t\ntarget-database: {host: db, port: 4000}\nmysql-instances:\n  - {source-id: s1, host: a, port: 3306}\n".into(),
            deadline_ms: Some(60_000),
        }
    }

    #[tokio::test]
    async fn test_dropped_request_cancels_run() {
        let (state, started) = stalled_state();
        let handler = tokio::spawn(check_task(State(Arc::clone(&state)), Json(request())));

        let run_token = timeout(Duration::from_secs(1), started).await.unwrap().unwrap();
        assert!(!run_token.is_cancelled());

        // A disconnecting client drops the handler future.
        handler.abort();
        timeout(Duration::from_secs(1), run_token.cancelled())
            .await
            .expect("run token not cancelled after request was dropped");
        assert!(!state.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_precheck() {
        let (state, started) = stalled_state();
        let handler = tokio::spawn(check_task(State(Arc::clone(&state)), Json(request())));

        let run_token = timeout(Duration::from_secs(1), started).await.unwrap().unwrap();
        state.shutdown.cancel();

        let response = timeout(Duration::from_secs(2), handler)
            .await
            .unwrap()
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(run_token.is_cancelled());
        assert_eq!(state.stats.read().await.runs_cancelled, 1);
        assert!(state.recent().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_deadline_rejected() {
        let state = AppState::new(&Config::default());
        let req = CheckTaskRequest {
            deadline_ms: Some(0),
            ..request()
        };
        let response = check_task(State(state), Json(req)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
