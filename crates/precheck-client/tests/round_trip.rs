//! Client against a live master router.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use precheck_client::{ClientError, HttpClient};
use precheck_core::{ErrorKind, Verdict};
use precheck_master::{http::create_router, AppState, Config};

async fn spawn_master() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(AppState::new(&Config::default()));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn task_yaml(port: u16, binlog: &str) -> String {
    format!(
        r#"
name: round-trip
target-database:
  host: 127.0.0.1
  port: {port}
  user: root
  version: v7.5.0
mysql-instances:
  - source-id: s1
    host: 127.0.0.1
    port: {port}
    user: dm
    password: secret
    version: 8.0.32
    binlog-format: {binlog}
"#
    )
}

#[tokio::test]
async fn test_check_task_round_trip() {
    let base = spawn_master().await;
    let databases = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = databases.local_addr().unwrap().port();

    let client = HttpClient::new(&base);
    assert!(client.health().await.unwrap());

    let cancel = CancellationToken::new();
    let report = client
        .check_task(&cancel, &task_yaml(port, "ROW"), Some(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(report.verdict, Verdict::Pass, "{:?}", report.failures);
    assert_eq!(report.task_name, "round-trip");

    let report = client
        .check_task(&cancel, &task_yaml(port, "MIXED"), None)
        .await
        .unwrap();
    assert_eq!(report.verdict, Verdict::Fail);
    let failed: Vec<&str> = report.failures.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(failed, vec!["s1/binlog-format"]);

    // Both runs are kept, newest first.
    let recent = client.recent_prechecks().await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].run_id, report.run_id);

    let stored = client.get_precheck(report.run_id.as_str()).await.unwrap();
    assert_eq!(stored, report);
}

#[tokio::test]
async fn test_invalid_task_rejected() {
    let base = spawn_master().await;
    let client = HttpClient::new(&base);

    let err = client
        .check_task(&CancellationToken::new(), "name: [", None)
        .await
        .unwrap_err();
    assert!(err.is_input_error(), "{err:?}");
    match err {
        ClientError::Rejected { status, kind, .. } => {
            assert_eq!(status, 400);
            assert_eq!(kind, ErrorKind::Input);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_report() {
    let base = spawn_master().await;
    let client = HttpClient::new(&base);

    let err = client.get_precheck("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_master_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::new(&format!("http://{}", addr));
    let err = client
        .check_task(&CancellationToken::new(), "name: t", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Connection { .. }), "{err:?}");
}
