//! Precheck runs and the `check_task` entry point.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use precheck_core::{CheckOutcome, CoreError, Report, RunId, RunPhase, TaskConfig};

use crate::aggregator;
use crate::checker::SharedChecker;
use crate::config::EngineConfig;
use crate::orchestrator::Orchestrator;
use crate::registry;

/// One precheck of one task.
///
/// Moves strictly through `Building -> Running -> Aggregating -> Done`;
/// `finish` consumes the run so it cannot be reused.
pub struct PrecheckRun {
    run_id: RunId,
    config: Arc<TaskConfig>,
    phase: RunPhase,
    started_at: DateTime<Utc>,
    checks: Vec<SharedChecker>,
    outcomes: Vec<CheckOutcome>,
}

impl PrecheckRun {
    /// Start a run for `config` and register its checks.
    pub fn new(config: TaskConfig) -> Self {
        let checks = registry::build(&config);
        Self::with_checks(config, checks)
    }

    /// Start a run with an explicit check list.
    pub fn with_checks(config: TaskConfig, checks: Vec<SharedChecker>) -> Self {
        Self {
            run_id: RunId::generate(),
            config: Arc::new(config),
            phase: RunPhase::Building,
            started_at: Utc::now(),
            checks,
            outcomes: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn checks(&self) -> &[SharedChecker] {
        &self.checks
    }

    fn advance(&mut self, to: RunPhase) -> Result<(), CoreError> {
        if self.phase.next() != Some(to) {
            return Err(CoreError::InvalidStateTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Execute all registered checks.
    pub async fn execute(
        &mut self,
        orchestrator: &Orchestrator,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        self.advance(RunPhase::Running)?;
        info!(
            run_id = %self.run_id,
            task = %self.config.name,
            checks = self.checks.len(),
            deadline_ms = deadline.as_millis() as u64,
            "Running precheck"
        );
        self.outcomes = orchestrator
            .run(Arc::clone(&self.config), &self.checks, deadline, cancel)
            .await;
        Ok(())
    }

    /// Reduce outcomes into the final report.
    pub fn finish(mut self) -> Result<Report, CoreError> {
        self.advance(RunPhase::Aggregating)?;
        let report = aggregator::aggregate(
            self.run_id.clone(),
            self.config.name.clone(),
            self.started_at,
            std::mem::take(&mut self.outcomes),
        );
        self.advance(RunPhase::Done)?;

        info!(
            run_id = %report.run_id,
            verdict = %report.verdict,
            total = report.total,
            failures = report.failures.len(),
            warnings = report.warnings.len(),
            "Precheck finished"
        );
        Ok(report)
    }
}

/// Builds the checks for a task.
pub type Registry = Arc<dyn Fn(&TaskConfig) -> Vec<SharedChecker> + Send + Sync>;

/// Precheck engine: configuration, the shared orchestrator, and the registry
/// that decides which checks a task gets.
pub struct Engine {
    config: EngineConfig,
    orchestrator: Orchestrator,
    registry: Registry,
}

impl Engine {
    /// Engine with the built-in checks.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, Arc::new(registry::build))
    }

    /// Engine with a custom check registry.
    pub fn with_registry(config: EngineConfig, registry: Registry) -> Self {
        let orchestrator = Orchestrator::new(&config);
        Self {
            config,
            orchestrator,
            registry,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Deadline for `task`: explicit override, then the task file, then the
    /// engine default.
    pub fn deadline_for(&self, task: &TaskConfig, requested: Option<Duration>) -> Duration {
        requested
            .or_else(|| task.precheck.deadline_ms.map(Duration::from_millis))
            .unwrap_or(self.config.default_deadline)
    }

    /// Parse, validate, and precheck a raw task file.
    pub async fn check_task(
        &self,
        cancel: &CancellationToken,
        raw_config: &str,
        deadline: Option<Duration>,
    ) -> Result<Report, CoreError> {
        let task = TaskConfig::from_yaml(raw_config)?;
        self.check_config(cancel, task, deadline).await
    }

    /// Precheck an already-parsed task.
    pub async fn check_config(
        &self,
        cancel: &CancellationToken,
        task: TaskConfig,
        deadline: Option<Duration>,
    ) -> Result<Report, CoreError> {
        task.validate()?;
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let deadline = self.deadline_for(&task, deadline);
        let checks = (self.registry)(&task);
        let mut run = PrecheckRun::with_checks(task, checks);
        run.execute(&self.orchestrator, deadline, cancel).await?;

        if cancel.is_cancelled() {
            warn!(run_id = %run.run_id(), "Precheck aborted by caller, discarding outcomes");
            return Err(CoreError::Cancelled);
        }
        run.finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Precheck `raw_config` with `engine`.
pub async fn check_task(
    cancel: &CancellationToken,
    raw_config: &str,
    engine: &Engine,
) -> Result<Report, CoreError> {
    engine.check_task(cancel, raw_config, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_core::{
        CheckCategory, Endpoint, ErrorKind, OutcomeStatus, SourceInstance, Verdict,
    };
    use tokio::net::TcpListener;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            grace_period: Duration::from_millis(50),
            probe_timeout: Duration::from_millis(500),
            ..EngineConfig::default()
        })
    }

    async fn listening_port() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    fn task_yaml(port: u16, binlog: &str) -> String {
        format!(
            r#"
name: local-task
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
    version: 5.7.22-log
    binlog-format: {binlog}
"#
        )
    }

    #[tokio::test]
    async fn test_check_task_passes() {
        let (_listener, port) = listening_port().await;
        let report = check_task(&CancellationToken::new(), &task_yaml(port, "ROW"), &engine())
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Pass, "{:?}", report.failures);
        assert_eq!(report.task_name, "local-task");
        // 3 target checks, 4 source checks, 1 schema check.
        assert_eq!(report.total, 8);
        assert_eq!(report.passed, report.total);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_check_task_reports_failures() {
        let (_listener, port) = listening_port().await;
        let report = check_task(&CancellationToken::new(), &task_yaml(port, "MIXED"), &engine())
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "s1/binlog-format");
        assert_eq!(report.failures[0].category, CheckCategory::BinlogFormat);
    }

    #[tokio::test]
    async fn test_input_error_before_any_check() {
        let err = check_task(&CancellationToken::new(), "name: [", &engine())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let (_listener, port) = listening_port().await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = check_task(&cancel, &task_yaml(port, "ROW"), &engine())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_unsupported_endpoint_fails_report() {
        let (_listener, port) = listening_port().await;
        let task = TaskConfig::new(
            "t",
            Endpoint::new("127.0.0.1", port)
                .with_credentials("root", None)
                .with_version("v7.5.0"),
        )
        .with_instance(SourceInstance::new(
            "pg",
            Endpoint::new("127.0.0.1", port).with_kind("postgres"),
        ));
        let report = engine()
            .check_config(&CancellationToken::new(), task, None)
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.failures[0].name, "pg/unsupported");
        assert_eq!(report.failures[0].status, OutcomeStatus::Error);
    }

    #[tokio::test]
    async fn test_run_phases() {
        let task = TaskConfig::new("t", Endpoint::new("db", 4000));
        let mut run = PrecheckRun::with_checks(task, Vec::new());
        assert_eq!(run.phase(), RunPhase::Building);

        let engine = engine();
        let cancel = CancellationToken::new();
        run.execute(engine.orchestrator(), Duration::from_secs(1), &cancel)
            .await
            .unwrap();
        assert_eq!(run.phase(), RunPhase::Running);

        // Running twice is rejected.
        let err = run
            .execute(engine.orchestrator(), Duration::from_secs(1), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));

        let report = run.finish().unwrap();
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn test_finish_requires_running() {
        let task = TaskConfig::new("t", Endpoint::new("db", 4000));
        let run = PrecheckRun::with_checks(task, Vec::new());
        let err = run.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition: BUILDING -> AGGREGATING"
        );
    }

    #[test]
    fn test_deadline_precedence() {
        let engine = engine();
        let mut task = TaskConfig::new("t", Endpoint::new("db", 4000));
        assert_eq!(engine.deadline_for(&task, None), engine.config().default_deadline);

        task.precheck.deadline_ms = Some(1500);
        assert_eq!(engine.deadline_for(&task, None), Duration::from_millis(1500));
        assert_eq!(
            engine.deadline_for(&task, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
    }
}
