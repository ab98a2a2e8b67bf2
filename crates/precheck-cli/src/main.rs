//! Precheck CLI - validate migration task files before they start.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use precheck_client::{ClientError, HttpClient};
use precheck_core::{CoreError, Report};
use precheck_master::Engine;

/// Precheck CLI - task precheck tool
#[derive(Parser, Debug)]
#[command(name = "precheck")]
#[command(about = "Check migration tasks before they run", long_about = None)]
struct Cli {
    /// Master address
    #[arg(long, global = true, default_value = "http://127.0.0.1:8261")]
    master_addr: String,

    /// Run the checks in this process instead of on the master
    #[arg(long, global = true)]
    local: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a task configuration file
    #[command(name = "check-task")]
    CheckTask {
        /// Path to the task file
        config_file: PathBuf,

        /// Overall deadline in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        deadline_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent prechecks on the master
    #[command(name = "list-prechecks")]
    ListPrechecks {
        /// Print the summaries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("get file content error: {}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("cannot encode output")]
    Json(#[from] serde_json::Error),

    #[error("{0} needs a master; --local keeps no history")]
    NeedsMaster(&'static str),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling precheck");
            interrupt.cancel();
        }
    });

    match run(cli, &cancel).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", output::render_error_stack(&e));
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::CheckTask {
            config_file,
            deadline_ms,
            json,
        } => {
            let raw = tokio::fs::read_to_string(&config_file)
                .await
                .map_err(|source| CliError::ReadFile {
                    path: config_file.clone(),
                    source,
                })?;
            let deadline = deadline_ms.map(Duration::from_millis);

            let report = if cli.local {
                debug!(file = %config_file.display(), "Running precheck in-process");
                Engine::default().check_task(cancel, &raw, deadline).await?
            } else {
                debug!(file = %config_file.display(), master = %cli.master_addr, "Submitting precheck");
                HttpClient::new(&cli.master_addr)
                    .check_task(cancel, &raw, deadline)
                    .await?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_report(&report));
            }
            Ok(exit_code(&report))
        }
        Commands::ListPrechecks { json } => {
            if cli.local {
                return Err(CliError::NeedsMaster("list-prechecks"));
            }
            let summaries = HttpClient::new(&cli.master_addr).recent_prechecks().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print!("{}", output::render_summaries(&summaries));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(report: &Report) -> ExitCode {
    if report.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind as ClapErrorKind;

    #[test]
    fn test_parse_check_task() {
        let cli = Cli::try_parse_from(["precheck", "check-task", "task.yaml"]).unwrap();
        assert_eq!(cli.master_addr, "http://127.0.0.1:8261");
        assert!(!cli.local);
        match cli.command {
            Commands::CheckTask {
                config_file,
                deadline_ms,
                json,
            } => {
                assert_eq!(config_file, PathBuf::from("task.yaml"));
                assert_eq!(deadline_ms, None);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "precheck",
            "check-task",
            "task.yaml",
            "--local",
            "--deadline-ms",
            "1500",
            "--master-addr",
            "http://db-master:8261",
        ])
        .unwrap();
        assert!(cli.local);
        assert_eq!(cli.master_addr, "http://db-master:8261");
        assert!(matches!(
            cli.command,
            Commands::CheckTask {
                deadline_ms: Some(1500),
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = Cli::try_parse_from(["precheck", "check-task"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["precheck", "check-task", "a.yaml", "b.yaml"]).unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::UnknownArgument);
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let err = Cli::try_parse_from(["precheck", "check-task", "t.yaml", "--deadline-ms", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::ValueValidation);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let cli = Cli::try_parse_from(["precheck", "--local", "check-task", "/no/such/task.yaml"])
            .unwrap();
        let err = run(cli, &CancellationToken::new()).await.unwrap_err();
        let rendered = output::render_error_stack(&err);
        assert!(rendered.starts_with("get file content error: /no/such/task.yaml"));
        assert!(rendered.contains("caused by: "));
    }

    #[tokio::test]
    async fn test_list_prechecks_needs_master() {
        let cli = Cli::try_parse_from(["precheck", "--local", "list-prechecks"]).unwrap();
        let err = run(cli, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, CliError::NeedsMaster(_)));
    }
}
