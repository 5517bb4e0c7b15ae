//! `flexible-freeze` binary.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

use flexible_freeze::cli::CliArgs;
use flexible_freeze::config::RunConfig;
use flexible_freeze::core::{AppResult, Interrupt};
use flexible_freeze::infra::PgClient;
use flexible_freeze::runtime::{run_maintenance, spawn_interrupt_bridge};
use flexible_freeze::util::report::{timestamp, ReportOptions, Reporter};
use flexible_freeze::util::init_tracing;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_tracing(args.debug);

    let cfg = match args.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("flexible-freeze: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match run(&cfg) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "run aborted");
            eprintln!("flexible-freeze: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &RunConfig) -> AppResult<ExitCode> {
    let run_id = Uuid::new_v4();
    let reporter = open_reporter(cfg, run_id)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(async {
        let interrupt = Interrupt::new();
        let bridge = spawn_interrupt_bridge(interrupt.clone());
        let client = Arc::new(PgClient::new(&cfg.credentials));

        let outcome = run_maintenance(run_id, cfg, client, &reporter, &interrupt).await;
        bridge.abort();

        match outcome {
            Ok(summary) => {
                info!(
                    %run_id,
                    processed = summary.processed(),
                    failed = summary.failed(),
                    "done"
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                error!(%run_id, error = %e, "run failed");
                reporter.emit(e.to_string());
                Ok(ExitCode::from(e.exit_code()))
            }
        }
    })
}

/// Stdout reporter, or an append-mode log file opened with a banner.
fn open_reporter(cfg: &RunConfig, run_id: Uuid) -> AppResult<Reporter> {
    let options = ReportOptions {
        verbose: cfg.verbose,
        timestamps: cfg.print_timestamps,
    };
    let Some(path) = cfg.log_file.as_deref() else {
        return Ok(Reporter::stdout(options));
    };
    let reporter = Reporter::append_to(path, options)
        .with_context(|| format!("could not open logfile: {}", path.display()))?;
    reporter.emit("");
    reporter.emit("=".repeat(40));
    reporter.emit(format!("flexible freeze started {} (run {run_id})", timestamp()));
    if let Ok(json) = serde_json::to_string(cfg) {
        reporter.verbose(format!("arguments: {json}"));
    }
    Ok(reporter)
}
