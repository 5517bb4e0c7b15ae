//! Run orchestration: plan, select, partition, execute.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::builders::build_plan;
use crate::config::RunConfig;
use crate::core::{
    partition, select_candidates, DeadlineScheduler, Interrupt, MaintenanceError, ResourceClient,
    RunResult,
};
use crate::util::report::Reporter;

/// Outcome of one maintenance run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: Uuid,
    /// Resources visited during selection.
    pub resources: usize,
    /// Candidates selected across all resources.
    pub candidates: usize,
    /// Per-worker results, by worker index.
    pub results: Vec<RunResult>,
    /// Whether the run was interrupted.
    pub interrupted: bool,
}

impl RunSummary {
    /// Units processed across every worker.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.results.iter().map(RunResult::processed).sum()
    }

    /// Units that failed across every worker.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().map(RunResult::failed).sum()
    }

    /// Units never reached across every worker.
    #[must_use]
    pub fn unreached(&self) -> usize {
        self.results.iter().map(RunResult::unreached).sum()
    }
}

/// Run one maintenance pass with `client`.
///
/// Per-resource and per-item failures are reported and absorbed; an
/// interrupt ends the run early with `interrupted` set.
///
/// # Errors
///
/// [`MaintenanceError::Config`] or [`MaintenanceError::Startup`] if the run
/// cannot be planned, [`MaintenanceError::Worker`] if workers cannot be
/// launched.
pub async fn run_maintenance<C: ResourceClient>(
    run_id: Uuid,
    cfg: &RunConfig,
    client: Arc<C>,
    reporter: &Reporter,
    interrupt: &Interrupt,
) -> Result<RunSummary, MaintenanceError> {
    let span = info_span!("run", %run_id);
    execute_run(run_id, cfg, client, reporter, interrupt)
        .instrument(span)
        .await
}

async fn execute_run<C: ResourceClient>(
    run_id: Uuid,
    cfg: &RunConfig,
    client: Arc<C>,
    reporter: &Reporter,
    interrupt: &Interrupt,
) -> Result<RunSummary, MaintenanceError> {
    match serde_json::to_string(cfg) {
        Ok(json) => debug!(config = %json, "effective configuration"),
        Err(e) => warn!(error = %e, "could not serialise configuration"),
    }

    let plan = build_plan(cfg, client.as_ref()).await?;
    reporter.verbose(format!(
        "Processing {} database{} (list of databases is {})",
        plan.resources.len(),
        if plan.resources.len() == 1 { "" } else { "s" },
        plan.resources.join(", ")
    ));

    let listener = interrupt.listener();
    let candidates = select_candidates(
        client.as_ref(),
        &plan.resources,
        &plan.exclusions,
        &plan.policy,
        reporter,
        &listener,
    )
    .await;

    let mut summary = RunSummary {
        run_id,
        resources: plan.resources.len(),
        candidates: candidates.total(),
        results: Vec::new(),
        interrupted: false,
    };

    if !interrupt.is_raised() {
        let queues = partition(&candidates, cfg.worker_count());
        info!(candidates = summary.candidates, workers = queues.len(), "work partitioned");

        let scheduler = DeadlineScheduler::new(client, cfg.worker_config(), reporter.clone());
        let budget = cfg.budget();
        let worker_interrupt = interrupt.clone();
        summary.results = tokio::task::spawn_blocking(move || {
            scheduler.run(queues, budget, &worker_interrupt)
        })
        .await
        .map_err(|e| MaintenanceError::Worker(format!("scheduler task failed: {e}")))??;
    }

    if interrupt.is_raised() {
        summary.interrupted = true;
        reporter.emit("exiting due to user interrupt");
    }

    info!(
        processed = summary.processed(),
        failed = summary.failed(),
        unreached = summary.unreached(),
        interrupted = summary.interrupted,
        "run finished"
    );
    match serde_json::to_string(&summary) {
        Ok(json) => debug!(summary = %json, "run summary"),
        Err(e) => warn!(error = %e, "could not serialise run summary"),
    }
    Ok(summary)
}
