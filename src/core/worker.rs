//! Sequential worker loop over one work queue.
//!
//! A worker walks its queue in order, checking the shared deadline before
//! every unit. It keeps one connection per resource for consecutive units of
//! that resource, applies throttling to every new connection, and isolates
//! per-item failures. A connection failure abandons the rest of the queue.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::WorkerConfig;
use crate::core::client::{ResourceClient, SessionSetting};
use crate::core::deadline::{Deadline, InterruptListener};
use crate::core::error::MaintenanceError;
use crate::core::model::{
    HaltReason, RunResult, UnitOutcome, UnitReport, WorkQueue, WorkUnit, WorkerState,
};
use crate::util::report::Reporter;

/// Smallest statement timeout issued; zero would disable the timeout.
const MIN_STATEMENT_TIMEOUT: Duration = Duration::from_millis(1);

/// Largest statement timeout the server accepts (`i32::MAX` milliseconds).
pub const MAX_STATEMENT_TIMEOUT: Duration = Duration::from_millis(2_147_483_647);

/// One worker bound to a deadline and an interrupt.
pub struct Worker<C: ResourceClient> {
    env: WorkerEnv<C>,
    interrupt: InterruptListener,
}

/// Read-only state a worker consults while executing.
struct WorkerEnv<C: ResourceClient> {
    id: usize,
    client: Arc<C>,
    config: Arc<WorkerConfig>,
    deadline: Deadline,
    reporter: Reporter,
}

/// Connection held for the resource of the current unit.
struct Session<T> {
    resource: String,
    conn: T,
}

impl<C: ResourceClient> Worker<C> {
    /// Create a worker.
    pub fn new(
        id: usize,
        client: Arc<C>,
        config: Arc<WorkerConfig>,
        deadline: Deadline,
        reporter: Reporter,
        interrupt: InterruptListener,
    ) -> Self {
        Self {
            env: WorkerEnv {
                id,
                client,
                config,
                deadline,
                reporter,
            },
            interrupt,
        }
    }

    /// Process `queue` until it is exhausted, the deadline passes, a
    /// connection fails, or the run is interrupted.
    pub async fn run(mut self, queue: WorkQueue) -> RunResult {
        let id = self.env.id;
        let assigned = queue.len();
        let mut reports: Vec<UnitReport> = Vec::with_capacity(assigned);
        let mut session: Option<Session<C::Connection>> = None;
        let mut state = WorkerState::Idle;
        let mut units = queue.into_iter();

        debug!(worker_id = id, assigned, deadline = %self.env.deadline, "worker started");

        while let Some(unit) = units.next() {
            if self.interrupt.is_raised() {
                state = self.env.transition(&state, WorkerState::Halted(HaltReason::Interrupted));
                break;
            }
            if self.env.deadline.has_passed() {
                self.env
                    .reporter
                    .verbose(format!("Worker {id} reached time limit; terminating."));
                state = self.env.transition(&state, WorkerState::Halted(HaltReason::Deadline));
                break;
            }

            let reuse = session
                .as_ref()
                .is_some_and(|active| active.resource == unit.resource);
            if !reuse {
                if let Some(previous) = session.take() {
                    self.env.client.close(previous.conn).await;
                }
                state = self.env.transition(&state, WorkerState::Connecting);
                let opened = tokio::select! {
                    biased;
                    () = self.interrupt.raised() => None,
                    opened = self.env.open(&unit.resource) => Some(opened),
                };
                match opened {
                    None => {
                        state = self
                            .env
                            .transition(&state, WorkerState::Halted(HaltReason::Interrupted));
                        break;
                    }
                    Some(Ok(conn)) => {
                        session = Some(Session {
                            resource: unit.resource.clone(),
                            conn,
                        });
                    }
                    Some(Err(e)) => {
                        let abandoned = units.len() + 1;
                        warn!(worker_id = id, resource = %unit.resource, error = %e, abandoned, "worker cannot connect");
                        self.env.reporter.emit(format!(
                            "Worker {id} could not connect to database {}: '{e}'. Abandoning {abandoned} remaining table{}.",
                            unit.resource,
                            plural(abandoned),
                        ));
                        let reason = HaltReason::ConnectionFailed {
                            resource: unit.resource.clone(),
                            reason: e.to_string(),
                        };
                        state = self.env.transition(&state, WorkerState::Halted(reason));
                        break;
                    }
                }
            }
            let Some(active) = session.as_mut() else {
                break;
            };

            state = self.env.transition(&state, WorkerState::Executing);
            let executed = tokio::select! {
                biased;
                () = self.interrupt.raised() => None,
                outcome = self.env.execute(&mut active.conn, &unit) => Some(outcome),
            };
            let Some(outcome) = executed else {
                if let Some(active) = session.take() {
                    warn!(worker_id = id, unit = %unit, "interrupted during maintenance; cancelling");
                    self.env.client.abort(active.conn).await;
                }
                state = self.env.transition(&state, WorkerState::Halted(HaltReason::Interrupted));
                break;
            };
            reports.push(UnitReport { unit, outcome });

            let pause = self.env.config.pause;
            if !pause.is_zero() {
                state = self.env.transition(&state, WorkerState::Paused);
                let interrupted = tokio::select! {
                    biased;
                    () = self.interrupt.raised() => true,
                    () = tokio::time::sleep(pause) => false,
                };
                if interrupted {
                    state = self
                        .env
                        .transition(&state, WorkerState::Halted(HaltReason::Interrupted));
                    break;
                }
            }
        }

        if let Some(active) = session.take() {
            self.env.client.close(active.conn).await;
        }
        if !state.is_terminal() {
            state = self.env.transition(&state, WorkerState::Completed);
        }

        let result = RunResult {
            worker_id: id,
            assigned,
            reports,
            state,
        };
        self.env.summarize(&result);
        result
    }
}

impl<C: ResourceClient> WorkerEnv<C> {
    fn transition(&self, from: &WorkerState, to: WorkerState) -> WorkerState {
        debug!(worker_id = self.id, from = ?from, to = ?to, "worker state");
        to
    }

    /// Connect to `resource` and apply throttling.
    async fn open(&self, resource: &str) -> Result<C::Connection, MaintenanceError> {
        let mut conn = self.client.connect(resource).await?;
        let throttle = self.config.throttle;
        let settings = [
            SessionSetting::CostDelay(Duration::from_millis(u64::from(throttle.cost_delay_ms))),
            SessionSetting::CostLimit(throttle.cost_limit),
        ];
        for setting in settings {
            if let Err(e) = self.client.apply_setting(&mut conn, setting).await {
                self.client.close(conn).await;
                return Err(e);
            }
        }
        Ok(conn)
    }

    /// Run the operation for one unit. Failures are recorded, not raised.
    async fn execute(&self, conn: &mut C::Connection, unit: &WorkUnit) -> UnitOutcome {
        let id = self.id;
        let op = self.config.operation;

        if self.config.dry_run {
            self.reporter.emit(format!(
                "Worker {id} would {} table {} in database {} (dry run)",
                op.verb(),
                unit.item,
                unit.resource
            ));
            return UnitOutcome::Skipped;
        }

        self.reporter.verbose(format!(
            "Worker {id} processing table {} in database {}",
            unit.item, unit.resource
        ));

        let mut result = Ok(());
        if self.config.enforce_time {
            let timeout = self
                .deadline
                .remaining()
                .saturating_add(self.config.timeout_slack)
                .clamp(MIN_STATEMENT_TIMEOUT, MAX_STATEMENT_TIMEOUT);
            result = self
                .client
                .apply_setting(conn, SessionSetting::StatementTimeout(timeout))
                .await;
        }
        if result.is_ok() {
            result = self.client.maintain(conn, &unit.item, op).await;
        }

        match result {
            Ok(()) => {
                info!(worker_id = id, unit = %unit, "maintained");
                UnitOutcome::Maintained
            }
            Err(e) => {
                warn!(worker_id = id, unit = %unit, error = %e, "maintenance failed");
                self.reporter.emit(format!(
                    "Worker {id} failed to {} table {} in database {}: {e}",
                    op.verb(),
                    unit.item,
                    unit.resource
                ));
                if self.config.enforce_time && self.deadline.has_passed() {
                    self.reporter.verbose(format!(
                        "Worker {id} halted flexible_freeze due to enforced time limit"
                    ));
                }
                UnitOutcome::Failed(e.to_string())
            }
        }
    }

    fn summarize(&self, result: &RunResult) {
        let processed: Vec<String> = result.processed_units().map(ToString::to_string).collect();
        self.reporter.verbose(format!(
            "Worker {} terminating after processing {} table{} of {}: [{}]",
            self.id,
            processed.len(),
            plural(processed.len()),
            result.assigned,
            processed.join(", "),
        ));
        debug!(
            worker_id = self.id,
            processed = processed.len(),
            failed = result.failed(),
            unreached = result.unreached(),
            state = ?result.state,
            "worker finished"
        );
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
