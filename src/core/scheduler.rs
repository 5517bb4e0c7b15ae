//! Deadline scheduler: one dedicated OS thread per work queue.
//!
//! Each worker thread builds its own single-threaded tokio runtime and runs
//! its queue to completion or to the shared deadline. Results flow back over
//! a channel as workers finish; the scheduler then joins every thread, so no
//! worker outlives [`DeadlineScheduler::run`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::unbounded;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::core::client::ResourceClient;
use crate::core::deadline::{Deadline, Interrupt};
use crate::core::error::MaintenanceError;
use crate::core::model::{HaltReason, RunResult, WorkQueue, WorkerState};
use crate::core::worker::Worker;
use crate::util::report::Reporter;

/// Launches and supervises the workers of one run.
pub struct DeadlineScheduler<C: ResourceClient> {
    client: Arc<C>,
    config: Arc<WorkerConfig>,
    reporter: Reporter,
    stack_size: usize,
}

impl<C: ResourceClient> DeadlineScheduler<C> {
    /// Create a scheduler sharing `client`, `config`, and `reporter` with
    /// every worker.
    pub fn new(client: Arc<C>, config: WorkerConfig, reporter: Reporter) -> Self {
        Self {
            client,
            config: Arc::new(config),
            reporter,
            stack_size: 2 * 1024 * 1024,
        }
    }

    /// Worker configuration shared by every worker.
    #[must_use]
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run every queue in parallel against one deadline `budget` from now.
    ///
    /// Blocks until every worker has finished. Results are ordered by worker
    /// index, one per queue.
    ///
    /// # Errors
    ///
    /// Returns [`MaintenanceError::Worker`] if a worker thread cannot be
    /// spawned; `interrupt` is then raised and the workers already running
    /// are joined first.
    pub fn run(
        &self,
        queues: Vec<WorkQueue>,
        budget: Duration,
        interrupt: &Interrupt,
    ) -> Result<Vec<RunResult>, MaintenanceError> {
        let deadline = Deadline::after(budget);
        self.run_until(queues, deadline, interrupt)
    }

    /// Run every queue in parallel against an already computed deadline.
    ///
    /// # Errors
    ///
    /// See [`DeadlineScheduler::run`].
    pub fn run_until(
        &self,
        queues: Vec<WorkQueue>,
        deadline: Deadline,
        interrupt: &Interrupt,
    ) -> Result<Vec<RunResult>, MaintenanceError> {
        let worker_count = queues.len();
        let assigned: Vec<usize> = queues.iter().map(WorkQueue::len).collect();
        info!(worker_count, deadline = %deadline, "starting workers");

        let (result_tx, result_rx) = unbounded::<RunResult>();
        let mut handles: Vec<(usize, JoinHandle<()>)> = Vec::with_capacity(worker_count);

        for (worker_id, queue) in queues.into_iter().enumerate() {
            debug!(worker_id, units = ?queue.units(), "worker will process units");
            let worker = Worker::new(
                worker_id,
                Arc::clone(&self.client),
                Arc::clone(&self.config),
                deadline,
                self.reporter.clone(),
                interrupt.listener(),
            );
            let tx = result_tx.clone();
            let assigned_here = queue.len();

            let spawned = thread::Builder::new()
                .name(format!("ff-worker-{worker_id}"))
                .stack_size(self.stack_size)
                .spawn(move || {
                    let rt = match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!(worker_id, error = %e, "failed to create worker runtime");
                            let state = WorkerState::Halted(HaltReason::WorkerFailed(format!(
                                "runtime unavailable: {e}"
                            )));
                            let _ = tx.send(RunResult::untouched(worker_id, assigned_here, state));
                            return;
                        }
                    };
                    let result = rt.block_on(worker.run(queue));
                    let _ = tx.send(result);
                });

            match spawned {
                Ok(handle) => handles.push((worker_id, handle)),
                Err(e) => {
                    error!(worker_id, error = %e, "failed to spawn worker thread");
                    drop(result_tx);
                    abandon(handles, interrupt);
                    return Err(MaintenanceError::Worker(format!(
                        "could not spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }
        drop(result_tx);

        let mut slots: Vec<Option<RunResult>> = vec![None; worker_count];
        for result in &result_rx {
            debug!(
                worker_id = result.worker_id,
                processed = result.processed(),
                assigned = result.assigned,
                "worker reported"
            );
            let slot = result.worker_id;
            slots[slot] = Some(result);
        }

        for (worker_id, handle) in handles {
            if handle.join().is_err() {
                warn!(worker_id, "worker panicked");
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(worker_id, slot)| {
                slot.unwrap_or_else(|| {
                    RunResult::untouched(
                        worker_id,
                        assigned[worker_id],
                        WorkerState::Halted(HaltReason::WorkerFailed("worker panicked".into())),
                    )
                })
            })
            .collect();
        info!(worker_count, "all workers finished");
        Ok(results)
    }
}

/// Stop and join workers that did start before a spawn failure.
fn abandon(handles: Vec<(usize, JoinHandle<()>)>, interrupt: &Interrupt) {
    interrupt.raise();
    for (worker_id, handle) in handles {
        if handle.join().is_err() {
            warn!(worker_id, "worker panicked");
        }
    }
}
