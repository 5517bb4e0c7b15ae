//! Core selection, partitioning, and deadline-bound execution.

pub mod client;
pub mod deadline;
pub mod error;
pub mod exclusion;
pub mod model;
pub mod partition;
pub mod policy;
pub mod scheduler;
pub mod selector;
pub mod worker;

pub use client::{ResourceClient, SessionSetting};
pub use deadline::{Deadline, Interrupt, InterruptListener};
pub use error::{AppResult, MaintenanceError};
pub use exclusion::{build_exclusions, parse_scoped_excludes, ExclusionSet};
pub use model::{
    CandidateMap, HaltReason, ItemName, ResourceCandidates, RunResult, UnitOutcome, UnitReport,
    WorkQueue, WorkUnit, WorkerState,
};
pub use partition::{flatten, partition};
pub use policy::{
    Candidate, DecayThresholds, FreezeThresholds, ItemStats, MaintenanceOp, Policy, Urgency,
};
pub use scheduler::DeadlineScheduler;
pub use selector::{select_candidates, select_for_resource};
pub use worker::{Worker, MAX_STATEMENT_TIMEOUT};
