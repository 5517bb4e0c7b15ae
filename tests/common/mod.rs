//! Shared fixtures for scenario tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use flexible_freeze::config::WorkerConfig;
use flexible_freeze::core::{Deadline, Interrupt, ItemName, ItemStats, WorkQueue, WorkUnit, Worker};
use flexible_freeze::infra::InMemoryFleet;
use flexible_freeze::util::report::{CapturedOutput, ReportOptions, Reporter};

/// Table whose frozen XID is `age` transactions old.
pub fn aged(name: &str, age: i64) -> ItemStats {
    ItemStats {
        name: ItemName::parse(name),
        xid_age: age,
        side_store_xid_age: None,
        live_rows: 1_000,
        dead_rows: 0,
        size_bytes: 8_192,
        since_last_maintenance: None,
    }
}

/// Table with the given row counts and size, never vacuumed.
pub fn decayed(name: &str, live_rows: i64, dead_rows: i64, size_bytes: i64) -> ItemStats {
    ItemStats {
        name: ItemName::parse(name),
        xid_age: 0,
        side_store_xid_age: None,
        live_rows,
        dead_rows,
        size_bytes,
        since_last_maintenance: None,
    }
}

/// Worker settings without pauses.
pub fn quick_config() -> WorkerConfig {
    WorkerConfig::new().with_pause(Duration::ZERO)
}

/// Queue from `(resource, item)` pairs.
pub fn queue(units: &[(&str, &str)]) -> WorkQueue {
    units
        .iter()
        .map(|(resource, item)| WorkUnit::new(*resource, *item))
        .collect::<Vec<_>>()
        .into()
}

/// Verbose reporter writing into memory.
pub fn capture() -> (Reporter, CapturedOutput) {
    Reporter::capture(ReportOptions {
        verbose: true,
        timestamps: false,
    })
}

/// Worker 0 over `fleet` with its own interrupt.
pub fn worker(
    fleet: &Arc<InMemoryFleet>,
    config: WorkerConfig,
    deadline: Deadline,
    reporter: Reporter,
) -> (Worker<InMemoryFleet>, Interrupt) {
    let interrupt = Interrupt::new();
    let worker = Worker::new(
        0,
        Arc::clone(fleet),
        Arc::new(config),
        deadline,
        reporter,
        interrupt.listener(),
    );
    (worker, interrupt)
}
