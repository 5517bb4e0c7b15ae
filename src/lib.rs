//! # Flexible Freeze
//!
//! A time-budgeted, parallel maintenance scheduler for PostgreSQL fleets.
//!
//! Given a set of databases, it selects the tables that most need a costly
//! maintenance operation, splits the work across a fixed number of workers,
//! and runs the operation table by table until the list is exhausted or a
//! wall-clock deadline passes.
//!
//! ## Core Problem Solved
//!
//! Anti-wraparound freezing and dead-row cleanup are expensive and best done
//! in a quiet window. The window is fixed; the amount of work is not:
//!
//! - **Time Budget**: Workers stop starting new tables once the deadline
//!   passes, and can optionally cancel a running operation near it
//! - **Urgency First**: Tables are ranked per database (oldest frozen XID, or
//!   highest stale-row ratio) so a truncated run still did the most useful work
//! - **Failure Isolation**: One table failing never stops its worker; one
//!   unreachable database never stops selection
//! - **Throttling**: Every worker session carries cost-based delay settings
//!   and pauses between tables
//!
//! ## Pipeline
//!
//! Exclusions → candidate selection → round-robin partitioning → one worker
//! thread per partition → shared status reporter.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use flexible_freeze::config::RunConfig;
//! use flexible_freeze::core::Interrupt;
//! use flexible_freeze::infra::PgClient;
//! use flexible_freeze::runtime::run_maintenance;
//! use flexible_freeze::util::report::{ReportOptions, Reporter};
//!
//! let cfg = RunConfig { jobs: 4, run_minutes: 60, ..RunConfig::default() };
//! let client = Arc::new(PgClient::new(&cfg.credentials));
//! let reporter = Reporter::stdout(ReportOptions::default());
//! let summary = run_maintenance(uuid::Uuid::new_v4(), &cfg, client, &reporter, &Interrupt::new()).await?;
//! println!("{} tables processed", summary.processed());
//! ```
//!
//! Any backend implementing [`core::ResourceClient`] can stand in for
//! PostgreSQL; [`infra::InMemoryFleet`] is the one used by the tests.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core selection, partitioning, and deadline-bound execution.
pub mod core;
/// Run configuration.
pub mod config;
/// Builders that turn configuration into a run plan.
pub mod builders;
/// Resource client backends.
pub mod infra;
/// Run orchestration and signal handling.
pub mod runtime;
/// Status output and telemetry.
pub mod util;
/// Command-line arguments.
pub mod cli;
