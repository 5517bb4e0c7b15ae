//! Error types for selection, scheduling, and execution.

use thiserror::Error;

/// Errors produced by maintenance components.
///
/// Only [`MaintenanceError::Config`] and [`MaintenanceError::Startup`] are
/// fatal for a run. Connection, query, and operation failures are recovered
/// at resource or item granularity by the selector and the worker loop.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// Malformed command-line or configuration input.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A resource could not be reached.
    #[error("could not connect to {resource}: {reason}")]
    Connection {
        /// Resource name.
        resource: String,
        /// Backend-reported reason.
        reason: String,
    },
    /// A catalog or session query failed on a reachable resource.
    #[error("query failed on {resource}: {reason}")]
    Query {
        /// Resource name.
        resource: String,
        /// Backend-reported reason.
        reason: String,
    },
    /// The maintenance operation itself failed for one item.
    #[error("maintenance of {item} failed: {reason}")]
    Operation {
        /// Display name of the item.
        item: String,
        /// Backend-reported reason.
        reason: String,
    },
    /// The run could not start (resource discovery, log file, ...).
    #[error("startup failed: {0}")]
    Startup(String),
    /// A worker could not be spawned or supervised.
    #[error("worker failure: {0}")]
    Worker(String),
}

impl MaintenanceError {
    /// Process exit status for a run that ended with this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }

    /// Whether the run can carry on past this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Query { .. } | Self::Operation { .. }
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
