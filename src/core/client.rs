//! Resource client abstraction: the only way the core talks to resources.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::MaintenanceError;
use crate::core::model::ItemName;
use crate::core::policy::{Candidate, MaintenanceOp, Policy};

/// Connection-scoped setting applied before maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSetting {
    /// Sleep per cost-limit's worth of work (`vacuum_cost_delay`).
    CostDelay(Duration),
    /// Work accumulated before sleeping (`vacuum_cost_limit`).
    CostLimit(u32),
    /// Abort any statement running longer than this (`statement_timeout`).
    StatementTimeout(Duration),
}

impl SessionSetting {
    /// Server parameter name.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::CostDelay(_) => "vacuum_cost_delay",
            Self::CostLimit(_) => "vacuum_cost_limit",
            Self::StatementTimeout(_) => "statement_timeout",
        }
    }

    /// Server parameter value.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::CostDelay(delay) => delay.as_millis().to_string(),
            Self::CostLimit(limit) => limit.to_string(),
            Self::StatementTimeout(timeout) => format!("{}ms", timeout.as_millis()),
        }
    }
}

/// Access to a fleet of resources.
///
/// Implementations must be shareable across worker threads; each worker owns
/// its connections exclusively.
#[async_trait]
pub trait ResourceClient: Send + Sync + 'static {
    /// An open connection to one resource.
    type Connection: Send + 'static;

    /// Resources to consider when no explicit list is configured, most
    /// stale first.
    async fn list_resources(&self) -> Result<Vec<String>, MaintenanceError>;

    /// Open a connection to `resource`.
    async fn connect(&self, resource: &str) -> Result<Self::Connection, MaintenanceError>;

    /// Eligible items under `policy`, minus `excluded`, most urgent first.
    async fn candidates(
        &self,
        conn: &mut Self::Connection,
        policy: &Policy,
        excluded: &[String],
    ) -> Result<Vec<Candidate>, MaintenanceError>;

    /// Apply a connection-scoped setting.
    async fn apply_setting(
        &self,
        conn: &mut Self::Connection,
        setting: SessionSetting,
    ) -> Result<(), MaintenanceError>;

    /// Run the maintenance operation on `item`.
    async fn maintain(
        &self,
        conn: &mut Self::Connection,
        item: &ItemName,
        op: MaintenanceOp,
    ) -> Result<(), MaintenanceError>;

    /// Close a connection gracefully.
    async fn close(&self, conn: Self::Connection);

    /// Cancel whatever `conn` is running and discard it.
    async fn abort(&self, conn: Self::Connection) {
        self.close(conn).await;
    }
}
