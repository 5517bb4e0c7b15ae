//! In-memory fleet for development and testing.
//!
//! Holds item statistics per resource, evaluates policies in process, and
//! journals every client call so tests can assert on what a run did.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::client::{ResourceClient, SessionSetting};
use crate::core::error::MaintenanceError;
use crate::core::model::ItemName;
use crate::core::policy::{Candidate, ItemStats, MaintenanceOp, Policy};

/// Journal entry recorded by [`InMemoryFleet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetEvent {
    /// Connection opened.
    Connected {
        /// Resource name.
        resource: String,
        /// Connection id.
        conn: u64,
    },
    /// Session setting applied.
    Setting {
        /// Connection id.
        conn: u64,
        /// Setting applied.
        setting: SessionSetting,
    },
    /// Operation started.
    Started {
        /// Resource name.
        resource: String,
        /// Item name.
        item: ItemName,
        /// Operation.
        op: MaintenanceOp,
    },
    /// Operation completed successfully.
    Maintained {
        /// Resource name.
        resource: String,
        /// Item name.
        item: ItemName,
    },
    /// Operation failed.
    Failed {
        /// Resource name.
        resource: String,
        /// Item name.
        item: ItemName,
    },
    /// Connection closed.
    Closed {
        /// Connection id.
        conn: u64,
    },
    /// Connection aborted mid-operation.
    Aborted {
        /// Connection id.
        conn: u64,
    },
}

/// Open connection to an in-memory resource.
#[derive(Debug)]
pub struct MemoryConnection {
    resource: String,
    id: u64,
}

impl MemoryConnection {
    /// Resource the connection belongs to.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// In-memory fleet of resources and their items.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    resources: Mutex<Vec<(String, Vec<ItemStats>)>>,
    unreachable: HashSet<String>,
    failing: HashSet<(String, ItemName)>,
    broken_queries: HashSet<String>,
    operation_delay: Duration,
    journal: Mutex<Vec<FleetEvent>>,
    next_conn: AtomicU64,
}

impl InMemoryFleet {
    /// Create an empty fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource with its items. Order of insertion is discovery order.
    #[must_use]
    pub fn with_resource(self, name: impl Into<String>, items: Vec<ItemStats>) -> Self {
        self.resources.lock().push((name.into(), items));
        self
    }

    /// Make a resource refuse connections.
    #[must_use]
    pub fn with_unreachable(mut self, name: impl Into<String>) -> Self {
        self.unreachable.insert(name.into());
        self
    }

    /// Make maintenance of one item fail.
    #[must_use]
    pub fn with_failing_item(mut self, resource: impl Into<String>, item: impl Into<ItemName>) -> Self {
        self.failing.insert((resource.into(), item.into()));
        self
    }

    /// Make the candidate query of a resource fail.
    #[must_use]
    pub fn with_broken_query(mut self, resource: impl Into<String>) -> Self {
        self.broken_queries.insert(resource.into());
        self
    }

    /// Simulated duration of every maintenance operation.
    #[must_use]
    pub const fn with_operation_delay(mut self, delay: Duration) -> Self {
        self.operation_delay = delay;
        self
    }

    /// Snapshot of the journal.
    #[must_use]
    pub fn journal(&self) -> Vec<FleetEvent> {
        self.journal.lock().clone()
    }

    /// Items successfully maintained, in completion order.
    #[must_use]
    pub fn maintained(&self) -> Vec<(String, ItemName)> {
        self.journal
            .lock()
            .iter()
            .filter_map(|event| match event {
                FleetEvent::Maintained { resource, item } => Some((resource.clone(), item.clone())),
                _ => None,
            })
            .collect()
    }

    /// Current statistics of one item.
    #[must_use]
    pub fn stats(&self, resource: &str, item: &ItemName) -> Option<ItemStats> {
        self.resources
            .lock()
            .iter()
            .find(|(name, _)| name == resource)
            .and_then(|(_, items)| items.iter().find(|s| &s.name == item).cloned())
    }

    fn record(&self, event: FleetEvent) {
        self.journal.lock().push(event);
    }

    fn reset_metrics(&self, resource: &str, item: &ItemName, op: MaintenanceOp) {
        let mut resources = self.resources.lock();
        let Some((_, items)) = resources.iter_mut().find(|(name, _)| name == resource) else {
            return;
        };
        if let Some(stats) = items.iter_mut().find(|s| &s.name == item) {
            if op == MaintenanceOp::FreezeAnalyze {
                stats.xid_age = 0;
                stats.side_store_xid_age = stats.side_store_xid_age.map(|_| 0);
            }
            stats.dead_rows = 0;
            stats.since_last_maintenance = Some(Duration::ZERO);
        }
    }
}

#[async_trait]
impl ResourceClient for InMemoryFleet {
    type Connection = MemoryConnection;

    async fn list_resources(&self) -> Result<Vec<String>, MaintenanceError> {
        Ok(self
            .resources
            .lock()
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn connect(&self, resource: &str) -> Result<MemoryConnection, MaintenanceError> {
        let known = self.resources.lock().iter().any(|(name, _)| name == resource);
        if !known || self.unreachable.contains(resource) {
            return Err(MaintenanceError::Connection {
                resource: resource.to_string(),
                reason: "connection refused".into(),
            });
        }
        let id = self.next_conn.fetch_add(1, Ordering::Relaxed);
        self.record(FleetEvent::Connected {
            resource: resource.to_string(),
            conn: id,
        });
        Ok(MemoryConnection {
            resource: resource.to_string(),
            id,
        })
    }

    async fn candidates(
        &self,
        conn: &mut MemoryConnection,
        policy: &Policy,
        excluded: &[String],
    ) -> Result<Vec<Candidate>, MaintenanceError> {
        if self.broken_queries.contains(&conn.resource) {
            return Err(MaintenanceError::Query {
                resource: conn.resource.clone(),
                reason: "relation \"pg_stat_user_tables\" does not exist".into(),
            });
        }
        let resources = self.resources.lock();
        let items = resources
            .iter()
            .find(|(name, _)| *name == conn.resource)
            .map(|(_, items)| items.as_slice())
            .unwrap_or_default();
        let mut candidates: Vec<Candidate> = items
            .iter()
            .filter(|stats| {
                let display = stats.name.to_string();
                let qualified = stats.name.qualified();
                !excluded.iter().any(|e| *e == display || *e == qualified)
            })
            .filter_map(|stats| {
                policy.evaluate(stats).map(|urgency| Candidate {
                    name: stats.name.clone(),
                    urgency,
                })
            })
            .collect();
        drop(resources);
        policy.rank(&mut candidates);
        Ok(candidates)
    }

    async fn apply_setting(
        &self,
        conn: &mut MemoryConnection,
        setting: SessionSetting,
    ) -> Result<(), MaintenanceError> {
        self.record(FleetEvent::Setting {
            conn: conn.id,
            setting,
        });
        Ok(())
    }

    async fn maintain(
        &self,
        conn: &mut MemoryConnection,
        item: &ItemName,
        op: MaintenanceOp,
    ) -> Result<(), MaintenanceError> {
        self.record(FleetEvent::Started {
            resource: conn.resource.clone(),
            item: item.clone(),
            op,
        });
        if !self.operation_delay.is_zero() {
            tokio::time::sleep(self.operation_delay).await;
        }
        if self.failing.contains(&(conn.resource.clone(), item.clone())) {
            self.record(FleetEvent::Failed {
                resource: conn.resource.clone(),
                item: item.clone(),
            });
            return Err(MaintenanceError::Operation {
                item: item.to_string(),
                reason: "could not obtain lock".into(),
            });
        }
        self.reset_metrics(&conn.resource, item, op);
        self.record(FleetEvent::Maintained {
            resource: conn.resource.clone(),
            item: item.clone(),
        });
        Ok(())
    }

    async fn close(&self, conn: MemoryConnection) {
        self.record(FleetEvent::Closed { conn: conn.id });
    }

    async fn abort(&self, conn: MemoryConnection) {
        self.record(FleetEvent::Aborted { conn: conn.id });
    }
}
