//! Data model shared by the selector, partitioner, and workers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema whose tables are displayed without qualification.
pub const DEFAULT_SCHEMA: &str = "public";

/// Name of a maintainable item (a table) inside a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemName {
    /// Schema (namespace) owning the table.
    pub schema: String,
    /// Table name within the schema.
    pub relation: String,
}

impl ItemName {
    /// Create a schema-qualified item name.
    pub fn new(schema: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            relation: relation.into(),
        }
    }

    /// Parse `schema.relation` or a bare `relation` (default schema).
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.split_once('.') {
            Some((schema, relation)) => Self::new(schema, relation),
            None => Self::new(DEFAULT_SCHEMA, input),
        }
    }

    /// Always-qualified `schema.relation` form.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.relation)
    }

    /// Identifier form safe to splice into a statement.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.relation))
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema == DEFAULT_SCHEMA {
            f.write_str(&self.relation)
        } else {
            write!(f, "{}.{}", self.schema, self.relation)
        }
    }
}

impl From<&str> for ItemName {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Double-quote an SQL identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Atomic unit of scheduling: one item in one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Resource (database) name.
    pub resource: String,
    /// Item (table) name.
    pub item: ItemName,
}

impl WorkUnit {
    /// Create a work unit.
    pub fn new(resource: impl Into<String>, item: impl Into<ItemName>) -> Self {
        Self {
            resource: resource.into(),
            item: item.into(),
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.item)
    }
}

/// Ordered work units owned by exactly one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkQueue {
    units: Vec<WorkUnit>,
}

impl WorkQueue {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Append a unit to the back of the queue.
    pub fn push(&mut self, unit: WorkUnit) {
        self.units.push(unit);
    }

    /// Units in execution order.
    #[must_use]
    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    /// Number of assigned units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl From<Vec<WorkUnit>> for WorkQueue {
    fn from(units: Vec<WorkUnit>) -> Self {
        Self { units }
    }
}

impl IntoIterator for WorkQueue {
    type Item = WorkUnit;
    type IntoIter = std::vec::IntoIter<WorkUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

/// Ranked candidate items of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCandidates {
    /// Resource name.
    pub resource: String,
    /// Items in descending urgency.
    pub items: Vec<ItemName>,
}

/// Selection output: per-resource candidates in resource iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMap {
    entries: Vec<ResourceCandidates>,
}

impl CandidateMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record the ranked candidates of a resource. Empty lists are dropped.
    ///
    /// A resource recorded twice keeps its original position and takes the
    /// latest items, so each resource contributes its items once.
    pub fn insert(&mut self, resource: impl Into<String>, items: Vec<ItemName>) {
        let resource = resource.into();
        let existing = self
            .entries
            .iter()
            .position(|entry| entry.resource == resource);
        match (existing, items.is_empty()) {
            (Some(index), true) => {
                self.entries.remove(index);
            }
            (Some(index), false) => self.entries[index].items = items,
            (None, true) => {}
            (None, false) => self.entries.push(ResourceCandidates { resource, items }),
        }
    }

    /// Resources in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceCandidates> {
        self.entries.iter()
    }

    /// Candidates recorded for `resource`, if any.
    #[must_use]
    pub fn get(&self, resource: &str) -> Option<&[ItemName]> {
        self.entries
            .iter()
            .find(|entry| entry.resource == resource)
            .map(|entry| entry.items.as_slice())
    }

    /// Number of resources with at least one candidate.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.entries.len()
    }

    /// Total candidate count across resources.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.items.len()).sum()
    }

    /// Whether no resource produced a candidate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R, I> FromIterator<(R, Vec<I>)> for CandidateMap
where
    R: Into<String>,
    I: Into<ItemName>,
{
    fn from_iter<T: IntoIterator<Item = (R, Vec<I>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (resource, items) in iter {
            map.insert(resource, items.into_iter().map(Into::into).collect());
        }
        map
    }
}

/// Why a worker stopped before exhausting its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The shared deadline passed.
    Deadline,
    /// A connection to `resource` could not be established or prepared.
    ConnectionFailed {
        /// Resource that was unreachable.
        resource: String,
        /// Reported reason.
        reason: String,
    },
    /// The run was interrupted externally.
    Interrupted,
    /// The worker could not run at all (runtime setup, panic).
    WorkerFailed(String),
}

/// Worker lifecycle. `Completed` and `Halted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Not yet started.
    Idle,
    /// Acquiring a connection for the next unit.
    Connecting,
    /// Running the maintenance operation.
    Executing,
    /// Sleeping after a unit.
    Paused,
    /// Queue exhausted before the deadline.
    Completed,
    /// Stopped early.
    Halted(HaltReason),
}

impl WorkerState {
    /// Whether the worker has stopped.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Halted(_))
    }
}

/// Result of attempting one work unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Operation succeeded.
    Maintained,
    /// Dry run: operation announced but not executed.
    Skipped,
    /// Operation failed; the worker moved on.
    Failed(String),
}

/// One attempted unit and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    /// The unit attempted.
    pub unit: WorkUnit,
    /// What happened.
    pub outcome: UnitOutcome,
}

/// Per-worker run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Worker index.
    pub worker_id: usize,
    /// Units assigned to the worker.
    pub assigned: usize,
    /// Attempted units in execution order.
    pub reports: Vec<UnitReport>,
    /// Terminal state.
    pub state: WorkerState,
}

impl RunResult {
    /// A result for a worker that never attempted anything.
    #[must_use]
    pub const fn untouched(worker_id: usize, assigned: usize, state: WorkerState) -> Self {
        Self {
            worker_id,
            assigned,
            reports: Vec::new(),
            state,
        }
    }

    /// Units processed successfully (dry-run units count as processed).
    pub fn processed_units(&self) -> impl Iterator<Item = &WorkUnit> {
        self.reports
            .iter()
            .filter(|report| !matches!(report.outcome, UnitOutcome::Failed(_)))
            .map(|report| &report.unit)
    }

    /// Count of processed units.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed_units().count()
    }

    /// Count of units whose operation failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports.len() - self.processed()
    }

    /// Count of units attempted (processed or failed).
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.reports.len()
    }

    /// Count of units never reached.
    #[must_use]
    pub fn unreached(&self) -> usize {
        self.assigned.saturating_sub(self.reports.len())
    }

    /// Halt reason, if the worker stopped early.
    #[must_use]
    pub const fn halt_reason(&self) -> Option<&HaltReason> {
        match &self.state {
            WorkerState::Halted(reason) => Some(reason),
            _ => None,
        }
    }
}
