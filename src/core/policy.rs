//! Selection policies: which items need maintenance, and how urgently.
//!
//! A policy is evaluated twice in practice: backends push the same
//! predicates into their catalog query, and the selector re-ranks whatever
//! comes back so ordering never depends on the backend.

use std::cmp::Ordering;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::model::ItemName;

/// Default freeze age threshold (transaction ids).
pub const DEFAULT_FREEZE_AGE: i64 = 10_000_000;
/// Default cap on freeze candidates per resource.
pub const DEFAULT_FREEZE_LIMIT: usize = 1000;

/// Thresholds for the freeze policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeThresholds {
    /// Items older than this are eligible.
    pub min_age: i64,
    /// Maximum candidates per resource.
    pub limit: usize,
}

impl Default for FreezeThresholds {
    fn default() -> Self {
        Self {
            min_age: DEFAULT_FREEZE_AGE,
            limit: DEFAULT_FREEZE_LIMIT,
        }
    }
}

/// Thresholds for the decay (dead-row) policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayThresholds {
    /// Stale rows must exceed this count.
    pub min_dead_rows: i64,
    /// `dead / (live + 1)` must exceed this ratio.
    pub min_dead_ratio: f64,
    /// Table size must exceed this many bytes.
    pub min_size_bytes: i64,
    /// Items maintained more recently than this are skipped.
    pub quiet_period: Duration,
}

impl Default for DecayThresholds {
    fn default() -> Self {
        Self {
            min_dead_rows: 100,
            min_dead_ratio: 0.05,
            min_size_bytes: 1_000_000,
            quiet_period: Duration::from_secs(3600),
        }
    }
}

/// Maintenance operation issued for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceOp {
    /// `VACUUM FREEZE ANALYZE`.
    FreezeAnalyze,
    /// `VACUUM ANALYZE`.
    VacuumAnalyze,
}

impl MaintenanceOp {
    /// Statement for `item`, with identifiers quoted.
    #[must_use]
    pub fn statement(self, item: &ItemName) -> String {
        match self {
            Self::FreezeAnalyze => format!("VACUUM FREEZE ANALYZE {}", item.quoted()),
            Self::VacuumAnalyze => format!("VACUUM ANALYZE {}", item.quoted()),
        }
    }

    /// Short verb for status lines.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::FreezeAnalyze => "VACUUM FREEZE",
            Self::VacuumAnalyze => "VACUUM",
        }
    }
}

/// Selection policy. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Freeze the oldest tables.
    Freeze(FreezeThresholds),
    /// Vacuum tables with the most stale rows.
    Decay(DecayThresholds),
}

/// Live metrics of one item, read at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    /// Item name.
    pub name: ItemName,
    /// Age of the main relation's frozen-xid marker.
    pub xid_age: i64,
    /// Age of the side-store (TOAST) marker, if the item has one.
    pub side_store_xid_age: Option<i64>,
    /// Live row estimate.
    pub live_rows: i64,
    /// Dead row estimate.
    pub dead_rows: i64,
    /// Main relation size in bytes.
    pub size_bytes: i64,
    /// Time since the most recent vacuum of any kind; `None` if never.
    pub since_last_maintenance: Option<Duration>,
}

impl ItemStats {
    /// Freeze age, taking the side store into account.
    #[must_use]
    pub fn freeze_age(&self) -> i64 {
        self.side_store_xid_age
            .map_or(self.xid_age, |side| side.max(self.xid_age))
    }

    /// Stale row ratio `dead / (live + 1)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn dead_ratio(&self) -> f64 {
        self.dead_rows as f64 / (self.live_rows + 1) as f64
    }
}

/// Ranking metric of a candidate. Larger is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Freeze age in transactions.
    FreezeAge(i64),
    /// Stale ratio, then size.
    Decay {
        /// Stale row ratio.
        dead_ratio: f64,
        /// Size in bytes.
        size_bytes: i64,
    },
}

impl Urgency {
    /// Order by descending urgency.
    #[must_use]
    pub fn cmp_desc(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::FreezeAge(a), Self::FreezeAge(b)) => b.cmp(a),
            (
                Self::Decay {
                    dead_ratio: ra,
                    size_bytes: sa,
                },
                Self::Decay {
                    dead_ratio: rb,
                    size_bytes: sb,
                },
            ) => rb.total_cmp(ra).then_with(|| sb.cmp(sa)),
            _ => Ordering::Equal,
        }
    }
}

/// An eligible item with its urgency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Item name.
    pub name: ItemName,
    /// Ranking metric.
    pub urgency: Urgency,
}

impl Policy {
    /// Urgency of `stats` if the item is eligible under this policy.
    #[must_use]
    pub fn evaluate(&self, stats: &ItemStats) -> Option<Urgency> {
        match self {
            Self::Freeze(t) => {
                let age = stats.freeze_age();
                (age > t.min_age).then_some(Urgency::FreezeAge(age))
            }
            Self::Decay(t) => {
                let recently = stats
                    .since_last_maintenance
                    .is_some_and(|elapsed| elapsed <= t.quiet_period);
                let ratio = stats.dead_ratio();
                let eligible = stats.dead_rows > t.min_dead_rows
                    && ratio > t.min_dead_ratio
                    && stats.size_bytes > t.min_size_bytes
                    && !recently;
                eligible.then_some(Urgency::Decay {
                    dead_ratio: ratio,
                    size_bytes: stats.size_bytes,
                })
            }
        }
    }

    /// Sort by descending urgency (stable) and apply the policy's cap.
    pub fn rank(&self, candidates: &mut Vec<Candidate>) {
        candidates.sort_by(|a, b| a.urgency.cmp_desc(&b.urgency));
        if let Some(limit) = self.limit() {
            candidates.truncate(limit);
        }
    }

    /// Per-resource candidate cap.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        match self {
            Self::Freeze(t) => Some(t.limit),
            Self::Decay(_) => None,
        }
    }

    /// Operation issued for this policy's candidates.
    #[must_use]
    pub const fn operation(&self) -> MaintenanceOp {
        match self {
            Self::Freeze(_) => MaintenanceOp::FreezeAnalyze,
            Self::Decay(_) => MaintenanceOp::VacuumAnalyze,
        }
    }
}
