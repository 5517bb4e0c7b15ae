//! Run and worker configuration structures.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::policy::{DecayThresholds, FreezeThresholds, MaintenanceOp, Policy};

/// Which maintenance the run performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// `VACUUM FREEZE` the oldest tables.
    #[default]
    Freeze,
    /// `VACUUM ANALYZE` tables with many dead rows.
    Vacuum,
}

/// Cost-based throttling applied to every worker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    /// `vacuum_cost_delay` in milliseconds.
    pub cost_delay_ms: u32,
    /// `vacuum_cost_limit`.
    pub cost_limit: u32,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            cost_delay_ms: 20,
            cost_limit: 2000,
        }
    }
}

/// Connection credentials. Unset fields fall back to libpq environment
/// defaults.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Role name.
    pub user: Option<String>,
    /// Server host.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Password.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Immutable settings handed to every worker at spawn time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Sleep taken after every unit.
    pub pause: Duration,
    /// Set a statement timeout so operations abort near the deadline.
    pub enforce_time: bool,
    /// Slack added to the remaining budget for the statement timeout.
    pub timeout_slack: Duration,
    /// Announce operations without executing them.
    pub dry_run: bool,
    /// Throttling applied to each new connection.
    pub throttle: Throttle,
    /// Operation issued per unit.
    pub operation: MaintenanceOp,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(10),
            enforce_time: false,
            timeout_slack: Duration::from_secs(30),
            dry_run: false,
            throttle: Throttle::default(),
            operation: MaintenanceOp::FreezeAnalyze,
        }
    }
}

impl WorkerConfig {
    /// Create the default worker configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause taken after each unit.
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Enable or disable the hard statement timeout.
    #[must_use]
    pub fn with_enforce_time(mut self, enforce: bool) -> Self {
        self.enforce_time = enforce;
        self
    }

    /// Set the statement timeout slack.
    #[must_use]
    pub fn with_timeout_slack(mut self, slack: Duration) -> Self {
        self.timeout_slack = slack;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set connection throttling.
    #[must_use]
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Set the operation.
    #[must_use]
    pub fn with_operation(mut self, operation: MaintenanceOp) -> Self {
        self.operation = operation;
        self
    }
}

/// Full configuration of one maintenance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Minutes before workers stop starting new items.
    pub run_minutes: u64,
    /// Explicit resources; discovered when empty.
    pub resources: Vec<String>,
    /// Items excluded in every resource.
    pub exclude_items: Vec<String>,
    /// Items excluded in one resource only.
    pub exclude_scoped: HashMap<String, BTreeSet<String>>,
    /// Maintenance mode.
    pub mode: Mode,
    /// Minimum freeze age for the freeze policy.
    pub freeze_age: i64,
    /// Maximum freeze candidates per resource.
    pub freeze_limit: usize,
    /// Seconds to pause after each item.
    pub pause_secs: u64,
    /// Connection throttling.
    pub throttle: Throttle,
    /// Enforce the deadline with a statement timeout.
    pub enforce_time: bool,
    /// Seconds of slack added to the enforced statement timeout.
    pub timeout_slack_secs: u64,
    /// Announce instead of executing.
    pub dry_run: bool,
    /// Number of parallel workers.
    pub jobs: usize,
    /// Emit verbose status lines.
    pub verbose: bool,
    /// Emit debug diagnostics.
    pub debug: bool,
    /// Prefix status lines with timestamps.
    pub print_timestamps: bool,
    /// Append status output to this file instead of stdout.
    pub log_file: Option<PathBuf>,
    /// Connection credentials.
    pub credentials: Credentials,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_minutes: 120,
            resources: Vec::new(),
            exclude_items: Vec::new(),
            exclude_scoped: HashMap::new(),
            mode: Mode::Freeze,
            freeze_age: FreezeThresholds::default().min_age,
            freeze_limit: FreezeThresholds::default().limit,
            pause_secs: 10,
            throttle: Throttle::default(),
            enforce_time: false,
            timeout_slack_secs: 30,
            dry_run: false,
            jobs: 1,
            verbose: false,
            debug: false,
            print_timestamps: false,
            log_file: None,
            credentials: Credentials::default(),
        }
    }
}

impl RunConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.freeze_age < 0 {
            return Err("freeze_age must not be negative".into());
        }
        if self.freeze_limit == 0 {
            return Err("freeze_limit must be greater than 0".into());
        }
        if self.resources.iter().any(|r| r.trim().is_empty()) {
            return Err("resource names must not be empty".into());
        }
        if self.throttle.cost_limit == 0 {
            return Err("cost_limit must be greater than 0".into());
        }
        Ok(())
    }

    /// Worker count, clamped to at least one.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.jobs.max(1)
    }

    /// Run budget.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_secs(self.run_minutes.saturating_mul(60))
    }

    /// Selection policy for the configured mode.
    #[must_use]
    pub fn policy(&self) -> Policy {
        match self.mode {
            Mode::Freeze => Policy::Freeze(FreezeThresholds {
                min_age: self.freeze_age,
                limit: self.freeze_limit,
            }),
            Mode::Vacuum => Policy::Decay(DecayThresholds::default()),
        }
    }

    /// Worker settings derived from this configuration.
    #[must_use]
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new()
            .with_pause(Duration::from_secs(self.pause_secs))
            .with_enforce_time(self.enforce_time)
            .with_timeout_slack(Duration::from_secs(self.timeout_slack_secs))
            .with_dry_run(self.dry_run)
            .with_throttle(self.throttle)
            .with_operation(self.policy().operation())
    }
}
