//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Credentials, Mode, RunConfig, Throttle};
use crate::core::policy::DEFAULT_FREEZE_LIMIT;
use crate::core::{parse_scoped_excludes, MaintenanceError};

/// Freeze or vacuum the tables that need it most, within a time budget.
///
/// Tables are selected per database, spread round-robin across parallel
/// jobs, and processed until the list runs out or the time limit is hit.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "flexible-freeze", version, about)]
pub struct CliArgs {
    /// Number of minutes to run before halting
    #[arg(short = 'm', long = "minutes", default_value_t = 120)]
    pub minutes: u64,

    /// Comma-separated list of databases to process, if not all of them
    #[arg(short = 'd', long = "databases", value_delimiter = ',')]
    pub databases: Vec<String>,

    /// Exclude any table with this name, in any database (repeatable)
    #[arg(short = 'T', long = "exclude-table")]
    pub exclude_table: Vec<String>,

    /// Exclude DATABASE.TABLE, only when processing that database (repeatable)
    #[arg(long = "exclude-table-in-database", value_name = "DATABASE.TABLE")]
    pub exclude_table_in_database: Vec<String>,

    /// Do a regular VACUUM ANALYZE instead of VACUUM FREEZE
    #[arg(long)]
    pub vacuum: bool,

    /// Seconds to pause after each table
    #[arg(long, default_value_t = 10)]
    pub pause: u64,

    /// Minimum transaction age for freezing
    #[arg(long, default_value_t = 10_000_000)]
    pub freezeage: i64,

    /// vacuum_cost_delay in milliseconds
    #[arg(long, default_value_t = 20)]
    pub costdelay: u32,

    /// vacuum_cost_limit
    #[arg(long, default_value_t = 2000)]
    pub costlimit: u32,

    /// Prefix every status line with a timestamp
    #[arg(short = 't', long = "print-timestamps")]
    pub print_timestamps: bool,

    /// Enforce the time limit by cancelling running operations
    #[arg(long = "enforce-time")]
    pub enforce_time: bool,

    /// Seconds past the time limit before an enforced timeout fires
    #[arg(long = "timeout-slack", default_value_t = 30)]
    pub timeout_slack: u64,

    /// Append output to this file instead of stdout
    #[arg(short = 'l', long = "log")]
    pub log: Option<PathBuf>,

    /// Print progress lines
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print diagnostics to stderr
    #[arg(long)]
    pub debug: bool,

    /// Database user
    #[arg(short = 'U', long = "user", env = "PGUSER")]
    pub user: Option<String>,

    /// Database host
    #[arg(short = 'H', long = "host", env = "PGHOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'p', long = "port", env = "PGPORT")]
    pub port: Option<u16>,

    /// Database password
    #[arg(short = 'w', long = "password", env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print what would be done without doing it
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Number of parallel jobs
    #[arg(short = 'j', long = "jobs", default_value_t = 1)]
    pub jobs: usize,
}

impl CliArgs {
    /// Convert parsed arguments into a validated run configuration.
    ///
    /// # Errors
    ///
    /// [`MaintenanceError::Config`] for a malformed `DATABASE.TABLE`
    /// exclusion or any value rejected by [`RunConfig::validate`].
    pub fn into_config(self) -> Result<RunConfig, MaintenanceError> {
        let exclude_scoped = parse_scoped_excludes(&self.exclude_table_in_database)?;
        let resources = self
            .databases
            .into_iter()
            .map(|db| db.trim().to_string())
            .filter(|db| !db.is_empty())
            .collect();

        let cfg = RunConfig {
            run_minutes: self.minutes,
            resources,
            exclude_items: self.exclude_table,
            exclude_scoped,
            mode: if self.vacuum { Mode::Vacuum } else { Mode::Freeze },
            freeze_age: self.freezeage,
            freeze_limit: DEFAULT_FREEZE_LIMIT,
            pause_secs: self.pause,
            throttle: Throttle {
                cost_delay_ms: self.costdelay,
                cost_limit: self.costlimit,
            },
            enforce_time: self.enforce_time,
            timeout_slack_secs: self.timeout_slack,
            dry_run: self.dry_run,
            jobs: self.jobs,
            verbose: self.verbose,
            debug: self.debug,
            print_timestamps: self.print_timestamps,
            log_file: self.log,
            credentials: Credentials {
                user: self.user,
                host: self.host,
                port: self.port,
                password: self.password,
            },
        };
        cfg.validate().map_err(MaintenanceError::Config)?;
        Ok(cfg)
    }
}
