//! Tests for command-line parsing

use std::time::Duration;

use clap::Parser;
use flexible_freeze::cli::CliArgs;
use flexible_freeze::config::Mode;
use flexible_freeze::core::{ItemName, MaintenanceError};

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("flexible-freeze").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_defaults() {
    let cfg = parse(&[]).into_config().unwrap();
    assert_eq!(cfg.run_minutes, 120);
    assert_eq!(cfg.mode, Mode::Freeze);
    assert_eq!(cfg.freeze_age, 10_000_000);
    assert_eq!(cfg.pause_secs, 10);
    assert_eq!(cfg.throttle.cost_delay_ms, 20);
    assert_eq!(cfg.throttle.cost_limit, 2000);
    assert_eq!(cfg.jobs, 1);
    assert!(cfg.resources.is_empty());
    assert!(!cfg.dry_run);
}

#[test]
fn test_full_flag_set() {
    let cfg = parse(&[
        "-m", "30", "-d", "orders, billing", "-T", "audit", "-T", "events",
        "--exclude-table-in-database", "orders.line_items", "--vacuum", "--pause", "0",
        "--costdelay", "5", "--costlimit", "400", "-t", "--enforce-time",
        "--timeout-slack", "10", "-v", "-n", "-j", "4",
    ])
    .into_config()
    .unwrap();

    assert_eq!(cfg.budget(), Duration::from_secs(1800));
    assert_eq!(cfg.resources, ["orders", "billing"]);
    assert_eq!(cfg.exclude_items, ["audit", "events"]);
    assert_eq!(cfg.mode, Mode::Vacuum);
    assert!(cfg.print_timestamps && cfg.enforce_time && cfg.verbose && cfg.dry_run);
    assert_eq!(cfg.worker_count(), 4);
    assert_eq!(cfg.worker_config().timeout_slack, Duration::from_secs(10));

    let exclusions = flexible_freeze::core::build_exclusions(
        cfg.exclude_items.clone(),
        cfg.exclude_scoped.clone(),
    );
    assert!(exclusions.is_excluded("orders", &ItemName::parse("line_items")));
    assert!(!exclusions.is_excluded("billing", &ItemName::parse("line_items")));
}

#[test]
fn test_malformed_scoped_exclusion_exits_with_two() {
    let err = parse(&["--exclude-table-in-database", "orders"])
        .into_config()
        .unwrap_err();
    assert!(matches!(err, MaintenanceError::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_explicit_credentials_override_environment() {
    let cfg = parse(&["-U", "maint", "-H", "db.internal", "-p", "6432", "-w", "pw"])
        .into_config()
        .unwrap();
    assert_eq!(cfg.credentials.user.as_deref(), Some("maint"));
    assert_eq!(cfg.credentials.host.as_deref(), Some("db.internal"));
    assert_eq!(cfg.credentials.port, Some(6432));
    assert_eq!(cfg.credentials.password.as_deref(), Some("pw"));
}

#[test]
fn test_bad_number_rejected_by_parser() {
    assert!(CliArgs::try_parse_from(["flexible-freeze", "--minutes", "soon"]).is_err());
}
