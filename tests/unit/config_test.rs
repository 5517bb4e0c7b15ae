//! Tests for configuration validation

use std::time::Duration;

use flexible_freeze::config::{Mode, RunConfig, Throttle, WorkerConfig};
use flexible_freeze::core::{MaintenanceOp, Policy};

#[test]
fn test_run_config_default_is_valid() {
    assert!(RunConfig::default().validate().is_ok());
}

#[test]
fn test_run_config_invalid_freeze_age() {
    let invalid = RunConfig {
        freeze_age: -1,
        ..RunConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_run_config_invalid_freeze_limit() {
    let invalid = RunConfig {
        freeze_limit: 0,
        ..RunConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_run_config_invalid_resource_name() {
    let invalid = RunConfig {
        resources: vec!["orders".into(), "  ".into()],
        ..RunConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_run_config_invalid_cost_limit() {
    let invalid = RunConfig {
        throttle: Throttle {
            cost_delay_ms: 20,
            cost_limit: 0,
        },
        ..RunConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_freeze_policy_carries_thresholds() {
    let cfg = RunConfig {
        freeze_age: 42,
        freeze_limit: 7,
        ..RunConfig::default()
    };
    match cfg.policy() {
        Policy::Freeze(t) => {
            assert_eq!(t.min_age, 42);
            assert_eq!(t.limit, 7);
        }
        Policy::Decay(_) => panic!("expected freeze policy"),
    }
}

#[test]
fn test_worker_config_derivation() {
    let cfg = RunConfig {
        mode: Mode::Vacuum,
        pause_secs: 0,
        enforce_time: true,
        timeout_slack_secs: 5,
        dry_run: true,
        throttle: Throttle {
            cost_delay_ms: 2,
            cost_limit: 500,
        },
        ..RunConfig::default()
    };
    let worker = cfg.worker_config();
    assert_eq!(worker.pause, Duration::ZERO);
    assert!(worker.enforce_time);
    assert_eq!(worker.timeout_slack, Duration::from_secs(5));
    assert!(worker.dry_run);
    assert_eq!(worker.throttle.cost_limit, 500);
    assert_eq!(worker.operation, MaintenanceOp::VacuumAnalyze);
}

#[test]
fn test_worker_config_builder() {
    let worker = WorkerConfig::new()
        .with_pause(Duration::from_millis(5))
        .with_dry_run(true)
        .with_operation(MaintenanceOp::VacuumAnalyze);
    assert_eq!(worker.pause, Duration::from_millis(5));
    assert!(worker.dry_run);
    assert!(!worker.enforce_time);
    assert_eq!(worker.operation, MaintenanceOp::VacuumAnalyze);
}

#[test]
fn test_run_config_serde_roundtrip_drops_password() {
    let mut cfg = RunConfig::default();
    cfg.credentials.password = Some("secret".into());
    cfg.credentials.user = Some("maint".into());
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(!json.contains("secret"));
    let back: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.credentials.user.as_deref(), Some("maint"));
    assert_eq!(back.credentials.password, None);
}
