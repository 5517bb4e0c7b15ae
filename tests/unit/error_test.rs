//! Tests for error types

use flexible_freeze::core::MaintenanceError;

#[test]
fn test_config_error() {
    let err = MaintenanceError::Config("bad flag".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: bad flag");
    assert_eq!(err.exit_code(), 2);
    assert!(!err.is_recoverable());
}

#[test]
fn test_connection_error() {
    let err = MaintenanceError::Connection {
        resource: "orders".to_string(),
        reason: "connection refused".to_string(),
    };
    assert_eq!(format!("{}", err), "could not connect to orders: connection refused");
    assert_eq!(err.exit_code(), 1);
    assert!(err.is_recoverable());
}

#[test]
fn test_operation_error() {
    let err = MaintenanceError::Operation {
        item: "audit.events".to_string(),
        reason: "canceling statement due to statement timeout".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "maintenance of audit.events failed: canceling statement due to statement timeout"
    );
    assert!(err.is_recoverable());
}

#[test]
fn test_startup_error() {
    let err = MaintenanceError::Startup("no databases to vacuum, aborting".to_string());
    assert_eq!(format!("{}", err), "startup failed: no databases to vacuum, aborting");
    assert_eq!(err.exit_code(), 1);
    assert!(!err.is_recoverable());
}

#[test]
fn test_worker_error() {
    let err = MaintenanceError::Worker("could not spawn worker 3".to_string());
    assert_eq!(format!("{}", err), "worker failure: could not spawn worker 3");
    assert_eq!(err.exit_code(), 1);
}
