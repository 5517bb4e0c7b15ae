//! Tests for exclusion sets

use std::collections::HashMap;

use flexible_freeze::core::{build_exclusions, parse_scoped_excludes, ItemName, MaintenanceError};

#[test]
fn test_global_exclusion_applies_everywhere() {
    let set = build_exclusions(["audit_log"], HashMap::<String, Vec<String>>::new());
    assert!(set.is_excluded("orders", &ItemName::parse("audit_log")));
    assert!(set.is_excluded("billing", &ItemName::parse("audit_log")));
    assert!(!set.is_excluded("orders", &ItemName::parse("customers")));
}

#[test]
fn test_scoped_exclusion_applies_to_one_resource() {
    let scoped = parse_scoped_excludes(["orders.line_items"]).unwrap();
    let set = build_exclusions(Vec::<String>::new(), scoped);
    assert!(set.is_excluded("orders", &ItemName::parse("line_items")));
    assert!(!set.is_excluded("billing", &ItemName::parse("line_items")));
}

#[test]
fn test_for_resource_is_sorted_union() {
    let scoped = parse_scoped_excludes(["orders.b", "orders.a", "billing.z"]).unwrap();
    let set = build_exclusions(["c"], scoped);
    assert_eq!(set.for_resource("orders"), ["a", "b", "c"]);
    assert_eq!(set.for_resource("billing"), ["c", "z"]);
    assert_eq!(set.for_resource("unknown"), ["c"]);
}

#[test]
fn test_qualified_name_matches_default_schema() {
    let set = build_exclusions(["public.orders"], HashMap::<String, Vec<String>>::new());
    assert!(set.is_excluded("db", &ItemName::parse("orders")));
    assert!(!set.is_excluded("db", &ItemName::new("archive", "orders")));
}

#[test]
fn test_malformed_scoped_arguments_are_config_errors() {
    for bad in ["orders", "orders.", ".items", "a.b.c", ""] {
        let err = parse_scoped_excludes([bad]).unwrap_err();
        assert!(matches!(err, MaintenanceError::Config(_)), "{bad} accepted");
        assert_eq!(err.exit_code(), 2);
    }
}

#[test]
fn test_empty_set() {
    let set = build_exclusions(Vec::<String>::new(), HashMap::<String, Vec<String>>::new());
    assert!(set.is_empty());
    assert!(set.for_resource("any").is_empty());
}
