//! Tests for the status reporter

use std::thread;

use flexible_freeze::util::report::{ReportOptions, Reporter};

#[test]
fn test_plain_lines() {
    let (reporter, output) = Reporter::capture(ReportOptions::default());
    reporter.emit("first");
    reporter.verbose("hidden");
    reporter.emit("second");
    assert_eq!(output.lines(), ["first", "second"]);
}

#[test]
fn test_verbose_lines_shown_when_enabled() {
    let (reporter, output) = Reporter::capture(ReportOptions {
        verbose: true,
        timestamps: false,
    });
    reporter.verbose("detail");
    assert_eq!(output.lines(), ["detail"]);
}

#[test]
fn test_clones_share_one_sink() {
    let (reporter, output) = Reporter::capture(ReportOptions::default());
    let other = reporter.clone();
    reporter.emit("a");
    other.emit("b");
    assert_eq!(output.lines(), ["a", "b"]);
}

#[test]
fn test_concurrent_emitters_never_interleave() {
    let (reporter, output) = Reporter::capture(ReportOptions {
        verbose: false,
        timestamps: true,
    });
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let reporter = reporter.clone();
            thread::spawn(move || {
                for n in 0..100 {
                    reporter.emit(format!("Worker {worker} line {n} {}", "x".repeat(64)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let lines = output.lines();
    assert_eq!(lines.len(), 400);
    for line in lines {
        let (_, body) = line.split_once(": Worker ").expect("timestamp prefix");
        assert!(body.ends_with(&"x".repeat(64)), "torn line: {line}");
    }
}

#[test]
fn test_append_to_file() {
    let path = std::env::temp_dir().join(format!("ff-report-{}.log", uuid::Uuid::new_v4()));
    {
        let reporter = Reporter::append_to(&path, ReportOptions::default()).unwrap();
        reporter.emit("one");
    }
    {
        let reporter = Reporter::append_to(&path, ReportOptions::default()).unwrap();
        reporter.emit("two");
    }
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(contents, "one\ntwo\n");
}
