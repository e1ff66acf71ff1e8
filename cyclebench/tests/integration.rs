//! Integration tests for cyclebench
//!
//! These tests verify the end-to-end behavior of the benchmarking system.

use cyclebench::prelude::*;
use cyclebench::{
    EmptyFixture, FixtureRunner, Measurements, RunnerError, SuiteConfig, TimestampStrategy,
    boxed_factory, compute_cycle_stats,
};
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

/// Fixture that records every lifecycle call
struct Recorder {
    log: Log,
}

impl Fixture for Recorder {
    fn fixture_setup(&mut self) {
        self.log.borrow_mut().push("fixture_setup".into());
    }

    fn setup(&mut self) {
        self.log.borrow_mut().push("setup".into());
    }

    fn setup_with(&mut self, value: &dyn Any) {
        let value = value.downcast_ref::<u32>().copied().unwrap_or_default();
        self.log.borrow_mut().push(format!("setup_with {value}"));
    }

    fn go(&mut self) {
        self.log.borrow_mut().push("go".into());
    }

    fn teardown(&mut self) {
        self.log.borrow_mut().push("teardown".into());
    }

    fn fixture_teardown(&mut self) {
        self.log.borrow_mut().push("fixture_teardown".into());
    }
}

fn recorder(log: &Log) -> impl Fn() -> Recorder + 'static {
    let log = Rc::clone(log);
    move || Recorder {
        log: Rc::clone(&log),
    }
}

fn quick_config() -> SuiteConfig {
    SuiteConfig {
        numruns: 1_000,
        ..SuiteConfig::default()
    }
}

/// Test that a scalar run yields one sample per repetition and balanced hooks
#[test]
fn test_scalar_lifecycle_counts() {
    let log: Log = Rc::default();
    let runner = FixtureRunner::new(TimestampStrategy::detect(), boxed_factory(recorder(&log)));

    let samples = match runner.measure(25) {
        Measurements::Scalar(samples) => samples,
        other => panic!("expected scalar measurements, got {other:?}"),
    };
    assert_eq!(samples.len(), 25);

    let log = log.borrow();
    let count = |name: &str| log.iter().filter(|entry| entry.as_str() == name).count();
    assert_eq!(count("fixture_setup"), 1);
    assert_eq!(count("setup"), 25);
    assert_eq!(count("go"), 25);
    assert_eq!(count("teardown"), 25);
    assert_eq!(count("fixture_teardown"), 1);
    assert_eq!(log.first().map(String::as_str), Some("fixture_setup"));
    assert_eq!(log.last().map(String::as_str), Some("fixture_teardown"));
}

/// Test table mode labels, order and per-value setup
#[test]
fn test_table_sweep() {
    let log: Log = Rc::default();
    let runner = FixtureRunner::with_values(
        TimestampStrategy::detect(),
        boxed_factory(recorder(&log)),
        ValueGenerator::from(vec![10u32, 100, 1000]),
    );

    let table = match runner.measure(4) {
        Measurements::Table(table) => table,
        other => panic!("expected table measurements, got {other:?}"),
    };
    let labels: Vec<&str> = table.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, vec!["10", "100", "1000"]);
    assert!(table.iter().all(|(_, samples)| samples.len() == 4));

    let log = log.borrow();
    let setups: Vec<&str> = log
        .iter()
        .filter(|entry| entry.starts_with("setup_with"))
        .map(String::as_str)
        .collect();
    assert_eq!(setups.len(), 12);
    assert_eq!(setups[0], "setup_with 10");
    assert_eq!(setups[4], "setup_with 100");
    assert_eq!(setups[11], "setup_with 1000");
    assert!(!log.iter().any(|entry| entry == "setup"));
}

/// Test that `run_table` on a scalar runner is rejected
#[test]
fn test_run_table_requires_values() {
    let runner = FixtureRunner::new(
        TimestampStrategy::detect(),
        boxed_factory(EmptyFixture::default),
    );
    let mut handle = runner.setup();
    let err = runner.run_table(8, &mut *handle).unwrap_err();
    assert!(matches!(err, RunnerError::NotTable));
    runner.teardown(handle);
}

/// Test that teardown hooks still run when `go()` panics
#[test]
fn test_teardown_on_panic() {
    struct Exploding {
        log: Log,
    }

    impl Fixture for Exploding {
        fn go(&mut self) {
            panic!("boom");
        }

        fn teardown(&mut self) {
            self.log.borrow_mut().push("teardown".into());
        }

        fn fixture_teardown(&mut self) {
            self.log.borrow_mut().push("fixture_teardown".into());
        }
    }

    let log: Log = Rc::default();
    let factory_log = Rc::clone(&log);
    let runner = FixtureRunner::new(
        TimestampStrategy::detect(),
        boxed_factory(move || Exploding {
            log: Rc::clone(&factory_log),
        }),
    );

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| runner.measure(5)));
    assert!(result.is_err());
    assert_eq!(*log.borrow(), vec!["teardown", "fixture_teardown"]);
}

/// Test that generators restart independently when cloned
#[test]
fn test_generator_clone_independence() {
    let mut original = ValueGenerator::from(["a", "b", "c"]);
    let first = original.next().unwrap();
    assert_eq!(original.to_string(&*first), "a");

    let mut copy = original.clone();
    let mut from_copy = Vec::new();
    while let Some(value) = copy.next() {
        from_copy.push(copy.to_string(&*value));
    }
    assert_eq!(from_copy, vec!["b", "c"]);

    // The original is unaffected by draining the copy
    let rest = original.next().unwrap();
    assert_eq!(original.to_string(&*rest), "b");

    original.next();
    assert!(original.next().is_none());
    assert!(original.next().is_none());
}

/// Test filter composition through the suite registry
#[test]
fn test_suite_filter_composition() {
    let mut suite = Suite::new();
    suite
        .group("a")
        .add("x", EmptyFixture::default)
        .add("y", EmptyFixture::default);
    suite.group("b").add("z", EmptyFixture::default);
    suite.add("loose", EmptyFixture::default);

    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    suite
        .configure(SuiteConfig {
            group_filters: strings(&["a"]),
            name_filters: strings(&["x"]),
            ..quick_config()
        })
        .unwrap();
    assert_eq!(suite.plan().unwrap().benchmarks, vec!["x"]);

    // Ungrouped benchmarks always pass the group stage
    suite
        .configure(SuiteConfig {
            group_filters: strings(&["b"]),
            ..quick_config()
        })
        .unwrap();
    assert_eq!(suite.plan().unwrap().benchmarks, vec!["loose", "z"]);

    // Empty lists keep everything
    suite.configure(quick_config()).unwrap();
    assert_eq!(
        suite.plan().unwrap().benchmarks,
        vec!["loose", "x", "y", "z"]
    );
}

/// Test that an empty fixture measures close to zero once overhead is removed
#[test]
fn test_empty_fixture_after_overhead() {
    if !cyclebench::HAS_CYCLE_COUNTER {
        return;
    }

    let mut suite = Suite::new();
    suite.configure(quick_config()).unwrap();
    let overhead = suite.compute_overhead();

    let runner = FixtureRunner::new(
        suite.config().strategy,
        boxed_factory(EmptyFixture::default),
    );
    let samples = match runner.measure(100) {
        Measurements::Scalar(samples) => samples,
        other => panic!("expected scalar measurements, got {other:?}"),
    };
    let stats = compute_cycle_stats(&samples, overhead).unwrap();

    assert_eq!(stats.sample_count, 100);
    // Interrupts can inflate single samples; the bulk must sit near zero
    assert!(stats.min < 1_000, "min {} too far from zero", stats.min);
    assert!(
        stats.percentiles.p75 < 5_000,
        "p75 {} too far from zero",
        stats.percentiles.p75
    );

    // Samples sit in a tight band with almost no spread
    let band = stats.percentiles.p90 - stats.min;
    assert!(band < 200, "p90 is {band} cycles above min");
    assert!(stats.std_dev < 100.0, "std_dev {} too large", stats.std_dev);
}

/// Test the formatted report of a whole suite
#[test]
fn test_suite_execute_report() {
    let mut suite = Suite::new();
    suite.add("scalar", EmptyFixture::default);
    suite
        .group("sweep")
        .add_table("table", EmptyFixture::default, [10u32, 100, 1000]);
    suite.configure(quick_config()).unwrap();

    let output = suite.execute().unwrap().expect("benchmarks matched");
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], "========== Ungrouped ==========");
    assert!(lines[1].starts_with("scalar, avg="));
    assert_eq!(lines[2], "========== sweep ==========");
    assert!(lines[3].starts_with("table(10), avg="));
    assert!(lines[4].starts_with("table(100), avg="));
    assert!(lines[5].starts_with("table(1000), avg="));
    assert!(lines.iter().skip(1).all(|l| l.starts_with("====") || l.contains("clk)")));
}

/// Test that nothing matching the filters is not an error
#[test]
fn test_suite_execute_no_match() {
    let mut suite = Suite::new();
    suite.add("scalar", EmptyFixture::default);
    suite
        .configure(SuiteConfig {
            name_filters: vec!["other".to_string()],
            ..quick_config()
        })
        .unwrap();
    assert!(suite.execute().unwrap().is_none());
}

/// Test process exit codes of the CLI entry point
#[test]
fn test_exit_codes() {
    assert_eq!(
        cyclebench::run_suite_from(["bench", "--version"], Suite::new()),
        ExitCode::SUCCESS
    );
    assert_eq!(
        cyclebench::run_suite_from(["bench", "--numruns", "zero"], Suite::new()),
        ExitCode::from(1)
    );
    // A negative core parses, then fails as a configuration error
    assert_eq!(
        cyclebench::run_suite_from(["bench", "--pincore", "-1"], Suite::new()),
        ExitCode::from(255)
    );
}

/// Test that an unpinnable core is a fatal error
#[cfg(target_os = "linux")]
#[test]
fn test_invalid_core_exit_code() {
    assert_eq!(
        cyclebench::run_suite_from(["bench", "--pincore", "1000000000"], Suite::new()),
        ExitCode::from(255)
    );
}
