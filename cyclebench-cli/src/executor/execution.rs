//! Benchmark Execution
//!
//! Runs the benchmarks of an execution plan one after another on the calling
//! thread and collects their raw cycle counts.
//!
//! ## Data Flow
//!
//! ```text
//! RegisteredBenchmark (FixtureRunner + group)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │     Executor     │  fixture_setup → numruns × (setup, go, teardown) → fixture_teardown
//! └────────┬─────────┘
//!          │
//!          ▼
//!   BenchOutcome (raw samples, scalar or per table value)
//! ```
//!
//! A panicking fixture is not caught here. Drop guards in the runner still
//! tear the fixture down, and the panic travels to the process entry point.

use crate::suite::RegisteredBenchmark;
use cyclebench_core::Measurements;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Raw results of one benchmark
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    /// Registered name
    pub name: String,
    /// Group name; empty when ungrouped
    pub group: String,
    /// Raw cycle counts
    pub measurements: Measurements,
}

/// Execute benchmarks sequentially and produce outcomes
pub struct Executor {
    numruns: u32,
    results: Vec<BenchOutcome>,
}

impl Executor {
    /// Executor timing `numruns` repetitions per benchmark (or table value)
    pub fn new(numruns: u32) -> Self {
        Self {
            numruns,
            results: Vec::new(),
        }
    }

    /// Execute all provided benchmarks in the given order
    pub fn execute(&mut self, benchmarks: &[(&str, &RegisteredBenchmark)]) -> Vec<BenchOutcome> {
        let pb = ProgressBar::new(benchmarks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for (name, bench) in benchmarks {
            pb.set_message(name.to_string());
            let result = self.execute_single(name, bench);
            self.results.push(result);
            pb.inc(1);
        }

        pb.finish_and_clear();
        std::mem::take(&mut self.results)
    }

    /// Execute a single benchmark
    fn execute_single(&self, name: &str, bench: &RegisteredBenchmark) -> BenchOutcome {
        let start = Instant::now();
        tracing::debug!(
            "Running '{}' ({} runs, {})",
            name,
            self.numruns,
            bench.runner.strategy().name()
        );

        let measurements = bench.runner.measure(self.numruns);

        tracing::debug!("'{}' finished in {:?}", name, start.elapsed());

        BenchOutcome {
            name: name.to_string(),
            group: bench.group.clone(),
            measurements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclebench_core::{EmptyFixture, FixtureRunner, TimestampStrategy, boxed_factory};

    fn registered(group: &str, values: Option<Vec<u32>>) -> RegisteredBenchmark {
        let factory = boxed_factory(EmptyFixture::default);
        let strategy = TimestampStrategy::detect();
        let runner = match values {
            Some(values) => FixtureRunner::with_values(strategy, factory, values.into()),
            None => FixtureRunner::new(strategy, factory),
        };
        RegisteredBenchmark {
            group: group.to_string(),
            runner,
        }
    }

    #[test]
    fn test_executes_in_given_order() {
        let a = registered("", None);
        let b = registered("g", Some(vec![1, 2, 3]));
        let outcomes = Executor::new(16).execute(&[("a", &a), ("b", &b)]);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "a");
        assert_eq!(outcomes[1].name, "b");
        assert_eq!(outcomes[1].group, "g");

        match &outcomes[0].measurements {
            Measurements::Scalar(samples) => assert_eq!(samples.len(), 16),
            other => panic!("expected scalar measurements, got {other:?}"),
        }
        match &outcomes[1].measurements {
            Measurements::Table(table) => {
                let labels: Vec<&str> = table.iter().map(|(label, _)| label.as_str()).collect();
                assert_eq!(labels, vec!["1", "2", "3"]);
                assert!(table.iter().all(|(_, samples)| samples.len() == 16));
            }
            other => panic!("expected table measurements, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_plan() {
        assert!(Executor::new(8).execute(&[]).is_empty());
    }
}
