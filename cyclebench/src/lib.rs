#![warn(missing_docs)]
//! # cyclebench
//!
//! Cycle-accurate micro-benchmarks for Rust.
//!
//! cyclebench times very short code paths in CPU timestamp-counter cycles:
//! - **Serialized Timestamps**: CPUID+RDTSC start, RDTSCP (or CPUID+RDTSC) end on x86_64
//! - **Overhead Subtraction**: The cost of the timing loop is measured with an empty fixture and removed
//! - **Fixture Lifecycle**: Per-benchmark and per-repetition setup/teardown kept out of the timed region
//! - **Table Mode**: Sweep one benchmark over a list of input values
//! - **Groups and Filters**: Select benchmarks by full-match regular expressions on name and group
//! - **Core Pinning**: The process is pinned to one core before measuring
//!
//! ## Quick Start
//!
//! ```ignore
//! use cyclebench::prelude::*;
//!
//! #[derive(Default)]
//! struct Sum {
//!     data: Vec<u64>,
//! }
//!
//! impl Fixture for Sum {
//!     fn setup_with(&mut self, value: &dyn Any) {
//!         if let Some(&len) = value.downcast_ref::<usize>() {
//!             self.data = (0..len as u64).collect();
//!         }
//!     }
//!
//!     fn go(&mut self) {
//!         sink(self.data.iter().sum::<u64>());
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     let mut suite = Suite::new();
//!     suite
//!         .group("collections")
//!         .add_table("sum", Sum::default, [10usize, 100, 1000]);
//!     cyclebench::run_suite(suite)
//! }
//! ```

// Re-export core types
pub use cyclebench_core::{
    EmptyFixture, Fixture, FixtureFactory, FixtureHandle, FixtureRunner, HAS_CYCLE_COUNTER,
    Measurements, RunResult, RunTable, RunnerError, TimestampStrategy, ValueGenerator, ValueList,
    ValueSource, boxed_factory, cycles_per_microsecond, pin_to_cpu, sink,
};

// Re-export stats
pub use cyclebench_stats::{CycleStatistics, Percentiles, compute_cycle_stats};

// Re-export suite and CLI types
pub use cyclebench_cli::{
    Cli, CycleConfig, GroupBuilder, RegisteredBenchmark, Suite, SuiteConfig, SuiteError,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Fixture, Suite, ValueGenerator, sink};
    pub use std::any::Any;
}

/// Run the cyclebench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> std::process::ExitCode {
///     let suite = cyclebench::Suite::new();
///     cyclebench::run_suite(suite)
/// }
/// ```
pub use cyclebench_cli::{run_suite, run_suite_from};
