#![warn(missing_docs)]
//! cyclebench Core - Measurement Runtime
//!
//! This crate provides the measurement side of cyclebench:
//! - Serialized cycle-counter reads (RDTSCP fast path, CPUID+RDTSC fallback)
//! - Cached wall-clock calibration of cycles per microsecond
//! - The `Fixture` lifecycle protocol implemented by benchmarks
//! - Type-erased value generators for table (parameter sweep) mode
//! - `FixtureRunner`, which times repetitions of a fixture
//! - CPU affinity pinning for stable counter readings

mod fixture;
mod generator;
mod measure;
mod runner;

pub use fixture::{EmptyFixture, Fixture, sink};
pub use generator::{ValueGenerator, ValueList, ValueSource};
pub use measure::{
    HAS_CYCLE_COUNTER, TimestampStrategy, cycles_per_microsecond, max_pinnable_cpus, pin_to_cpu,
    read_end, read_start, supports_fast_path,
};
pub use runner::{
    FixtureFactory, FixtureHandle, FixtureRunner, Measurements, RunResult, RunTable, RunnerError,
    boxed_factory,
};
