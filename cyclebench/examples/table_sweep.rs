//! cyclebench Example Benchmarks
//!
//! This example demonstrates cyclebench features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --release --example table_sweep                      # Run all benchmarks
//!   cargo run --release --example table_sweep -- --help            # Show all options
//!   cargo run --release --example table_sweep -- --dry-run         # List benchmarks
//!   cargo run --release --example table_sweep -- -g sorting -v     # Only the sorting group, full stats
//!   cargo run --release --example table_sweep -- -f 'sum.*' -n 1000

use cyclebench::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::process::ExitCode;

// ============================================================================
// Scalar Benchmarks
// ============================================================================

/// Simple arithmetic
#[derive(Default)]
struct Addition {
    x: u64,
    y: u64,
}

impl Fixture for Addition {
    fn fixture_setup(&mut self) {
        self.x = 42;
        self.y = 17;
    }

    fn go(&mut self) {
        sink(sink(self.x) + sink(self.y));
    }
}

/// Fresh allocation on every repetition, freed outside the timed window
#[derive(Default)]
struct Allocate {
    buffer: Option<Vec<u8>>,
}

impl Fixture for Allocate {
    fn go(&mut self) {
        self.buffer = Some(sink(vec![0u8; 256]));
    }

    fn teardown(&mut self) {
        self.buffer = None;
    }
}

// ============================================================================
// Table Benchmarks
// ============================================================================

/// Sum of the first `len` integers
#[derive(Default)]
struct Sum {
    data: Vec<u64>,
}

impl Fixture for Sum {
    fn setup_with(&mut self, value: &dyn Any) {
        if let Some(&len) = value.downcast_ref::<usize>() {
            if self.data.len() != len {
                self.data = (0..len as u64).collect();
            }
        }
    }

    fn go(&mut self) {
        sink(self.data.iter().sum::<u64>());
    }
}

/// Sort a freshly shuffled vector of `len` elements
struct Sort {
    rng: StdRng,
    data: Vec<u32>,
}

impl Sort {
    fn new() -> Self {
        Self {
            rng: StdRng::seed_from_u64(0x5eed),
            data: Vec::new(),
        }
    }
}

impl Fixture for Sort {
    fn setup_with(&mut self, value: &dyn Any) {
        let len = value.downcast_ref::<usize>().copied().unwrap_or_default();
        let rng = &mut self.rng;
        self.data.clear();
        self.data.extend((0..len).map(|_| rng.r#gen::<u32>()));
    }

    fn go(&mut self) {
        self.data.sort_unstable();
        sink(&self.data);
    }
}

fn main() -> ExitCode {
    let mut suite = Suite::new();

    suite.add("addition", Addition::default);

    suite.group("memory").add("allocate", Allocate::default);

    suite
        .group("collections")
        .add_table("sum", Sum::default, [10usize, 100, 1000]);

    suite
        .group("sorting")
        .add_table("sort", Sort::new, [10usize, 100, 1000])
        .add_table("sort_large", Sort::new, vec![10_000usize]);

    cyclebench::run_suite(suite)
}
