#![warn(missing_docs)]
//! cyclebench Statistical Engine
//!
//! Raw-cycle summary statistics for benchmark runs:
//! - Loop-overhead subtraction (unclamped; negative samples are reported)
//! - Mean and population standard deviation
//! - Min, max and index-based percentiles (p75, p90, p99)

mod percentiles;
mod summary;

pub use percentiles::{Percentiles, compute_percentiles, percentile_at, percentile_index};
pub use summary::{CycleStatistics, adjust_for_overhead, compute_cycle_stats};

