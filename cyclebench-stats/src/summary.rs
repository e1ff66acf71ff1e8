//! Cycle Statistics
//!
//! Summary statistics over raw cycle counts after loop-overhead subtraction.
//!
//! Overhead is subtracted from every sample without clamping. When the
//! overhead estimate exceeds a sample the adjusted value goes negative; that
//! is reported (see [`CycleStatistics::negative_samples`]), not hidden.
//! Standard deviation is the population form (divide by `n`).

use crate::percentiles::{Percentiles, compute_percentiles};

/// Summary of one run of adjusted cycle counts
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStatistics {
    /// Smallest adjusted sample
    pub min: i64,
    /// Largest adjusted sample
    pub max: i64,
    /// Arithmetic mean of adjusted samples
    pub mean: f64,
    /// Population standard deviation of adjusted samples
    pub std_dev: f64,
    /// Percentiles of adjusted samples
    pub percentiles: Percentiles,
    /// Number of samples
    pub sample_count: usize,
    /// Overhead that was subtracted from every sample
    pub overhead: u64,
    /// Samples that fell below zero after subtraction
    pub negative_samples: usize,
}

/// Subtract `overhead` from every raw sample
pub fn adjust_for_overhead(raw: &[u64], overhead: u64) -> Vec<i64> {
    let overhead = overhead as i64;
    raw.iter()
        .map(|&cycles| (cycles as i64).saturating_sub(overhead))
        .collect()
}

/// Compute summary statistics for a run.
///
/// # Arguments
/// * `raw` - Raw cycle counts, one per repetition
/// * `overhead` - Loop overhead to subtract from each sample
///
/// # Returns
/// `None` when `raw` is empty
pub fn compute_cycle_stats(raw: &[u64], overhead: u64) -> Option<CycleStatistics> {
    if raw.is_empty() {
        return None;
    }

    let adjusted = adjust_for_overhead(raw, overhead);
    let n = adjusted.len() as f64;

    let total: i128 = adjusted.iter().map(|&c| c as i128).sum();
    let mean = total as f64 / n;

    let variance = adjusted
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();

    let negative_samples = adjusted.iter().filter(|&&c| c < 0).count();

    let mut sorted = adjusted;
    sorted.sort_unstable();
    let percentiles = compute_percentiles(&sorted)?;

    Some(CycleStatistics {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        std_dev,
        percentiles,
        sample_count: sorted.len(),
        overhead,
        negative_samples,
    })
}

impl CycleStatistics {
    /// Whether the overhead estimate exceeded at least one sample
    pub fn has_negative_samples(&self) -> bool {
        self.negative_samples > 0
    }
}
