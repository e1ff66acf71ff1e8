//! Report Building
//!
//! Turns raw execution outcomes into per-entry statistics.
//!
//! ## Pipeline
//!
//! ```text
//! BenchOutcome (raw cycles)
//!        │
//!        ▼
//!   ┌─────────────────────┐
//!   │ compute_cycle_stats │  subtract overhead, mean/std-dev/percentiles
//!   └──────────┬──────────┘
//!              │
//!              ▼
//!   ┌─────────────────────┐
//!   │     SuiteReport     │  one entry per scalar run or table value
//!   └─────────────────────┘
//! ```

use super::execution::BenchOutcome;
use cyclebench_core::Measurements;
use cyclebench_stats::{CycleStatistics, compute_cycle_stats};

/// Statistics for one scalar run or one table value
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// Table value label; `None` for scalar runs
    pub label: Option<String>,
    /// Summary of the adjusted samples; `None` when there were no samples
    pub stats: Option<CycleStatistics>,
}

/// All entries produced by one benchmark
#[derive(Debug, Clone)]
pub struct BenchReport {
    /// Registered name
    pub name: String,
    /// Group name; empty when ungrouped
    pub group: String,
    /// Entries in measurement order
    pub entries: Vec<ReportEntry>,
}

impl BenchReport {
    /// Title of an entry: `name(label)` for table values, `name` otherwise
    pub fn entry_title(&self, entry: &ReportEntry) -> String {
        match &entry.label {
            Some(label) => format!("{}({})", self.name, label),
            None => self.name.clone(),
        }
    }
}

/// Complete report of a suite run
#[derive(Debug, Clone)]
pub struct SuiteReport {
    /// Benchmarks in execution order
    pub benchmarks: Vec<BenchReport>,
}

/// Build a report from execution outcomes
///
/// # Arguments
/// * `outcomes` - Raw results in execution order
/// * `overhead` - Loop overhead to subtract from every sample
pub fn build_report(outcomes: &[BenchOutcome], overhead: u64) -> SuiteReport {
    let benchmarks = outcomes
        .iter()
        .map(|outcome| {
            let entries = match &outcome.measurements {
                Measurements::Scalar(samples) => vec![summarize(&outcome.name, None, samples, overhead)],
                Measurements::Table(table) => table
                    .iter()
                    .map(|(label, samples)| {
                        summarize(&outcome.name, Some(label.clone()), samples, overhead)
                    })
                    .collect(),
            };
            BenchReport {
                name: outcome.name.clone(),
                group: outcome.group.clone(),
                entries,
            }
        })
        .collect();

    SuiteReport { benchmarks }
}

fn summarize(name: &str, label: Option<String>, samples: &[u64], overhead: u64) -> ReportEntry {
    let stats = compute_cycle_stats(samples, overhead);
    if let Some(s) = stats.as_ref().filter(|s| s.has_negative_samples()) {
        tracing::warn!(
            "{}{}: {} of {} samples fell below the loop overhead ({} cycles)",
            name,
            label.as_deref().map(|l| format!("({l})")).unwrap_or_default(),
            s.negative_samples,
            s.sample_count,
            overhead
        );
    }
    ReportEntry { label, stats }
}
