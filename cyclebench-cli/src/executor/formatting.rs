//! Output Formatting
//!
//! Human-readable output formatting for benchmark reports.
//!
//! Generates terminal-friendly output with:
//! - One section per group under a `========== <group> ==========` header,
//!   ungrouped benchmarks first
//! - Cycle counts rendered as microseconds plus raw clocks
//! - A terse one-line summary, or a full block with percentiles when verbose

use super::report::{BenchReport, ReportEntry, SuiteReport};
use cyclebench_stats::CycleStatistics;
use std::collections::BTreeMap;
use std::fmt;

/// Header title used for benchmarks registered without a group
pub const UNGROUPED_TITLE: &str = "Ungrouped";

const INDENT: &str = "        ";

/// A cycle count shown both in microseconds and clocks
#[derive(Debug, Clone, Copy)]
pub struct Cycles {
    clocks: f64,
    cycles_per_us: u64,
}

impl Cycles {
    /// Wrap `clocks` for display using the given calibration
    pub fn new(clocks: impl Into<f64>, cycles_per_us: u64) -> Self {
        Self {
            clocks: clocks.into(),
            cycles_per_us: cycles_per_us.max(1),
        }
    }
}

impl fmt::Display for Cycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}us ({:.0}clk)",
            self.clocks / self.cycles_per_us as f64,
            // Whole clocks are truncated; `+ 0.0` folds -0 into 0
            self.clocks.trunc() + 0.0
        )
    }
}

/// Header line for a group
pub fn group_header(group: &str) -> String {
    let title = if group.is_empty() {
        UNGROUPED_TITLE
    } else {
        group
    };
    format!("========== {} ==========", title)
}

/// Format statistics after an entry title
pub fn format_stats(stats: &CycleStatistics, verbose: bool, cycles_per_us: u64) -> String {
    let c = |clocks: f64| Cycles::new(clocks, cycles_per_us);
    let mut output = String::new();

    if verbose {
        let lines = [
            ("      min: ", c(stats.min as f64)),
            ("      avg: ", c(stats.mean)),
            ("  std_dev: ", c(stats.std_dev)),
            ("     % 75: ", c(stats.percentiles.p75 as f64)),
            ("     % 90: ", c(stats.percentiles.p90 as f64)),
            ("     % 99: ", c(stats.percentiles.p99 as f64)),
            ("      max: ", c(stats.max as f64)),
        ];
        for (label, value) in lines {
            output.push_str(&format!("\n{}{}{}", INDENT, label, value));
        }
        if stats.has_negative_samples() {
            output.push_str(&format!(
                "\n{}    below: {} of {} samples under overhead",
                INDENT, stats.negative_samples, stats.sample_count
            ));
        }
    } else {
        output.push_str(&format!(
            ", avg={} +/- {}, range=[{}, {}]",
            c(stats.mean),
            c(stats.std_dev),
            c(stats.min as f64),
            c(stats.max as f64)
        ));
        if stats.has_negative_samples() {
            output.push_str(&format!(" ({} below overhead)", stats.negative_samples));
        }
    }

    output
}

/// Format one entry: its title, then its statistics
pub fn format_entry(
    bench: &BenchReport,
    entry: &ReportEntry,
    verbose: bool,
    cycles_per_us: u64,
) -> String {
    let mut output = bench.entry_title(entry);
    match &entry.stats {
        Some(stats) => output.push_str(&format_stats(stats, verbose, cycles_per_us)),
        None => output.push_str(", no samples"),
    }
    output
}

/// Format a report for human-readable terminal display
///
/// # Arguments
/// * `report` - Complete suite report
/// * `verbose` - Full statistics block instead of the one-line summary
/// * `cycles_per_us` - Calibration used to convert clocks to microseconds
///
/// # Returns
/// Formatted string suitable for terminal output
pub fn format_human_output(report: &SuiteReport, verbose: bool, cycles_per_us: u64) -> String {
    let mut output = String::new();

    // Group results; the empty (ungrouped) key sorts first
    let mut groups: BTreeMap<&str, Vec<&BenchReport>> = BTreeMap::new();
    for bench in &report.benchmarks {
        groups.entry(&bench.group).or_default().push(bench);
    }

    for (group, benches) in groups {
        output.push_str(&group_header(group));
        output.push('\n');

        for bench in benches {
            for entry in &bench.entries {
                output.push_str(&format_entry(bench, entry, verbose, cycles_per_us));
                output.push('\n');
            }
        }
    }

    output
}
