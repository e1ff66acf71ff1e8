//! Benchmark Executor
//!
//! Runs benchmarks and turns their raw cycle counts into printed reports.
//!
//! ## Pipeline Overview
//!
//! ```text
//! RegisteredBenchmark (from Suite)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Run fixtures, collect raw cycles
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Subtract overhead, compute statistics
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Sequential benchmark execution with progress display
//! - [`report`] - Per-entry statistics
//! - [`formatting`] - Human-readable output formatting

mod execution;
mod formatting;
mod report;

// Re-export public API
pub use execution::{BenchOutcome, Executor};
pub use formatting::{
    Cycles, UNGROUPED_TITLE, format_entry, format_human_output, format_stats, group_header,
};
pub use report::{BenchReport, ReportEntry, SuiteReport, build_report};
