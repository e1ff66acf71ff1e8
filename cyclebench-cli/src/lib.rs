#![warn(missing_docs)]
//! cyclebench CLI Library
//!
//! This module provides the CLI infrastructure for benchmark binaries.
//! Build a [`Suite`] in your main function and hand it to `cyclebench::run_suite()`
//! (or `cyclebench_cli::run_suite()`) to get the full command line on top of it.
//!
//! # Example
//!
//! ```ignore
//! use cyclebench::prelude::*;
//!
//! #[derive(Default)]
//! struct Add { a: u64, b: u64 }
//!
//! impl Fixture for Add {
//!     fn go(&mut self) {
//!         sink(self.a + self.b);
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     let mut suite = Suite::new();
//!     suite.add("add", Add::default);
//!     cyclebench::run_suite(suite)
//! }
//! ```

mod config;
mod executor;
mod planner;
mod suite;

pub use config::*;
pub use executor::{
    BenchOutcome, BenchReport, Cycles, Executor, ReportEntry, SuiteReport, UNGROUPED_TITLE,
    build_report, format_entry, format_human_output, format_stats, group_header,
};
pub use planner::{ExecutionPlan, FilterSet, build_plan, filter_by_group, filter_by_name};
pub use suite::{GroupBuilder, RegisteredBenchmark, Suite, SuiteConfig, SuiteError};

use anyhow::Context;
use clap::Parser;
use cyclebench_core::TimestampStrategy;
use std::any::Any;
use std::ffi::OsString;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for failures other than argument parsing
const EXIT_FAILURE: u8 = 255;

/// Exit code for argument parsing failures
const EXIT_USAGE: u8 = 1;

/// cyclebench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "cyclebench")]
#[command(author, version, about = "cyclebench - cycle-accurate micro-benchmarks")]
pub struct Cli {
    /// Print progress notices and full statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// Core to pin the benchmark process to (default 0)
    #[arg(long, value_name = "CORE", allow_negative_numbers = true)]
    pub pincore: Option<i64>,

    /// Timed repetitions per benchmark (default 128)
    #[arg(short = 'n', long, value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..))]
    pub numruns: Option<u32>,

    /// Only run benchmarks whose name fully matches this regex (repeatable)
    #[arg(short = 'f', long = "filter", value_name = "REGEX")]
    pub filters: Vec<String>,

    /// Only run benchmarks whose group fully matches this regex (repeatable)
    #[arg(short = 'g', long = "group", value_name = "REGEX")]
    pub groups: Vec<String>,

    /// Use CPUID+RDTSC for the end timestamp instead of RDTSCP
    #[arg(long)]
    pub rdtsc: bool,

    /// Configuration file (default: discover cyclebench.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dry run - list selected benchmarks without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// Parse the process arguments and run `suite`.
///
/// This is the main entry point for benchmark binaries. It never panics:
/// fixture panics are caught here and reported like any other failure.
///
/// # Returns
/// `0` on success (including `--help` and `--version`), `1` when the
/// arguments cannot be parsed, `255` on any other failure.
pub fn run_suite(suite: Suite) -> ExitCode {
    run_suite_from(std::env::args_os(), suite)
}

/// Like [`run_suite`], with explicit arguments (the first one is the program name).
pub fn run_suite_from<I, T>(args: I, suite: Suite) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match catch_unwind(AssertUnwindSafe(|| run_with_cli(cli, suite))) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("Error - {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
        Err(panic) => {
            eprintln!("Error - {}", panic_message(panic.as_ref()));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Run `suite` with pre-parsed arguments.
pub fn run_with_cli(cli: Cli, mut suite: Suite) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    // Discover cyclebench.toml configuration (CLI flags override)
    let file_config = match &cli.config {
        Some(path) => CycleConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CycleConfig::discover().unwrap_or_default(),
    };

    let config = build_suite_config(&cli, &file_config);
    suite.configure(config).context("invalid configuration")?;

    if cli.dry_run {
        list_benchmarks(&suite)?;
        return Ok(());
    }

    suite.run()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "cyclebench=debug"
    } else {
        "cyclebench=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // A subscriber may already be installed when running more than once in a process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build a SuiteConfig by layering: built-in defaults → cyclebench.toml → CLI overrides.
fn build_suite_config(cli: &Cli, config: &CycleConfig) -> SuiteConfig {
    // Repeatable flags replace the file's lists instead of extending them
    let name_filters = if cli.filters.is_empty() {
        config.filter.names.clone()
    } else {
        cli.filters.clone()
    };
    let group_filters = if cli.groups.is_empty() {
        config.filter.groups.clone()
    } else {
        cli.groups.clone()
    };

    SuiteConfig {
        pincore: cli.pincore.unwrap_or(config.runner.pincore),
        numruns: cli.numruns.unwrap_or(config.runner.numruns),
        strategy: TimestampStrategy::resolve(cli.rdtsc || config.runner.rdtsc),
        name_filters,
        group_filters,
        verbose: cli.verbose || config.runner.verbose,
    }
}

fn list_benchmarks(suite: &Suite) -> anyhow::Result<()> {
    println!("cyclebench Plan:");

    let plan = suite.plan()?;

    let mut groups: std::collections::BTreeMap<&str, Vec<&str>> =
        std::collections::BTreeMap::new();
    for name in &plan.benchmarks {
        if let Some(bench) = suite.get(name) {
            groups.entry(bench.group.as_str()).or_default().push(*name);
        }
    }

    let mut total = 0;
    for (group, names) in &groups {
        let title = if group.is_empty() {
            UNGROUPED_TITLE
        } else {
            *group
        };
        println!("├── group: {}", title);
        for name in names {
            let values = suite
                .get(name)
                .and_then(|bench| bench.runner.values())
                .map(|values| format!(" [{} values]", values.size()))
                .unwrap_or_default();
            println!("│   ├── {}{}", name, values);
            total += 1;
        }
    }

    println!("{} benchmarks found.", total);
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
