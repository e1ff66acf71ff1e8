//! Benchmark Suite
//!
//! The registry of named benchmarks plus the settings that drive a run.
//!
//! A [`Suite`] is built once by the benchmark binary, configured from the
//! command line (see [`crate::run_suite`]) and then run. Everything happens on
//! the calling thread: the process is pinned to one core, the loop overhead is
//! estimated with an empty fixture, the registry is filtered, and each
//! surviving benchmark is measured in name order.

use crate::config::DEFAULT_NUMRUNS;
use crate::executor::{Executor, build_report, format_human_output};
use crate::planner::{ExecutionPlan, FilterSet, build_plan};
use cyclebench_core::{
    EmptyFixture, Fixture, FixtureFactory, FixtureRunner, TimestampStrategy, ValueGenerator,
    boxed_factory, cycles_per_microsecond, max_pinnable_cpus, pin_to_cpu,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use thiserror::Error;

/// Measurements gathered by [`Suite::compute_overhead`], spread over repeated runs
const OVERHEAD_SAMPLE_BUDGET: u32 = 1_000_000;

/// Errors raised while configuring or running a suite
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Requested core is negative or outside what the affinity API can express
    #[error("unsupported core {core} (must be in 0..{limit})")]
    InvalidCore {
        /// Requested core
        core: i64,
        /// Exclusive upper bound
        limit: usize,
    },

    /// The OS refused to pin the process
    #[error("failed to pin to core {core}: {source}")]
    Affinity {
        /// Requested core
        core: usize,
        /// OS error
        source: std::io::Error,
    },

    /// A filter expression is not a valid regular expression
    #[error("error parsing filter spec '{spec}': {source}")]
    FilterSpec {
        /// Filter as given
        spec: String,
        /// Regex compile error
        source: regex::Error,
    },

    /// Repetition count of zero
    #[error("repetition count must be at least 1")]
    InvalidRepetitions,
}

/// Settings for a suite run
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Core to pin the process to; checked when pinning
    pub pincore: i64,
    /// Timed repetitions per benchmark (or per table value)
    pub numruns: u32,
    /// End-timestamp strategy for every runner
    pub strategy: TimestampStrategy,
    /// Name filters (full match, OR)
    pub name_filters: Vec<String>,
    /// Group filters (full match, OR)
    pub group_filters: Vec<String>,
    /// Print notices and full statistics
    pub verbose: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            pincore: 0,
            numruns: DEFAULT_NUMRUNS,
            strategy: TimestampStrategy::detect(),
            name_filters: Vec::new(),
            group_filters: Vec::new(),
            verbose: false,
        }
    }
}

impl SuiteConfig {
    /// Check values that can be checked without touching the OS.
    ///
    /// Filters are compiled here so a bad expression fails before any
    /// measurement starts.
    pub fn validate(&self) -> Result<(), SuiteError> {
        if self.numruns == 0 {
            return Err(SuiteError::InvalidRepetitions);
        }
        FilterSet::compile(&self.group_filters)?;
        FilterSet::compile(&self.name_filters)?;
        Ok(())
    }
}

/// A registered benchmark
#[derive(Debug, Clone)]
pub struct RegisteredBenchmark {
    /// Group name; empty when ungrouped
    pub group: String,
    /// Runner holding the fixture factory and optional value generator
    pub runner: FixtureRunner,
}

/// Registry of benchmarks and the configuration used to run them
#[derive(Debug, Default)]
pub struct Suite {
    benchmarks: BTreeMap<String, RegisteredBenchmark>,
    config: SuiteConfig,
}

impl Suite {
    /// Empty suite with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a validated configuration.
    ///
    /// Every registered runner adopts the configured strategy, so the
    /// overhead estimate and the benchmarks read the same counter sequence.
    /// A `Fast` request on a CPU without the fast read falls back.
    pub fn configure(&mut self, mut config: SuiteConfig) -> Result<(), SuiteError> {
        config.validate()?;
        let supported = config.strategy.supported();
        if supported != config.strategy {
            tracing::warn!(
                "{} is not available on this CPU, using {}",
                config.strategy.name(),
                supported.name()
            );
            config.strategy = supported;
        }
        for bench in self.benchmarks.values_mut() {
            bench.runner.set_strategy(config.strategy);
        }
        tracing::debug!(
            "Configured suite: numruns={} pincore={} strategy={}",
            config.numruns,
            config.pincore,
            config.strategy.name()
        );
        self.config = config;
        Ok(())
    }

    /// Current configuration
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Register a benchmark under `name`. A later registration with the same
    /// name replaces the earlier one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: FixtureFactory,
        group: impl Into<String>,
        values: Option<ValueGenerator>,
    ) {
        let name = name.into();
        let runner = match values {
            Some(values) => FixtureRunner::with_values(self.config.strategy, factory, values),
            None => FixtureRunner::new(self.config.strategy, factory),
        };
        let previous = self.benchmarks.insert(
            name.clone(),
            RegisteredBenchmark {
                group: group.into(),
                runner,
            },
        );
        if previous.is_some() {
            tracing::debug!("Replaced benchmark registration '{}'", name);
        }
    }

    /// Register an ungrouped scalar benchmark
    pub fn add<F, X>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> X + 'static,
        X: Fixture + 'static,
    {
        self.register(name, boxed_factory(factory), "", None);
        self
    }

    /// Register an ungrouped table benchmark swept over `values`
    pub fn add_table<F, X>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        values: impl Into<ValueGenerator>,
    ) -> &mut Self
    where
        F: Fn() -> X + 'static,
        X: Fixture + 'static,
    {
        self.register(name, boxed_factory(factory), "", Some(values.into()));
        self
    }

    /// Register benchmarks under `group`
    pub fn group(&mut self, group: impl Into<String>) -> GroupBuilder<'_> {
        GroupBuilder {
            suite: self,
            group: group.into(),
        }
    }

    /// Look up a registered benchmark
    pub fn get(&self, name: &str) -> Option<&RegisteredBenchmark> {
        self.benchmarks.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.benchmarks.keys().map(String::as_str)
    }

    /// Number of registered benchmarks
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.benchmarks
            .iter()
            .map(|(name, bench)| (name.as_str(), bench.group.as_str()))
    }

    // ─── Filtering ───────────────────────────────────────────────────────────

    /// Names of benchmarks whose group passes `exprs`
    pub fn filter_by_group(&self, exprs: &[String]) -> Result<BTreeSet<&str>, SuiteError> {
        let groups = FilterSet::compile(exprs)?;
        Ok(crate::planner::filter_by_group(self.entries(), &groups))
    }

    /// Subset of `candidates` whose name passes `exprs`
    pub fn filter_by_name<'a>(
        &self,
        candidates: BTreeSet<&'a str>,
        exprs: &[String],
    ) -> Result<BTreeSet<&'a str>, SuiteError> {
        let names = FilterSet::compile(exprs)?;
        Ok(crate::planner::filter_by_name(candidates, &names))
    }

    /// Benchmarks selected by the configured filters, sorted by name
    pub fn plan(&self) -> Result<ExecutionPlan<'_>, SuiteError> {
        let groups = FilterSet::compile(&self.config.group_filters)?;
        let names = FilterSet::compile(&self.config.name_filters)?;
        Ok(build_plan(self.entries(), &groups, &names))
    }

    // ─── Running ─────────────────────────────────────────────────────────────

    /// Estimate the cost of the measurement loop itself.
    ///
    /// Runs the empty fixture through its full lifecycle repeatedly, about a
    /// million timed repetitions in total, and keeps the single smallest
    /// reading.
    pub fn compute_overhead(&self) -> u64 {
        let numruns = self.config.numruns.max(1);
        let iterations = (OVERHEAD_SAMPLE_BUDGET / numruns).max(1);
        let runner = FixtureRunner::new(self.config.strategy, boxed_factory(EmptyFixture::default));

        let mut overhead = u64::MAX;
        for _ in 0..iterations {
            let mut handle = runner.setup();
            let samples = runner.run(numruns, &mut *handle, None);
            runner.teardown(handle);
            overhead = samples.into_iter().fold(overhead, u64::min);
        }

        tracing::debug!(
            "Loop overhead {} cycles over {} iterations of {} runs",
            overhead,
            iterations,
            numruns
        );
        overhead
    }

    /// Pin the process to the configured core
    pub fn set_affinity(&self) -> Result<(), SuiteError> {
        let limit = max_pinnable_cpus();
        let core = usize::try_from(self.config.pincore)
            .ok()
            .filter(|&core| core < limit)
            .ok_or(SuiteError::InvalidCore {
                core: self.config.pincore,
                limit,
            })?;
        pin_to_cpu(core).map_err(|source| SuiteError::Affinity { core, source })?;
        tracing::debug!("Pinned to core {}", core);
        Ok(())
    }

    /// Pin, measure and print the report to stdout.
    pub fn run(&self) -> Result<(), SuiteError> {
        if self.config.verbose {
            println!("Iterations: {}", self.config.numruns);
            println!(
                "Using rdtsc: {}",
                if self.config.strategy == TimestampStrategy::Fallback {
                    "yes"
                } else {
                    "no"
                }
            );
        }

        self.set_affinity()?;
        if self.config.verbose {
            println!("Pinning to core: {}", self.config.pincore);
        }

        match self.execute()? {
            Some(output) => print!("{}", output),
            None => println!("No benchmarks matched filter specs"),
        }
        Ok(())
    }

    /// Everything [`Suite::run`] does after pinning.
    ///
    /// Returns the formatted report, or `None` when no benchmark survived
    /// filtering.
    pub fn execute(&self) -> Result<Option<String>, SuiteError> {
        let verbose = self.config.verbose;

        if verbose {
            print!("Computing loop overhead...");
            std::io::stdout().flush().ok();
        }
        let overhead = self.compute_overhead();
        if verbose {
            println!("Done. {}clk", overhead);
        }

        let plan = self.plan()?;
        if plan.is_empty() {
            return Ok(None);
        }

        let benchmarks: Vec<(&str, &RegisteredBenchmark)> = plan
            .benchmarks
            .iter()
            .filter_map(|name| self.benchmarks.get(*name).map(|bench| (*name, bench)))
            .collect();

        let outcomes = Executor::new(self.config.numruns).execute(&benchmarks);
        let report = build_report(&outcomes, overhead);
        Ok(Some(format_human_output(
            &report,
            verbose,
            cycles_per_microsecond(),
        )))
    }
}

/// Registers benchmarks into one group of a [`Suite`]
pub struct GroupBuilder<'a> {
    suite: &'a mut Suite,
    group: String,
}

impl GroupBuilder<'_> {
    /// Register a scalar benchmark in this group
    pub fn add<F, X>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> X + 'static,
        X: Fixture + 'static,
    {
        self.suite
            .register(name, boxed_factory(factory), self.group.clone(), None);
        self
    }

    /// Register a table benchmark in this group
    pub fn add_table<F, X>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        values: impl Into<ValueGenerator>,
    ) -> &mut Self
    where
        F: Fn() -> X + 'static,
        X: Fixture + 'static,
    {
        self.suite.register(
            name,
            boxed_factory(factory),
            self.group.clone(),
            Some(values.into()),
        );
        self
    }
}
