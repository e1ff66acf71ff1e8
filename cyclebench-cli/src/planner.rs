//! Benchmark Planner
//!
//! Builds the execution plan by filtering registered benchmarks in two
//! stages:
//!
//! 1. Group stage: keep benchmarks whose group fully matches any group filter.
//! 2. Name stage: of the survivors, keep those whose name fully matches any
//!    name filter.
//!
//! An empty filter list keeps everything at that stage. An empty group (or
//! name) always passes its stage, so ungrouped benchmarks are never removed
//! by group filters.
//!
//! Ordering: benchmarks are sorted alphabetically by name.

use crate::suite::SuiteError;
use regex::Regex;
use std::collections::BTreeSet;

/// Compiled list of anchored regular expressions (OR semantics)
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    patterns: Vec<Regex>,
}

impl FilterSet {
    /// Compile filter specs; each must match the whole candidate.
    pub fn compile(specs: &[String]) -> Result<Self, SuiteError> {
        let patterns = specs
            .iter()
            .map(|spec| {
                // Compile unanchored first so errors quote the expression as typed
                Regex::new(spec)
                    .and_then(|_| Regex::new(&format!("^(?:{spec})$")))
                    .map_err(|source| SuiteError::FilterSpec {
                        spec: spec.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether no filter was given
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `candidate` passes this stage
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.is_empty() || self.is_empty() || self.patterns.iter().any(|re| re.is_match(candidate))
    }
}

/// Execution plan for benchmarks
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan<'a> {
    /// Names of benchmarks to run, sorted
    pub benchmarks: Vec<&'a str>,
}

impl ExecutionPlan<'_> {
    /// Whether nothing survived filtering
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

/// Group stage: names of benchmarks whose group passes `groups`.
///
/// `benchmarks` yields `(name, group)` pairs.
pub fn filter_by_group<'a>(
    benchmarks: impl IntoIterator<Item = (&'a str, &'a str)>,
    groups: &FilterSet,
) -> BTreeSet<&'a str> {
    benchmarks
        .into_iter()
        .filter(|(_, group)| groups.matches(group))
        .map(|(name, _)| name)
        .collect()
}

/// Name stage: the subset of `candidates` whose name passes `names`.
pub fn filter_by_name<'a>(candidates: BTreeSet<&'a str>, names: &FilterSet) -> BTreeSet<&'a str> {
    candidates
        .into_iter()
        .filter(|name| names.matches(name))
        .collect()
}

/// Build the execution plan: group stage, then name stage.
pub fn build_plan<'a>(
    benchmarks: impl IntoIterator<Item = (&'a str, &'a str)>,
    groups: &FilterSet,
    names: &FilterSet,
) -> ExecutionPlan<'a> {
    let survivors = filter_by_name(filter_by_group(benchmarks, groups), names);

    // BTreeSet iteration is already sorted alphabetically
    ExecutionPlan {
        benchmarks: survivors.into_iter().collect(),
    }
}
