//! Fixture Runner - Timed Repetitions
//!
//! Owns one benchmark's factory and drives its fixtures through the
//! lifecycle, keeping every bit of bookkeeping outside the timed window:
//!
//! ```text
//! setup()      factory → fixture_setup → 4 discarded timestamp reads
//! run(n)       [ setup | setup_with(v) → read_start → go → read_end → teardown ] × n
//! run_table(n) run(n) once per generator value, labelled
//! teardown()   fixture_teardown
//! ```
//!
//! Panics raised by fixture code are not caught here. Drop guards make sure
//! `teardown()` and `fixture_teardown()` still run while the panic unwinds.

use crate::fixture::{Fixture, sink};
use crate::generator::ValueGenerator;
use crate::measure::{EndRead, FallbackEnd, FastEnd, TimestampStrategy, read_start};
use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use thiserror::Error;

/// Cycle counts for one sweep of `n` repetitions
pub type RunResult = Vec<u64>;

/// Labelled cycle counts, one entry per table value in emission order
pub type RunTable = Vec<(String, RunResult)>;

/// Shared constructor for fresh fixture instances
pub type FixtureFactory = Rc<dyn Fn() -> Box<dyn Fixture>>;

/// Box a typed factory closure into a [`FixtureFactory`]
pub fn boxed_factory<F, X>(factory: F) -> FixtureFactory
where
    F: Fn() -> X + 'static,
    X: Fixture + 'static,
{
    Rc::new(move || Box::new(factory()) as Box<dyn Fixture>)
}

/// Errors raised by the runner itself (never by fixture code)
#[derive(Debug, Error)]
pub enum RunnerError {
    /// `run_table` called on a scalar runner
    #[error("benchmark was registered without table values")]
    NotTable,
}

/// Measurements produced by a full fixture lifecycle
#[derive(Debug, Clone)]
pub enum Measurements {
    /// Plain repetitions
    Scalar(RunResult),
    /// One sweep per table value
    Table(RunTable),
}

// ─── Fixture handle ──────────────────────────────────────────────────────────

/// A constructed fixture that has been through `fixture_setup()`.
///
/// Dropping the handle calls `fixture_teardown()`; so does
/// [`FixtureRunner::teardown`], which disarms the drop.
pub struct FixtureHandle {
    fixture: Box<dyn Fixture>,
    armed: bool,
}

impl FixtureHandle {
    fn finish(&mut self) {
        if self.armed {
            self.armed = false;
            self.fixture.fixture_teardown();
        }
    }
}

impl Deref for FixtureHandle {
    type Target = dyn Fixture;

    fn deref(&self) -> &Self::Target {
        self.fixture.as_ref()
    }
}

impl DerefMut for FixtureHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.fixture.as_mut()
    }
}

impl Drop for FixtureHandle {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Calls `teardown()` when the timed repetition ends, however it ends.
struct TeardownGuard<'a> {
    fixture: &'a mut dyn Fixture,
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        self.fixture.teardown();
    }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Executes timed repetitions for one registered benchmark.
#[derive(Clone)]
pub struct FixtureRunner {
    strategy: TimestampStrategy,
    factory: FixtureFactory,
    generator: Option<ValueGenerator>,
}

impl FixtureRunner {
    /// Scalar runner.
    ///
    /// A `Fast` strategy on a CPU without the fast read is stored as
    /// `Fallback`; the same holds for every constructor and setter.
    pub fn new(strategy: TimestampStrategy, factory: FixtureFactory) -> Self {
        Self {
            strategy: strategy.supported(),
            factory,
            generator: None,
        }
    }

    /// Table runner sweeping `values`
    pub fn with_values(
        strategy: TimestampStrategy,
        factory: FixtureFactory,
        values: ValueGenerator,
    ) -> Self {
        Self {
            strategy: strategy.supported(),
            factory,
            generator: Some(values),
        }
    }

    /// Timestamp strategy used for every measurement
    pub fn strategy(&self) -> TimestampStrategy {
        self.strategy
    }

    /// Replace the timestamp strategy
    pub fn set_strategy(&mut self, strategy: TimestampStrategy) {
        self.strategy = strategy.supported();
    }

    /// Whether this runner sweeps table values
    pub fn is_table(&self) -> bool {
        self.generator.is_some()
    }

    /// Table values, if any
    pub fn values(&self) -> Option<&ValueGenerator> {
        self.generator.as_ref()
    }

    /// Construct a fixture, run `fixture_setup()` and warm the timestamp path.
    ///
    /// The warm-up reads use the same strategy as the real measurements so
    /// the instructions they exercise are already decoded and predicted.
    pub fn setup(&self) -> FixtureHandle {
        let mut fixture = (self.factory)();
        fixture.fixture_setup();
        match self.strategy {
            TimestampStrategy::Fast => warm_up::<FastEnd>(),
            TimestampStrategy::Fallback => warm_up::<FallbackEnd>(),
        }
        FixtureHandle {
            fixture,
            armed: true,
        }
    }

    /// Run `fixture_teardown()` and release the fixture.
    pub fn teardown(&self, mut handle: FixtureHandle) {
        handle.finish();
    }

    /// Time `numruns` repetitions of `go()`.
    ///
    /// # Arguments
    /// * `numruns` - Number of timed repetitions
    /// * `fixture` - Fixture obtained from [`FixtureRunner::setup`]
    /// * `value` - Table value passed to `setup_with`; `None` calls `setup`
    ///
    /// # Returns
    /// Exactly `numruns` raw cycle counts, in repetition order
    pub fn run(
        &self,
        numruns: u32,
        fixture: &mut dyn Fixture,
        value: Option<&dyn Any>,
    ) -> RunResult {
        match self.strategy {
            TimestampStrategy::Fast => repeat::<FastEnd>(numruns, fixture, value),
            TimestampStrategy::Fallback => repeat::<FallbackEnd>(numruns, fixture, value),
        }
    }

    /// Time `numruns` repetitions at every table value.
    ///
    /// Sweeps a fresh copy of the generator, so calling this twice yields the
    /// same labels both times. Returns [`RunnerError::NotTable`] for scalar
    /// runners.
    pub fn run_table(
        &self,
        numruns: u32,
        fixture: &mut dyn Fixture,
    ) -> Result<RunTable, RunnerError> {
        let values = self.generator.clone().ok_or(RunnerError::NotTable)?;
        Ok(self.sweep(values, numruns, fixture))
    }

    /// Full lifecycle: setup, scalar or table run, teardown.
    pub fn measure(&self, numruns: u32) -> Measurements {
        let mut handle = self.setup();
        let measurements = match &self.generator {
            Some(values) => Measurements::Table(self.sweep(values.clone(), numruns, &mut *handle)),
            None => Measurements::Scalar(self.run(numruns, &mut *handle, None)),
        };
        self.teardown(handle);
        measurements
    }

    fn sweep(
        &self,
        mut values: ValueGenerator,
        numruns: u32,
        fixture: &mut dyn Fixture,
    ) -> RunTable {
        let mut table = Vec::with_capacity(values.size());
        while let Some(value) = values.next() {
            let label = values.to_string(&*value);
            let result = self.run(numruns, fixture, Some(&*value));
            table.push((label, result));
        }
        table
    }
}

impl fmt::Debug for FixtureRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureRunner")
            .field("strategy", &self.strategy)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

/// Discarded reads that prime the timestamp instructions
#[inline(never)]
fn warm_up<E: EndRead>() {
    sink(read_start());
    sink(E::read_end());
    sink(E::read_end());
    sink(E::read_end());
}

fn repeat<E: EndRead>(numruns: u32, fixture: &mut dyn Fixture, value: Option<&dyn Any>) -> RunResult {
    let mut res = Vec::with_capacity(numruns as usize);
    for _ in 0..numruns {
        res.push(time_once::<E>(fixture, value));
    }
    res
}

#[inline(always)]
fn time_once<E: EndRead>(fixture: &mut dyn Fixture, value: Option<&dyn Any>) -> u64 {
    match value {
        Some(v) => fixture.setup_with(v),
        None => fixture.setup(),
    }

    let guard = TeardownGuard { fixture };
    let start = read_start();
    guard.fixture.go();
    let end = E::read_end();
    drop(guard);

    end.wrapping_sub(start)
}
