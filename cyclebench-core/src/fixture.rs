//! Fixture Protocol
//!
//! A fixture is one instance of benchmarked logic. The runner drives it
//! through a fixed lifecycle:
//!
//! ```text
//! factory() → fixture_setup()
//!           → [ setup() | setup_with(value) → go() (timed) → teardown() ] × N
//!           → fixture_teardown()
//! ```
//!
//! Only `go()` sits inside the timed window.

use std::any::Any;

/// A benchmarked unit of work.
///
/// Only [`Fixture::go`] is required; every other hook defaults to a no-op.
pub trait Fixture {
    /// Called once after construction, before any repetition
    fn fixture_setup(&mut self) {}

    /// Called before each timed repetition in scalar mode
    fn setup(&mut self) {}

    /// Called before each timed repetition in table mode with the current value.
    ///
    /// Downcast with `value.downcast_ref::<T>()` using the element type that
    /// was registered.
    fn setup_with(&mut self, _value: &dyn Any) {}

    /// The operation being measured
    fn go(&mut self);

    /// Called after each timed repetition, including when `go()` panics
    fn teardown(&mut self) {}

    /// Called once before the fixture is dropped
    fn fixture_teardown(&mut self) {}
}

/// Force `value` to be materialized so the optimizer cannot discard the
/// computation that produced it.
#[inline(always)]
pub fn sink<T>(value: T) -> T {
    std::hint::black_box(value)
}

/// Fixture whose `go()` does nothing the optimizer can remove.
///
/// Used to measure the cost of the timing harness itself.
#[derive(Debug, Default)]
pub struct EmptyFixture {
    dummy: u32,
}

impl Fixture for EmptyFixture {
    #[inline(never)]
    fn go(&mut self) {
        sink(&mut self.dummy);
    }
}
