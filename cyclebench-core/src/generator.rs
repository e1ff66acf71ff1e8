//! Value Generators for Table Mode
//!
//! A table benchmark runs once per value of an ordered, finite set. The
//! runner only sees values through the type-erased [`ValueSource`] trait;
//! [`ValueList`] is the typed model behind it and [`ValueGenerator`] is the
//! cloneable handle the runner owns.
//!
//! Sequences are one-shot: once `next()` returns `None` the cursor never
//! rewinds. Cloning copies the cursor, so a clone and its original advance
//! independently.

use std::any::Any;
use std::fmt::{self, Display};

/// Type-erased sequence of table values
pub trait ValueSource {
    /// Total number of values in the sequence
    fn size(&self) -> usize;

    /// Next value, or `None` once the sequence is exhausted
    fn next(&mut self) -> Option<Box<dyn Any>>;

    /// Render a value produced by this source.
    ///
    /// # Panics
    ///
    /// Panics if `value` was not produced by a source of the same element type.
    fn to_string(&self, value: &dyn Any) -> String;

    /// Deep copy, including the cursor position
    fn clone_box(&self) -> Box<dyn ValueSource>;
}

/// Typed model: an ordered list of values plus a cursor.
#[derive(Debug, Clone)]
pub struct ValueList<T> {
    data: Vec<T>,
    cursor: usize,
}

impl<T> ValueList<T> {
    /// Create a list positioned at its first element
    pub fn new(data: Vec<T>) -> Self {
        Self { data, cursor: 0 }
    }
}

impl<T> ValueSource for ValueList<T>
where
    T: Display + Clone + 'static,
{
    fn size(&self) -> usize {
        self.data.len()
    }

    fn next(&mut self) -> Option<Box<dyn Any>> {
        let value = self.data.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(Box::new(value))
    }

    fn to_string(&self, value: &dyn Any) -> String {
        match value.downcast_ref::<T>() {
            Some(v) => v.to_string(),
            None => panic!(
                "table value is not a {}; values must come from the same generator",
                std::any::type_name::<T>()
            ),
        }
    }

    fn clone_box(&self) -> Box<dyn ValueSource> {
        Box::new(self.clone())
    }
}

/// Cloneable handle around a type-erased value source
pub struct ValueGenerator {
    source: Box<dyn ValueSource>,
}

impl ValueGenerator {
    /// Wrap an arbitrary value source
    pub fn new(source: Box<dyn ValueSource>) -> Self {
        Self { source }
    }

    /// Build a generator from an ordered collection of values
    pub fn from_values<T, I>(values: I) -> Self
    where
        T: Display + Clone + 'static,
        I: IntoIterator<Item = T>,
    {
        Self::new(Box::new(ValueList::new(values.into_iter().collect())))
    }

    /// Total number of values
    pub fn size(&self) -> usize {
        self.source.size()
    }

    /// Next value, or `None` once exhausted
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Box<dyn Any>> {
        self.source.next()
    }

    /// Render a value produced by this generator
    pub fn to_string(&self, value: &dyn Any) -> String {
        self.source.to_string(value)
    }
}

impl Clone for ValueGenerator {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone_box(),
        }
    }
}

impl fmt::Debug for ValueGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueGenerator")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl<T> From<Vec<T>> for ValueGenerator
where
    T: Display + Clone + 'static,
{
    fn from(values: Vec<T>) -> Self {
        Self::from_values(values)
    }
}

impl<T, const N: usize> From<[T; N]> for ValueGenerator
where
    T: Display + Clone + 'static,
{
    fn from(values: [T; N]) -> Self {
        Self::from_values(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(generator: &mut ValueGenerator) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(v) = generator.next() {
            out.push(generator.to_string(&*v));
        }
        out
    }

    #[test]
    fn test_emits_in_order() {
        let mut values = ValueGenerator::from([10, 100, 1000]);
        assert_eq!(values.size(), 3);
        assert_eq!(labels(&mut values), vec!["10", "100", "1000"]);
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let mut values = ValueGenerator::from(vec!["a", "b"]);
        for _ in 0..values.size() {
            assert!(values.next().is_some());
        }
        assert!(values.next().is_none());
        assert!(values.next().is_none());
        assert_eq!(values.size(), 2);
    }

    #[test]
    fn test_clone_has_independent_cursor() {
        let mut original = ValueGenerator::from([1u32, 2, 3]);
        original.next();
        let mut copy = original.clone();

        while original.next().is_some() {}
        assert!(original.next().is_none());

        assert_eq!(labels(&mut copy), vec!["2", "3"]);
    }

    #[test]
    fn test_values_downcast_to_element_type() {
        let mut values = ValueGenerator::from([7usize]);
        let v = values.next().unwrap();
        assert_eq!(v.downcast_ref::<usize>(), Some(&7));
    }

    #[test]
    #[should_panic(expected = "table value is not a")]
    fn test_to_string_rejects_foreign_value() {
        let values = ValueGenerator::from([1i32]);
        values.to_string(&"not an i32");
    }

    #[test]
    fn test_empty_generator() {
        let mut values = ValueGenerator::from(Vec::<u8>::new());
        assert_eq!(values.size(), 0);
        assert!(values.next().is_none());
    }
}
