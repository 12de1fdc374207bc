#![forbid(unsafe_code)]

//! Finite, cold publishers: [`just`] and [`from_iter`].
//!
//! A [`Sequence`] delivers its values to each sink synchronously and then
//! signals completion. Every call to [`Sequence::sink`] starts over from the
//! first value.

/// What a sequence sink observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T> {
    Value(T),
    Completed,
}

/// A finite list of values replayed to each sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<T> {
    values: Vec<T>,
}

/// A sequence of exactly one value.
pub fn just<T>(value: T) -> Sequence<T> {
    Sequence {
        values: vec![value],
    }
}

/// A sequence of every item of `values`, in order.
pub fn from_iter<I: IntoIterator>(values: I) -> Sequence<I::Item> {
    Sequence {
        values: values.into_iter().collect(),
    }
}

impl<T: Clone> Sequence<T> {
    /// Deliver each value to `on_value`, then call `on_complete`. Returns the
    /// number of values delivered.
    pub fn sink(&self, mut on_value: impl FnMut(T), on_complete: impl FnOnce()) -> usize {
        for value in &self.values {
            on_value(value.clone());
        }
        on_complete();
        self.values.len()
    }

    /// Deliver values and completion through one callback.
    pub fn sink_events(&self, mut on_event: impl FnMut(Event<T>)) -> usize {
        let delivered = self.sink(|v| on_event(Event::Value(v)), || {});
        on_event(Event::Completed);
        delivered
    }

    /// Transform every value.
    #[must_use]
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Sequence<U> {
        Sequence {
            values: self.values.iter().map(f).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
