#![forbid(unsafe_code)]

//! Bindings from observables and bus channels to external sinks.
//!
//! A sink is anything with a single-argument setter: a UI property, a
//! recording cell in a test, or another observable. Binding returns the
//! [`Subscription`] that keeps the connection alive; store it in the owner's
//! [`SubscriptionSet`](super::SubscriptionSet) so the binding ends with the
//! owner.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::event_bus::Channel;
use super::observable::Observable;
use super::subscription::Subscription;

/// Receiver of bound values.
pub trait Sink<T> {
    fn set_property(&self, value: T);
}

impl<T, F: Fn(T)> Sink<T> for F {
    fn set_property(&self, value: T) {
        self(value);
    }
}

impl<T: Clone + 'static> Sink<T> for Observable<T> {
    fn set_property(&self, value: T) {
        self.set(value);
    }
}

/// Bind `source` to `sink`: the sink receives the current value now and
/// every later value.
pub fn bind<T, S>(source: &Observable<T>, sink: S) -> Subscription
where
    T: Clone + 'static,
    S: Sink<T> + 'static,
{
    source.subscribe(move |value| sink.set_property(value.clone()))
}

/// Like [`bind`], but holds the sink weakly. Once the sink is dropped the
/// binding does nothing.
pub fn bind_weak<T, S>(source: &Observable<T>, sink: &Rc<S>) -> Subscription
where
    T: Clone + 'static,
    S: Sink<T> + 'static,
{
    let weak = Rc::downgrade(sink);
    source.subscribe(move |value| {
        if let Some(sink) = weak.upgrade() {
            sink.set_property(value.clone());
        }
    })
}

/// Bind a bus channel to `sink`. Only payloads published after this call
/// reach the sink.
pub fn bind_channel<T, S>(channel: &Channel<T>, sink: S) -> Subscription
where
    T: Clone + 'static,
    S: Sink<T> + 'static,
{
    channel.subscribe(move |payload| sink.set_property(payload.clone()))
}

impl<T: Clone + 'static> Observable<T> {
    /// Method form of [`bind`].
    pub fn assign(&self, sink: impl Sink<T> + 'static) -> Subscription {
        bind(self, sink)
    }
}

/// A sink that records every value written to it.
///
/// Stands in for a UI property (a label's text, a button's enabled flag)
/// wherever the real widget is out of reach. Clones share the same record,
/// so one clone can be bound while another is inspected.
pub struct PropertyCell<T> {
    writes: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for PropertyCell<T> {
    fn clone(&self) -> Self {
        Self {
            writes: Rc::clone(&self.writes),
        }
    }
}

impl<T> Default for PropertyCell<T> {
    fn default() -> Self {
        Self {
            writes: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PropertyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCell")
            .field("writes", &self.writes.borrow())
            .finish()
    }
}

impl<T: Clone> PropertyCell<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.writes.borrow().last().cloned()
    }

    /// Every value written, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<T> {
        self.writes.borrow().clone()
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }
}

impl<T> Sink<T> for PropertyCell<T> {
    fn set_property(&self, value: T) {
        self.writes.borrow_mut().push(value);
    }
}
