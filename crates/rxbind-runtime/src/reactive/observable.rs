#![forbid(unsafe_code)]

//! Observable value with replay-on-subscribe and ordered change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Every `set` notifies all live subscribers in
//! registration order, even when the new value equals the old one; compose
//! [`Observable::remove_duplicates`] on top when equal values should be
//! dropped.
//!
//! New subscribers are called once with the current value as part of
//! `subscribe`, then with every later change.
//!
//! # Performance
//!
//! | Operation     | Complexity                  |
//! |---------------|-----------------------------|
//! | `get()`       | O(1) + clone                |
//! | `set()`       | O(S) where S = subscribers  |
//! | `subscribe()` | O(1) amortized              |
//!
//! # Failure Modes
//!
//! - **Panicking subscriber**: the panic unwinds out of `set`; subscribers
//!   after it in the order are not called for that change.
//! - **Re-entrant set**: allowed. No borrow is held while callbacks run, so a
//!   callback may call `set` on the same observable. The nested change is
//!   dispatched to everyone before the outer dispatch resumes with the value
//!   it started with.
//! - **Reference cycles**: a callback that captures a strong handle to the
//!   observable it is registered on keeps it alive. Capture a
//!   [`WeakObservable`] instead.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::subscribers::{Callback, Entry, SubscriberList};
use super::subscription::Subscription;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: SubscriberList<T>,
    /// Registrations feeding a derived observable from its source.
    upstream: Vec<Subscription>,
    /// Strong handles keeping the sources of a derived observable alive.
    sources: Vec<Box<dyn Any>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each `set`/`update`.
/// 2. Subscribers are notified in registration order.
/// 3. Each subscriber live when a dispatch starts is called at most once for
///    that change; subscribers added during the dispatch are not called for it.
/// 4. A disposed subscriber is never called again.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.live_count())
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: SubscriberList::new(),
                upstream: Vec::new(),
                sources: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls `set`/`update` on the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value and notify every live subscriber.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Modify the value in place, then notify as [`set`](Self::set) does.
    ///
    /// # Panics
    ///
    /// Panics if `f` touches the same observable.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut inner = self.inner.borrow_mut();
            f(&mut inner.value);
            inner.version += 1;
        }
        self.notify();
    }

    /// Subscribe to the current value and all future changes.
    ///
    /// The callback runs once before this returns, with the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let (entry, subscription) = self.register(Box::new(callback));
        let value = self.get();
        entry.call(&value);
        subscription
    }

    /// Subscribe to future changes only, without the initial replay.
    pub fn subscribe_changes(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.register(Box::new(callback)).1
    }

    /// Number of `set`/`update` calls so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    /// A non-owning handle, for callbacks that must not keep this alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Tie an upstream registration (and the source it came from) to this
    /// observable's lifetime.
    pub(crate) fn retain_upstream<S: 'static>(&self, source: &Observable<S>, sub: Subscription) {
        let mut inner = self.inner.borrow_mut();
        inner.upstream.push(sub);
        inner.sources.push(Box::new(source.clone()));
    }

    /// Tie a cleanup guard to this observable's lifetime.
    pub(crate) fn retain_guard(&self, guard: Subscription) {
        self.inner.borrow_mut().upstream.push(guard);
    }

    fn register(&self, callback: Callback<T>) -> (Rc<Entry<T>>, Subscription) {
        let entry = self.inner.borrow_mut().subscribers.insert(callback);
        let id = entry.id();
        debug!(subscription = id, "observable subscribe");

        let owner = Rc::downgrade(&self.inner);
        let weak_entry = Rc::downgrade(&entry);
        let subscription = Subscription::new(id, move || {
            if let Some(entry) = weak_entry.upgrade() {
                entry.revoke();
            }
            // If the owner is mid-`update`, the revoked entry is pruned on the
            // next dispatch instead.
            if let Some(owner) = owner.upgrade()
                && let Ok(mut inner) = owner.try_borrow_mut()
            {
                inner.subscribers.remove(id);
            }
        });
        (entry, subscription)
    }

    fn notify(&self) {
        let (entries, value) = {
            let mut inner = self.inner.borrow_mut();
            (inner.subscribers.snapshot(), inner.value.clone())
        };
        trace!(subscribers = entries.len(), "observable dispatch");
        for entry in &entries {
            entry.call(&value);
        }
    }
}

/// Non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakObservable<T> {
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_value_still_notifies() {
        let obs = Observable::new(42);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        obs.set(42);
        obs.set(42);
        assert_eq!(count.get(), 3); // replay + two sets
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn with_access() {
        let obs = Observable::new(vec![1, 2, 3]);
        let sum = obs.with(|v| v.iter().sum::<i32>());
        assert_eq!(sum, 6);
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec![1, 2, 3]);
        let last_len = Rc::new(Cell::new(0usize));
        let last_clone = Rc::clone(&last_len);
        let _sub = obs.subscribe(move |v: &Vec<i32>| last_clone.set(v.len()));
        assert_eq!(last_len.get(), 3);

        obs.update(|v| v.push(4));
        assert_eq!(obs.get(), vec![1, 2, 3, 4]);
        assert_eq!(obs.version(), 1);
        assert_eq!(last_len.get(), 4);
    }

    #[test]
    fn subscribe_replays_current_value() {
        let obs = Observable::new(7);
        obs.set(8);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| seen_clone.borrow_mut().push(*v));
        assert_eq!(*seen.borrow(), vec![8]);

        obs.set(9);
        assert_eq!(*seen.borrow(), vec![8, 9]);
    }

    #[test]
    fn subscribe_changes_skips_replay() {
        let obs = Observable::new(7);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = obs.subscribe_changes(move |v| seen_clone.borrow_mut().push(*v));
        assert!(seen.borrow().is_empty());

        obs.set(1);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = obs.subscribe_changes(move |_val| {
            count_clone.set(count_clone.get() + 1);
        });

        obs.set(1);
        assert_eq!(count.get(), 1);

        drop(sub);

        obs.set(2);
        assert_eq!(count.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn double_dispose_is_noop() {
        let obs = Observable::new(0);
        let mut a = obs.subscribe(|_| {});
        let _b = obs.subscribe(|_| {});
        a.dispose();
        a.dispose();
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _s1 = obs.subscribe_changes(move |_| log1.borrow_mut().push('A'));

        let log2 = Rc::clone(&log);
        let _s2 = obs.subscribe_changes(move |_| log2.borrow_mut().push('B'));

        let log3 = Rc::clone(&log);
        let _s3 = obs.subscribe_changes(move |_| log3.borrow_mut().push('C'));

        obs.set(1);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn subscriber_added_during_dispatch_waits_for_next_change() {
        let obs = Observable::new(0);
        let late_calls = Rc::new(RefCell::new(Vec::new()));
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let obs_weak = obs.downgrade();
        let late_clone = Rc::clone(&late_calls);
        let held_clone = Rc::clone(&held);
        let _adder = obs.subscribe_changes(move |_| {
            if !held_clone.borrow().is_empty() {
                return;
            }
            let Some(obs) = obs_weak.upgrade() else { return };
            let late = Rc::clone(&late_clone);
            let sub = obs.subscribe_changes(move |v| late.borrow_mut().push(*v));
            held_clone.borrow_mut().push(sub);
        });

        obs.set(1);
        assert!(late_calls.borrow().is_empty());

        obs.set(2);
        assert_eq!(*late_calls.borrow(), vec![2]);
    }

    #[test]
    fn dispose_from_inside_callback_skips_rest_of_dispatch() {
        let obs = Observable::new(0);
        let b_calls = Rc::new(Cell::new(0u32));
        let b_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot_clone = Rc::clone(&b_slot);
        let _a = obs.subscribe_changes(move |_| {
            if let Some(mut b) = slot_clone.borrow_mut().take() {
                b.dispose();
            }
        });

        let b_clone = Rc::clone(&b_calls);
        let b = obs.subscribe_changes(move |_| b_clone.set(b_clone.get() + 1));
        *b_slot.borrow_mut() = Some(b);

        obs.set(1);
        assert_eq!(b_calls.get(), 0);
        obs.set(2);
        assert_eq!(b_calls.get(), 0);
    }

    #[test]
    fn self_dispose_inside_callback() {
        let obs = Observable::new(0);
        let calls = Rc::new(Cell::new(0u32));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let calls_clone = Rc::clone(&calls);
        let slot_clone = Rc::clone(&slot);
        let sub = obs.subscribe_changes(move |_| {
            calls_clone.set(calls_clone.get() + 1);
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        obs.set(1);
        obs.set(2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reentrant_set_dispatches_nested_change_first() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let weak = obs.downgrade();
        let _bump = obs.subscribe_changes(move |v| {
            if *v == 1
                && let Some(obs) = weak.upgrade()
            {
                obs.set(10);
            }
        });
        let log_clone = Rc::clone(&log);
        let _rec = obs.subscribe_changes(move |v| log_clone.borrow_mut().push(*v));

        obs.set(1);
        assert_eq!(*log.borrow(), vec![10, 1]);
        assert_eq!(obs.get(), 10);
    }

    #[test]
    fn subscriber_sees_new_value_via_get() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(-1));
        let weak = obs.downgrade();
        let seen_clone = Rc::clone(&seen);
        let _sub = obs.subscribe_changes(move |_| {
            if let Some(obs) = weak.upgrade() {
                seen_clone.set(obs.get());
            }
        });
        obs.set(5);
        assert_eq!(seen.get(), 5);
    }

    #[test]
    #[should_panic(expected = "subscriber failure")]
    fn panicking_subscriber_propagates_to_setter() {
        let obs = Observable::new(0);
        let _sub = obs.subscribe_changes(|_| panic!("subscriber failure"));
        obs.set(1);
    }

    #[test]
    fn clone_shares_state() {
        let obs1 = Observable::new(0);
        let obs2 = obs1.clone();

        obs1.set(42);
        assert_eq!(obs2.get(), 42);
        assert_eq!(obs2.version(), 1);

        obs2.set(99);
        assert_eq!(obs1.get(), 99);
        assert_eq!(obs1.version(), 2);
    }

    #[test]
    fn subscription_outliving_observable_is_harmless() {
        let obs = Observable::new(0);
        let mut sub = obs.subscribe(|_| {});
        drop(obs);
        sub.dispose();
        assert!(sub.is_disposed());
    }

    #[test]
    fn weak_handle_does_not_keep_alive() {
        let obs = Observable::new(1);
        let weak = obs.downgrade();
        assert!(weak.upgrade().is_some());
        drop(obs);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{:?}", obs);
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }
}
