#![forbid(unsafe_code)]

//! Derived observables: `map`, `debounce`, `remove_duplicates`.
//!
//! Every operator returns a new [`Observable`] seeded from the source's
//! current value and fed by a change-only subscription on the source. The
//! derived observable owns that subscription and a strong handle to its
//! source, so a chain stays alive as long as its last link is held, and
//! dropping the last link unsubscribes the whole chain.
//!
//! # Debounce state machine
//!
//! ```text
//!            upstream change                 timer expiry
//!   Idle ───────────────────▶ Pending(v) ───────────────────▶ Idle  (emit v)
//!                               │   ▲
//!                               └───┘ upstream change: replace v, restart timer
//! ```
//!
//! The debounced observable is seeded with the source value but emits
//! nothing until the first expiry.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use super::observable::Observable;
use super::subscription::Subscription;
use crate::clock::{Clock, TimerId};

/// Observable of `transform(v)` for every value `v` of `source`.
pub fn map<S, U>(source: &Observable<S>, transform: impl Fn(&S) -> U + 'static) -> Observable<U>
where
    S: Clone + 'static,
    U: Clone + 'static,
{
    let output = Observable::new(source.with(|v| transform(v)));
    let weak = output.downgrade();
    let sub = source.subscribe_changes(move |value| {
        if let Some(output) = weak.upgrade() {
            output.set(transform(value));
        }
    });
    output.retain_upstream(source, sub);
    output
}

/// Observable that forwards only changes differing from the last forwarded
/// value.
pub fn remove_duplicates<T>(source: &Observable<T>) -> Observable<T>
where
    T: Clone + PartialEq + 'static,
{
    let output = Observable::new(source.get());
    let weak = output.downgrade();
    let sub = source.subscribe_changes(move |value| {
        let Some(output) = weak.upgrade() else { return };
        if output.with(|last| last != value) {
            output.set(value.clone());
        } else {
            trace!("duplicate value suppressed");
        }
    });
    output.retain_upstream(source, sub);
    output
}

enum DebounceState<T> {
    Idle,
    Pending { value: T, timer: TimerId },
}

/// Observable that emits the latest source value once the source has been
/// quiet for `delay`, as measured by `clock`.
pub fn debounce<T>(source: &Observable<T>, delay: Duration, clock: Rc<dyn Clock>) -> Observable<T>
where
    T: Clone + 'static,
{
    let output = Observable::new(source.get());
    let state = Rc::new(RefCell::new(DebounceState::<T>::Idle));

    let weak_output = output.downgrade();
    let timer_clock = Rc::clone(&clock);
    let timer_state = Rc::clone(&state);
    let sub = source.subscribe_changes(move |value| {
        let previous = std::mem::replace(&mut *timer_state.borrow_mut(), DebounceState::Idle);
        if let DebounceState::Pending { timer, .. } = previous {
            timer_clock.cancel(timer);
            trace!(timer = timer.get(), "debounce timer reset");
        }

        let fire_state = Rc::downgrade(&timer_state);
        let fire_output = weak_output.clone();
        let timer = timer_clock.after(
            delay,
            Box::new(move || {
                let Some(state) = fire_state.upgrade() else { return };
                let fired = std::mem::replace(&mut *state.borrow_mut(), DebounceState::Idle);
                if let DebounceState::Pending { value, .. } = fired
                    && let Some(output) = fire_output.upgrade()
                {
                    output.set(value);
                }
            }),
        );
        *timer_state.borrow_mut() = DebounceState::Pending {
            value: value.clone(),
            timer,
        };
    });
    output.retain_upstream(source, sub);

    // Dropping the debounced observable cancels a pending emission.
    output.retain_guard(Subscription::new(0, move || {
        if let DebounceState::Pending { timer, .. } =
            std::mem::replace(&mut *state.borrow_mut(), DebounceState::Idle)
        {
            clock.cancel(timer);
        }
    }));
    output
}

impl<T: Clone + 'static> Observable<T> {
    /// Method form of [`map`].
    pub fn map<U: Clone + 'static>(&self, transform: impl Fn(&T) -> U + 'static) -> Observable<U> {
        map(self, transform)
    }

    /// Method form of [`debounce`].
    pub fn debounce(&self, delay: Duration, clock: Rc<dyn Clock>) -> Observable<T> {
        debounce(self, delay, clock)
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Method form of [`remove_duplicates`].
    pub fn remove_duplicates(&self) -> Observable<T> {
        remove_duplicates(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::LabClock;
    use std::cell::Cell;

    fn record<T: Clone + 'static>(obs: &Observable<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let sub = obs.subscribe_changes(move |v: &T| log_clone.borrow_mut().push(v.clone()));
        (log, sub)
    }

    #[test]
    fn map_seeds_and_follows_source() {
        let source = Observable::new(2);
        let doubled = source.map(|v| v * 2);
        assert_eq!(doubled.get(), 4);

        let (log, _sub) = record(&doubled);
        source.set(5);
        source.set(5);
        assert_eq!(*log.borrow(), vec![10, 10]);
    }

    #[test]
    fn map_chain_survives_dropped_intermediate() {
        let source = Observable::new(1);
        let text = source.map(|v| v + 1).map(|v| format!("#{v}"));
        assert_eq!(text.get(), "#2");
        source.set(9);
        assert_eq!(text.get(), "#10");
    }

    #[test]
    fn dropping_derived_unsubscribes_from_source() {
        let source = Observable::new(0);
        let derived = source.map(|v| *v);
        assert_eq!(source.subscriber_count(), 1);
        drop(derived);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn remove_duplicates_drops_equal_values() {
        let source = Observable::new(1);
        let distinct = source.remove_duplicates();
        let (log, _sub) = record(&distinct);

        source.set(1);
        source.set(2);
        source.set(2);
        source.set(1);
        assert_eq!(*log.borrow(), vec![2, 1]);
    }

    #[test]
    fn debounce_emits_latest_after_quiet_period() {
        let clock = LabClock::new();
        let source = Observable::new(String::new());
        let debounced = source.debounce(Duration::from_millis(500), Rc::new(clock.clone()));
        let (log, _sub) = record(&debounced);

        source.set("a".into());
        clock.advance(Duration::from_millis(200));
        source.set("ab".into());
        clock.advance(Duration::from_millis(499));
        assert!(log.borrow().is_empty());

        clock.advance(Duration::from_millis(1));
        assert_eq!(*log.borrow(), vec!["ab".to_string()]);
        assert_eq!(clock.elapsed(), Duration::from_millis(700));
    }

    #[test]
    fn debounce_emits_nothing_before_first_expiry() {
        let clock = LabClock::new();
        let source = Observable::new(1);
        let debounced = source.debounce(Duration::from_millis(100), Rc::new(clock.clone()));
        let (log, _sub) = record(&debounced);
        clock.advance(Duration::from_secs(1));
        assert!(log.borrow().is_empty());
        assert_eq!(debounced.get(), 1);
        assert_eq!(clock.pending_timers(), 0);
    }

    #[test]
    fn debounce_separate_bursts_emit_separately() {
        let clock = LabClock::new();
        let source = Observable::new(0);
        let debounced = source.debounce(Duration::from_millis(100), Rc::new(clock.clone()));
        let (log, _sub) = record(&debounced);

        source.set(1);
        clock.advance(Duration::from_millis(150));
        source.set(2);
        source.set(3);
        clock.advance(Duration::from_millis(150));
        assert_eq!(*log.borrow(), vec![1, 3]);
    }

    #[test]
    fn disposed_subscriber_not_called_by_pending_debounce() {
        let clock = LabClock::new();
        let source = Observable::new(0);
        let debounced = source.debounce(Duration::from_millis(100), Rc::new(clock.clone()));
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let mut sub = debounced.subscribe_changes(move |_| calls_clone.set(calls_clone.get() + 1));

        source.set(1);
        sub.dispose();
        clock.advance(Duration::from_secs(1));
        assert_eq!(calls.get(), 0);
        assert_eq!(debounced.get(), 1);
    }

    #[test]
    fn dropping_debounced_cancels_pending_timer() {
        let clock = LabClock::new();
        let source = Observable::new(0);
        let debounced = source.debounce(Duration::from_millis(100), Rc::new(clock.clone()));
        source.set(1);
        assert_eq!(clock.pending_timers(), 1);
        drop(debounced);
        assert_eq!(clock.pending_timers(), 0);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn debounce_then_map_pipeline() {
        let clock = LabClock::new();
        let input = Observable::new(String::new());
        let valid = input
            .debounce(Duration::from_millis(300), Rc::new(clock.clone()))
            .map(|s: &String| s.contains('@'));
        assert!(!valid.get());

        input.set("a".into());
        input.set("a@b".into());
        assert!(!valid.get());
        clock.advance(Duration::from_millis(300));
        assert!(valid.get());
    }
}
