//! Debounce timing on a virtual clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rxbind_runtime::{Clock, LabClock, Observable};

/// Record `(virtual ms, value)` for every downstream emission.
fn emissions<T: Clone + 'static>(
    obs: &Observable<T>,
    clock: &LabClock,
) -> (Rc<RefCell<Vec<(u128, T)>>>, rxbind_runtime::Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_clone = Rc::clone(&log);
    let clock = clock.clone();
    let start = clock.now();
    let sub = obs.subscribe_changes(move |v: &T| {
        let at = (clock.now() - start).as_millis();
        log_clone.borrow_mut().push((at, v.clone()));
    });
    (log, sub)
}

#[test]
fn burst_coalesces_into_single_emission_at_last_plus_delay() {
    let clock = LabClock::new();
    let source = Observable::new("");
    let debounced = source.debounce(Duration::from_millis(500), Rc::new(clock.clone()));
    let (log, _sub) = emissions(&debounced, &clock);

    source.set("t0");
    clock.advance(Duration::from_millis(200));
    source.set("t0.2");
    clock.advance(Duration::from_secs(2));

    assert_eq!(*log.borrow(), vec![(700, "t0.2")]);
}

#[test]
fn quiet_input_never_emits() {
    let clock = LabClock::new();
    let source = Observable::new(0u8);
    let debounced = source.debounce(Duration::from_millis(500), Rc::new(clock.clone()));
    let (log, _sub) = emissions(&debounced, &clock);
    clock.advance(Duration::from_secs(10));
    assert!(log.borrow().is_empty());
}

#[test]
fn steady_typing_postpones_emission() {
    let clock = LabClock::new();
    let source = Observable::new(0u32);
    let debounced = source.debounce(Duration::from_millis(300), Rc::new(clock.clone()));
    let (log, _sub) = emissions(&debounced, &clock);

    for n in 1..=10 {
        source.set(n);
        clock.advance(Duration::from_millis(100));
    }
    assert!(log.borrow().is_empty());

    clock.advance(Duration::from_millis(200));
    assert_eq!(*log.borrow(), vec![(1200, 10)]);
}

#[test]
fn map_after_debounce_keeps_timing() {
    let clock = LabClock::new();
    let source = Observable::new(String::new());
    let lengths = source
        .debounce(Duration::from_millis(50), Rc::new(clock.clone()))
        .map(|s: &String| s.len());
    let (log, _sub) = emissions(&lengths, &clock);

    source.set("abc".into());
    clock.advance(Duration::from_millis(50));
    assert_eq!(*log.borrow(), vec![(50, 3)]);
}
