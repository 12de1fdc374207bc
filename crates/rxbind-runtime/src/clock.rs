#![forbid(unsafe_code)]

//! Timer scheduling for operators that suspend (debounce).
//!
//! [`Clock`] is the only seam through which the runtime defers work. Two
//! implementations exist:
//!
//! - [`LabClock`]: virtual time, advanced explicitly by tests.
//! - [`EventLoop`](crate::event_loop::EventLoop): wall-clock time, driven by
//!   the loop's `run_*` methods.
//!
//! # Invariants
//!
//! 1. Timers fire in deadline order; equal deadlines fire in scheduling order.
//! 2. A cancelled timer never fires.
//! 3. A task runs with no internal borrow held, so it may schedule or cancel
//!    other timers.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// Deferred work handed to a [`Clock`].
pub type Task = Box<dyn FnOnce()>;

/// Handle returned by [`Clock::after`], used to cancel the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Source of time and one-shot timers.
pub trait Clock {
    /// Current time as seen by this clock.
    fn now(&self) -> Instant;

    /// Run `task` once, `delay` from now.
    fn after(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a pending timer. Returns false if it already fired or was
    /// cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

/// Deadline-ordered queue of pending tasks.
pub(crate) struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<(Instant, u64), Task>,
    deadlines: HashMap<u64, Instant>,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub(crate) fn schedule(&mut self, deadline: Instant, task: Task) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        TimerId(id)
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(deadline) => self.pending.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest task due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<(Instant, Task)> {
        let (&(deadline, id), _) = self.pending.first_key_value()?;
        if deadline > now {
            return None;
        }
        self.deadlines.remove(&id);
        self.pending
            .remove(&(deadline, id))
            .map(|task| (deadline, task))
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

struct LabInner {
    epoch: Instant,
    offset: Duration,
    timers: TimerQueue,
}

/// A manually-advanced clock for deterministic tests.
///
/// All clones share the same time and timer queue. Time moves only through
/// [`advance`](LabClock::advance); while a task runs, [`Clock::now`] reports
/// that task's deadline.
#[derive(Clone)]
pub struct LabClock {
    inner: Rc<RefCell<LabInner>>,
}

impl LabClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LabInner {
                epoch: Instant::now(),
                offset: Duration::ZERO,
                timers: TimerQueue::new(),
            })),
        }
    }

    /// Virtual time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.inner.borrow().offset
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Move time forward by `delta`, firing every timer that comes due,
    /// including timers scheduled by tasks within the window. Returns the
    /// number of tasks run.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = {
            let inner = self.inner.borrow();
            inner.epoch + inner.offset + delta
        };
        let mut fired = 0;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                let due = inner.timers.pop_due(target);
                if let Some((deadline, _)) = &due {
                    inner.offset = deadline.saturating_duration_since(inner.epoch);
                }
                due
            };
            let Some((_, task)) = due else { break };
            task();
            fired += 1;
        }
        let mut inner = self.inner.borrow_mut();
        inner.offset = target.saturating_duration_since(inner.epoch);
        trace!(elapsed_ms = inner.offset.as_millis() as u64, fired, "lab clock advanced");
        fired
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LabClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LabClock")
            .field("elapsed", &inner.offset)
            .field("pending_timers", &inner.timers.len())
            .finish()
    }
}

impl Clock for LabClock {
    fn now(&self) -> Instant {
        let inner = self.inner.borrow();
        inner.epoch + inner.offset
    }

    fn after(&self, delay: Duration, task: Task) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let deadline = inner.epoch + inner.offset + delay;
        let id = inner.timers.schedule(deadline, task);
        debug!(timer = id.get(), delay_ms = delay.as_millis() as u64, "lab timer scheduled");
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.inner.borrow_mut().timers.cancel(id)
    }
}
