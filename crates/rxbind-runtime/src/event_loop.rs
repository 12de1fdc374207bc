#![forbid(unsafe_code)]

//! Single-threaded event loop: wall-clock timers plus cross-thread inboxes.
//!
//! Observables and buses are `!Send`; they live on the thread that runs the
//! loop. Work produced elsewhere (a network completion on a worker thread)
//! reaches them through an [`Inbox<T>`]: a `Send` sender whose payloads are
//! handed to a sink on the loop thread the next time the loop runs.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use rxbind_runtime::EventLoop;
//!
//! let event_loop = EventLoop::new();
//! let total = Rc::new(Cell::new(0));
//! let sink_total = Rc::clone(&total);
//! let inbox = event_loop.inbox(move |n: i32| sink_total.set(sink_total.get() + n));
//!
//! std::thread::spawn(move || inbox.send(5).unwrap())
//!     .join()
//!     .unwrap();
//! event_loop.run_until(Duration::from_secs(1), || total.get() == 5).unwrap();
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::clock::{Clock, Task, TimerId, TimerQueue};
use crate::error::{Result, RuntimeError};

struct Envelope {
    inbox: u64,
    payload: Box<dyn Any + Send>,
}

type Deliver = Rc<dyn Fn(Box<dyn Any + Send>)>;

struct InboxSink {
    deliver: Deliver,
    once: bool,
}

struct LoopShared {
    timers: RefCell<TimerQueue>,
    sinks: RefCell<HashMap<u64, InboxSink>>,
    next_inbox: Cell<u64>,
    sender: mpsc::Sender<Envelope>,
    receiver: mpsc::Receiver<Envelope>,
}

/// Wall-clock event loop. Cloning yields another handle to the same loop.
#[derive(Clone)]
pub struct EventLoop {
    shared: Rc<LoopShared>,
}

impl EventLoop {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            shared: Rc::new(LoopShared {
                timers: RefCell::new(TimerQueue::new()),
                sinks: RefCell::new(HashMap::new()),
                next_inbox: Cell::new(1),
                sender,
                receiver,
            }),
        }
    }

    /// Register a sink that runs on the loop thread for every payload sent
    /// through the returned inbox.
    pub fn inbox<T: Send + 'static>(&self, sink: impl Fn(T) + 'static) -> Inbox<T> {
        self.open_inbox(sink, false)
    }

    /// Like [`inbox`](Self::inbox), but the inbox closes itself after its
    /// first delivery. Later payloads are discarded.
    pub fn inbox_once<T: Send + 'static>(&self, sink: impl Fn(T) + 'static) -> Inbox<T> {
        self.open_inbox(sink, true)
    }

    fn open_inbox<T: Send + 'static>(&self, sink: impl Fn(T) + 'static, once: bool) -> Inbox<T> {
        let id = self.shared.next_inbox.get();
        self.shared.next_inbox.set(id + 1);

        let deliver: Deliver = Rc::new(move |payload: Box<dyn Any + Send>| {
            match payload.downcast::<T>() {
                Ok(value) => sink(*value),
                Err(_) => warn!(inbox = id, "inbox payload type mismatch"),
            }
        });
        self.shared
            .sinks
            .borrow_mut()
            .insert(id, InboxSink { deliver, once });
        debug!(inbox = id, once, "inbox opened");

        Inbox {
            id,
            sender: self.shared.sender.clone(),
            _marker: PhantomData,
        }
    }

    /// Stop delivering payloads for `inbox`. Payloads already queued or sent
    /// later are discarded.
    pub fn close_inbox<T>(&self, inbox: &Inbox<T>) -> bool {
        let closed = self.shared.sinks.borrow_mut().remove(&inbox.id).is_some();
        if closed {
            debug!(inbox = inbox.id, "inbox closed");
        }
        closed
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.borrow().len()
    }

    /// Number of inboxes still accepting payloads.
    #[must_use]
    pub fn open_inboxes(&self) -> usize {
        self.shared.sinks.borrow().len()
    }

    /// Run until no timer is pending and no payload is queued. Payloads sent
    /// after the loop goes idle wait for the next `run_*` call.
    pub fn run_until_idle(&self) -> usize {
        let mut handled = 0;
        loop {
            handled += self.drain_queued();
            handled += self.fire_due_timers();
            match self.next_deadline() {
                Some(wake) => handled += self.wait_until(wake),
                None => {
                    let late = self.drain_queued();
                    if late == 0 {
                        return handled;
                    }
                    handled += late;
                }
            }
        }
    }

    /// Run for `duration` of wall-clock time, handling payloads and timers as
    /// they arrive.
    pub fn run_for(&self, duration: Duration) -> usize {
        let end = Instant::now() + duration;
        let mut handled = 0;
        loop {
            handled += self.drain_queued();
            handled += self.fire_due_timers();
            if Instant::now() >= end {
                return handled;
            }
            handled += self.wait_until(self.wake_before(end));
        }
    }

    /// Run until `done` returns true, or fail with [`RuntimeError::Timeout`]
    /// once `timeout` has elapsed.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> Result<usize> {
        let start = Instant::now();
        let end = start + timeout;
        let mut handled = 0;
        loop {
            handled += self.drain_queued();
            handled += self.fire_due_timers();
            if done() {
                return Ok(handled);
            }
            if Instant::now() >= end {
                return Err(RuntimeError::Timeout {
                    waited: start.elapsed(),
                });
            }
            handled += self.wait_until(self.wake_before(end));
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.shared.timers.borrow().next_deadline()
    }

    fn wake_before(&self, end: Instant) -> Instant {
        self.next_deadline().map_or(end, |deadline| deadline.min(end))
    }

    /// Block for at most until `wake` waiting for one payload.
    fn wait_until(&self, wake: Instant) -> usize {
        let timeout = wake.saturating_duration_since(Instant::now());
        match self.shared.receiver.recv_timeout(timeout) {
            Ok(envelope) => {
                self.dispatch(envelope);
                1
            }
            // The loop holds a sender, so the channel never disconnects.
            Err(_) => 0,
        }
    }

    fn drain_queued(&self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.shared.receiver.try_recv() {
            self.dispatch(envelope);
            handled += 1;
        }
        handled
    }

    fn fire_due_timers(&self) -> usize {
        let mut fired = 0;
        loop {
            let due = self.shared.timers.borrow_mut().pop_due(Instant::now());
            let Some((_, task)) = due else {
                return fired;
            };
            task();
            fired += 1;
        }
    }

    fn dispatch(&self, envelope: Envelope) {
        let deliver = {
            let mut sinks = self.shared.sinks.borrow_mut();
            match sinks.get(&envelope.inbox).map(|sink| sink.once) {
                Some(true) => {
                    debug!(inbox = envelope.inbox, "single-delivery inbox closed");
                    sinks.remove(&envelope.inbox).map(|sink| sink.deliver)
                }
                Some(false) => sinks
                    .get(&envelope.inbox)
                    .map(|sink| Rc::clone(&sink.deliver)),
                None => None,
            }
        };
        match deliver {
            Some(deliver) => {
                trace!(inbox = envelope.inbox, "inbox delivery");
                deliver(envelope.payload);
            }
            None => debug!(inbox = envelope.inbox, "payload for closed inbox dropped"),
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending_timers", &self.pending_timers())
            .field("inboxes", &self.open_inboxes())
            .finish()
    }
}

impl Clock for EventLoop {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn after(&self, delay: Duration, task: Task) -> TimerId {
        let id = self
            .shared
            .timers
            .borrow_mut()
            .schedule(Instant::now() + delay, task);
        debug!(timer = id.get(), delay_ms = delay.as_millis() as u64, "timer scheduled");
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.shared.timers.borrow_mut().cancel(id)
    }
}

/// `Send` handle that marshals values onto an [`EventLoop`] thread.
pub struct Inbox<T> {
    id: u64,
    sender: mpsc::Sender<Envelope>,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Inbox<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Inbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox").field("id", &self.id).finish()
    }
}

impl<T: Send + 'static> Inbox<T> {
    /// Queue `value` for the loop. Fails only if the loop has been dropped.
    pub fn send(&self, value: T) -> Result<()> {
        self.sender
            .send(Envelope {
                inbox: self.id,
                payload: Box::new(value),
            })
            .map_err(|_| RuntimeError::LoopClosed)
    }
}

impl<T> Inbox<T> {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}
