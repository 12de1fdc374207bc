#![forbid(unsafe_code)]

//! Named-channel publish/subscribe.
//!
//! # Design
//!
//! [`EventBus<T>`] maps channel names to ordered subscriber lists. It is a
//! scoped value: every screen, test, or process that wants a bus creates one
//! and hands out clones. There is no global instance.
//!
//! Unlike [`Observable`](super::Observable), a bus keeps no payloads. A
//! subscriber only sees what is published after it subscribed.
//!
//! # Failure Modes
//!
//! Under [`DispatchPolicy::Propagate`] (the default) a panicking subscriber
//! unwinds out of `publish` and later subscribers miss that payload. Under
//! [`DispatchPolicy::Isolate`] each callback runs inside `catch_unwind`; a
//! panic is logged and reported in [`Delivery::failures`] and dispatch
//! continues with the next subscriber.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, trace};

use super::subscribers::SubscriberList;
use super::subscription::Subscription;
use crate::error::SubscriberError;

/// How a bus reacts to a panicking subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Let the panic unwind to the publisher.
    #[default]
    Propagate,
    /// Catch the panic, log it, and keep dispatching.
    Isolate,
}

/// Outcome of one [`EventBus::publish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Callbacks invoked, including ones that panicked under `Isolate`.
    pub delivered: usize,
    /// Captured panics (always empty under `Propagate`).
    pub failures: Vec<SubscriberError>,
}

impl Delivery {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct BusInner<T> {
    channels: HashMap<String, SubscriberList<T>>,
    policy: DispatchPolicy,
}

/// A scoped, named-channel event bus.
pub struct EventBus<T> {
    inner: Rc<RefCell<BusInner<T>>>,
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut channels: Vec<_> = inner.channels.keys().collect();
        channels.sort();
        f.debug_struct("EventBus")
            .field("policy", &inner.policy)
            .field("channels", &channels)
            .finish()
    }
}

impl<T: 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EventBus<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DispatchPolicy::default())
    }

    #[must_use]
    pub fn with_policy(policy: DispatchPolicy) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                channels: HashMap::new(),
                policy,
            })),
        }
    }

    #[must_use]
    pub fn policy(&self) -> DispatchPolicy {
        self.inner.borrow().policy
    }

    /// Register `callback` on `channel`, creating the channel if needed.
    /// Earlier payloads are not replayed.
    pub fn subscribe(
        &self,
        channel: impl Into<String>,
        callback: impl Fn(&T) + 'static,
    ) -> Subscription {
        let name = channel.into();
        let entry = self
            .inner
            .borrow_mut()
            .channels
            .entry(name.clone())
            .or_insert_with(SubscriberList::new)
            .insert(Box::new(callback));
        let id = entry.id();
        debug!(channel = %name, subscription = id, "bus subscribe");

        let owner = Rc::downgrade(&self.inner);
        let weak_entry = Rc::downgrade(&entry);
        Subscription::new(id, move || {
            if let Some(entry) = weak_entry.upgrade() {
                entry.revoke();
            }
            let Some(owner) = owner.upgrade() else { return };
            let Ok(mut inner) = owner.try_borrow_mut() else {
                return;
            };
            let emptied = match inner.channels.get_mut(&name) {
                Some(list) => {
                    list.remove(id);
                    list.is_empty()
                }
                None => false,
            };
            if emptied {
                inner.channels.remove(&name);
                debug!(channel = %name, "bus channel pruned");
            }
        })
    }

    /// Deliver `payload` to every subscriber currently on `channel`, in
    /// registration order. Publishing to a channel with no subscribers does
    /// nothing.
    pub fn publish(&self, channel: &str, payload: T) -> Delivery {
        let (entries, policy) = {
            let mut inner = self.inner.borrow_mut();
            let policy = inner.policy;
            match inner.channels.get_mut(channel) {
                Some(list) => (list.snapshot(), policy),
                None => {
                    trace!(channel, "publish with no subscribers");
                    return Delivery::default();
                }
            }
        };

        let mut delivery = Delivery::default();
        for entry in &entries {
            match policy {
                DispatchPolicy::Propagate => {
                    if entry.call(&payload) {
                        delivery.delivered += 1;
                    }
                }
                DispatchPolicy::Isolate => {
                    if !entry.is_live() {
                        continue;
                    }
                    delivery.delivered += 1;
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.call(&payload)));
                    if let Err(panic) = outcome {
                        let failure =
                            SubscriberError::from_panic(channel, entry.id(), panic.as_ref());
                        error!(
                            channel,
                            subscription = entry.id(),
                            panic = %failure.message,
                            "subscriber panicked"
                        );
                        delivery.failures.push(failure);
                    }
                }
            }
        }
        debug!(channel, delivered = delivery.delivered, "bus publish");
        delivery
    }

    /// A handle bound to one channel name.
    #[must_use]
    pub fn channel(&self, name: impl Into<String>) -> Channel<T> {
        Channel {
            bus: self.clone(),
            name: Rc::from(name.into()),
        }
    }

    /// Live subscribers on `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .borrow()
            .channels
            .get(channel)
            .map_or(0, SubscriberList::live_count)
    }

    /// Names of channels that currently have registrations, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().channels.keys().cloned().collect();
        names.sort();
        names
    }
}

/// An [`EventBus`] handle fixed to one channel.
pub struct Channel<T> {
    bus: EventBus<T>,
    name: Rc<str>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            name: Rc::clone(&self.name),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").field("name", &self.name).finish()
    }
}

impl<T: 'static> Channel<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn publish(&self, payload: T) -> Delivery {
        self.bus.publish(&self.name, payload)
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.bus.subscribe(self.name.to_string(), callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count(&self.name)
    }
}
