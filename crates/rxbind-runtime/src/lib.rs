#![forbid(unsafe_code)]

//! Reactive runtime for rxbind.
//!
//! # Role
//! `rxbind-runtime` holds the reusable mechanism behind the demo screens:
//! observable values, a scoped event bus, and bindings from either to
//! external sinks, plus the clocks that time-based operators run on.
//!
//! # Modules
//! - [`reactive`]: `Observable`, `EventBus`, subscriptions, operators, sinks.
//! - [`clock`]: the `Clock` trait and the virtual [`LabClock`].
//! - [`event_loop`]: the wall-clock [`EventLoop`] and cross-thread [`Inbox`].
//! - [`error`]: runtime error types.
//!
//! # Threading
//! Everything here is single-threaded (`!Send`). Values produced on other
//! threads enter through an [`Inbox`], which hands them to a sink on the
//! thread running the loop.

pub mod clock;
pub mod error;
pub mod event_loop;
pub mod reactive;

pub use clock::{Clock, LabClock, Task, TimerId};
pub use error::{Result, RuntimeError, SubscriberError};
pub use event_loop::{EventLoop, Inbox};
pub use reactive::{
    Channel, Delivery, DispatchPolicy, Event, EventBus, Observable, PropertyCell, Sequence, Sink,
    Subscription, SubscriptionSet, WeakObservable, bind, bind_channel, bind_weak, from_iter, just,
};
