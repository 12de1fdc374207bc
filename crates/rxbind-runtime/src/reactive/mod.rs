#![forbid(unsafe_code)]

//! Reactive bindings.
//!
//! - [`Observable`]: a shared value that replays its current value to new
//!   subscribers and notifies them of every later `set`.
//! - [`EventBus`]: named channels with no replay.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`SubscriptionSet`]: owner-side bag of guards.
//! - Operators ([`map`], [`debounce`], [`remove_duplicates`]) and bindings
//!   ([`bind`], [`bind_weak`], [`bind_channel`]) built on the two sources.
//! - [`Sequence`]: finite cold publishers ([`just`], [`from_iter`]).
//!
//! # Architecture
//!
//! Sources use `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Dispatch snapshots the subscriber list and calls callbacks with no borrow
//! held, so callbacks may subscribe, dispose, or publish re-entrantly.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. `Observable::set` always notifies, equal value or not.
//! 3. A disposed [`Subscription`] is never called again, even by a dispatch
//!    already in flight.
//! 4. `Observable` replays on subscribe; `EventBus` never does.

pub mod binding;
pub mod event_bus;
pub mod observable;
pub mod operators;
pub mod sequence;
pub mod subscription;

mod subscribers;

pub use binding::{PropertyCell, Sink, bind, bind_channel, bind_weak};
pub use event_bus::{Channel, Delivery, DispatchPolicy, EventBus};
pub use observable::{Observable, WeakObservable};
pub use operators::{debounce, map, remove_duplicates};
pub use sequence::{Event, Sequence, from_iter, just};
pub use subscription::{Subscription, SubscriptionSet};
