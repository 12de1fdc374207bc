#![forbid(unsafe_code)]

//! Subscription guards and owner-side bookkeeping.
//!
//! A [`Subscription`] owns the capability to remove exactly one callback
//! registration. It holds only weak references to the registry it came
//! from, so keeping a guard alive never keeps an observable or bus alive.
//!
//! # Invariants
//!
//! 1. Disposal removes one registration; a second disposal is a no-op.
//! 2. Dropping a guard disposes it.
//! 3. [`SubscriptionSet`] disposes its members in insertion order.

use std::fmt;

/// RAII guard for one callback registration.
pub struct Subscription {
    id: u64,
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, dispose: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A guard that owns no registration.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: 0,
            dispose: None,
        }
    }

    /// Registration id within the source (0 for [`Subscription::empty`]).
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the registration now. Safe to call from inside a callback of
    /// the same source; the callback is skipped for the rest of any dispatch
    /// already in flight.
    pub fn dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            tracing::debug!(subscription = self.id, "subscription disposed");
            dispose();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.dispose.is_none()
    }

    /// Give up the guard without disposing. The callback stays registered for
    /// the lifetime of its source.
    pub fn forget(mut self) {
        self.dispose = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A bag of subscriptions owned by one component.
///
/// Dropping the set disposes everything in it, so a screen that stores its
/// bindings here is unsubscribed when it is discarded.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Dispose every member, in insertion order.
    pub fn clear(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.clear();
    }
}
