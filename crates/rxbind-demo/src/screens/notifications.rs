#![forbid(unsafe_code)]

//! The notification screen: a button announces new users on a scoped bus,
//! and listeners react to the announcements.
//!
//! Unlike the list observable, the bus does not replay: a listener attached
//! after a press never hears about it.

use std::cell::Cell;
use std::rc::Rc;

use rxbind_runtime::{
    Channel, Delivery, DispatchPolicy, EventBus, PropertyCell, Sink, Subscription, bind_channel,
};
use tracing::info;

use crate::user::User;

/// Channel carrying users added anywhere in the app.
pub const USERS_ADDED: &str = "users.added";

pub struct NotificationScreen {
    bus: EventBus<User>,
    channel: Channel<User>,
    presses: Cell<u32>,
}

impl NotificationScreen {
    /// Screen with its own bus. Listener panics are isolated so one broken
    /// listener cannot stop the others.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bus(EventBus::with_policy(DispatchPolicy::Isolate))
    }

    /// Screen publishing on an existing bus.
    #[must_use]
    pub fn with_bus(bus: EventBus<User>) -> Self {
        let channel = bus.channel(USERS_ADDED);
        Self {
            bus,
            channel,
            presses: Cell::new(0),
        }
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus<User> {
        &self.bus
    }

    /// The button: announce `user` to every current listener.
    pub fn press_button(&self, user: User) -> Delivery {
        self.presses.set(self.presses.get() + 1);
        let name = user.name.clone();
        let delivery = self.channel.publish(user);
        info!(name = %name, delivered = delivery.delivered, "user announced");
        delivery
    }

    #[must_use]
    pub fn presses(&self) -> u32 {
        self.presses.get()
    }

    /// Attach a listener that labels and counts every later announcement.
    #[must_use]
    pub fn listen(&self) -> Listener {
        let label = PropertyCell::new();
        let received = Rc::new(Cell::new(0usize));

        let sink_label = label.clone();
        let sink_received = Rc::clone(&received);
        let subscription = bind_channel(&self.channel, move |user: User| {
            sink_received.set(sink_received.get() + 1);
            sink_label.set_property(format!("{} joined", user.name));
        });

        Listener {
            label,
            received,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.channel.subscriber_count()
    }
}

impl Default for NotificationScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// One attached listener. Dropping it detaches it from the bus.
pub struct Listener {
    label: PropertyCell<String>,
    received: Rc<Cell<usize>>,
    _subscription: Subscription,
}

impl Listener {
    #[must_use]
    pub fn received(&self) -> usize {
        self.received.get()
    }

    /// Text of the listener's label, if anything arrived yet.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.label.value()
    }
}
