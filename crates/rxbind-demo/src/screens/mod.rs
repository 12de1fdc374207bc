#![forbid(unsafe_code)]

//! Headless screen models.
//!
//! Each screen owns its observables and a [`SubscriptionSet`] of bindings,
//! and exposes its "widgets" as sinks that tests can inspect. Dropping a
//! screen drops its bindings.
//!
//! [`SubscriptionSet`]: rxbind_runtime::SubscriptionSet

pub mod notifications;
pub mod users;
pub mod validation;

pub use notifications::{Listener, NotificationScreen, USERS_ADDED};
pub use users::{LabelList, UsersScreen};
pub use validation::{DEFAULT_DELAY, DEFAULT_PATTERN, ValidationScreen};
