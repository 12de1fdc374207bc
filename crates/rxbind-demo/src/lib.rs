#![forbid(unsafe_code)]

//! Headless example screens built on `rxbind-runtime`.
//!
//! # Modules
//! - [`user`]: the `User` payload and its JSON decoding.
//! - [`fetch`]: the [`Fetch`] collaborator, a stub, and (with the `http`
//!   feature) a blocking HTTP client.
//! - [`service`]: [`UserService`], which loads users into a [`LoadState`].
//! - [`screens`]: the users, validation and notification screens.
//! - [`scenarios`]: scripted runs of each screen, used by the binary.
//! - [`config`], [`logging`], [`error`]: binary plumbing.

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod scenarios;
pub mod screens;
pub mod service;
pub mod user;

pub use config::{DemoConfig, Scenario};
pub use error::{DecodeError, DemoError, FetchError, LoadError, Result};
pub use fetch::{Fetch, StubFetcher, check_url};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use scenarios::{Report, run, run_one};
pub use screens::{
    LabelList, Listener, NotificationScreen, USERS_ADDED, UsersScreen, ValidationScreen,
};
pub use service::{LoadState, UserService, UsersState};
pub use user::{User, decode_users, default_users};
