#![forbid(unsafe_code)]

//! Error types for the reactive runtime.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures surfaced by the event loop and its inboxes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The event loop owning an inbox has been dropped.
    #[error("event loop is closed")]
    LoopClosed,

    /// `EventLoop::run_until` gave up before its condition held.
    #[error("event loop condition not met after {waited:?}")]
    Timeout { waited: Duration },
}

/// A subscriber callback that panicked while an isolating bus dispatched to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("subscriber {subscriber} on channel `{channel}` panicked: {message}")]
pub struct SubscriberError {
    pub channel: String,
    pub subscriber: u64,
    pub message: String,
}

impl SubscriberError {
    pub(crate) fn from_panic(
        channel: &str,
        subscriber: u64,
        payload: &(dyn std::any::Any + Send),
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            channel: channel.to_string(),
            subscriber,
            message,
        }
    }
}
