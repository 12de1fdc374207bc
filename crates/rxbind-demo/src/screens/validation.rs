#![forbid(unsafe_code)]

//! The validation screen: typed text is debounced, then matched against a
//! pattern to drive a validity flag and a status label.

use std::rc::Rc;
use std::time::Duration;

use regex::Regex;
use rxbind_runtime::{Clock, Observable, PropertyCell, Sink, SubscriptionSet};
use tracing::{debug, info};

use crate::error::{DemoError, Result};

/// A permissive e-mail shape: something, `@`, a dotted domain.
pub const DEFAULT_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$";
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

pub struct ValidationScreen {
    input: Observable<String>,
    is_valid: Observable<bool>,
    status: PropertyCell<String>,
    _subscriptions: SubscriptionSet,
}

impl ValidationScreen {
    /// Build the pipeline `input -> debounce(delay) -> is_match(pattern)`.
    ///
    /// # Errors
    ///
    /// [`DemoError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(pattern: &str, delay: Duration, clock: Rc<dyn Clock>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|err| DemoError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        debug!(pattern, delay_ms = delay.as_millis() as u64, "validation pipeline built");

        let input = Observable::new(String::new());
        let is_valid = input
            .debounce(delay, clock)
            .map(move |text: &String| regex.is_match(text));

        let status = PropertyCell::new();
        let mut subscriptions = SubscriptionSet::new();
        let status_sink = status.clone();
        subscriptions.insert(is_valid.assign(move |valid: bool| {
            let text = if valid { "valid" } else { "invalid" };
            status_sink.set_property(text.to_string());
        }));
        subscriptions.insert(is_valid.subscribe_changes(|valid| {
            info!(valid = *valid, "validation settled");
        }));

        Ok(Self {
            input,
            is_valid,
            status,
            _subscriptions: subscriptions,
        })
    }

    /// Screen with the default pattern and delay.
    pub fn with_defaults(clock: Rc<dyn Clock>) -> Result<Self> {
        Self::new(DEFAULT_PATTERN, DEFAULT_DELAY, clock)
    }

    /// A keystroke: replace the field's text.
    pub fn type_text(&self, text: impl Into<String>) {
        self.input.set(text.into());
    }

    #[must_use]
    pub fn input(&self) -> &Observable<String> {
        &self.input
    }

    /// Validity of the last settled input.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid.get()
    }

    #[must_use]
    pub fn validity(&self) -> &Observable<bool> {
        &self.is_valid
    }

    /// Text of the status label.
    #[must_use]
    pub fn status(&self) -> Option<String> {
        self.status.value()
    }

    /// Every status the label has shown, oldest first.
    #[must_use]
    pub fn status_history(&self) -> Vec<String> {
        self.status.history()
    }
}
