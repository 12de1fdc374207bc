#![forbid(unsafe_code)]

//! Tracing subscriber setup for the demo binary.

use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::DemoConfig;
use crate::error::{DemoError, Result};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "RXBIND_LOG";
const DEFAULT_DIRECTIVES: &str = "info";

/// Build the filter from `raw` directives, falling back to `info` when they
/// are missing or malformed.
fn filter_from(raw: Option<&str>) -> EnvFilter {
    raw.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber. Logs go to stderr so scenario output on
/// stdout stays clean.
pub fn init(config: &DemoConfig) -> Result<()> {
    let raw = std::env::var(LOG_ENV).ok();
    let filter = filter_from(raw.as_deref());

    let json = config
        .log_json
        .then(|| fmt::layer().json().with_writer(io::stderr));
    let plain = (!config.log_json).then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|err| DemoError::Logging {
            message: err.to_string(),
        })
}
