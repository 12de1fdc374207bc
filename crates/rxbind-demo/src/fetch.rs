#![forbid(unsafe_code)]

//! The HTTP fetch collaborator.
//!
//! Screens never talk to the network directly; they go through [`Fetch`],
//! which returns raw bytes for a URL. [`StubFetcher`] serves canned
//! responses for tests and offline runs. With the `http` feature,
//! [`HttpFetcher`] performs a real blocking GET.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FetchError;

/// Fetch the body at `url`.
///
/// Implementations must be shareable across threads: the user service runs
/// fetches on a worker thread.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: Fetch + ?Sized> Fetch for Box<F> {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Canned responses keyed by URL.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), Ok(body.into()));
        self
    }

    /// Fail every fetch of `url` with `error`.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// Number of `fetch` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Fetch for StubFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.responses.get(url) {
            Some(response) => response.clone(),
            None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

/// Reject URLs without an explicit http(s) scheme and a host part.
pub fn check_url(url: &str) -> Result<(), FetchError> {
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    if has_scheme && url.len() > url.find("://").map_or(0, |i| i + 3) {
        Ok(())
    } else {
        Err(FetchError::InvalidUrl {
            url: url.to_string(),
        })
    }
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use tracing::debug;

    use super::{Fetch, check_url};
    use crate::error::FetchError;

    /// Blocking GET over `reqwest`.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: reqwest::blocking::Client,
    }

    impl HttpFetcher {
        pub fn new(timeout: Duration) -> Result<Self, FetchError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| FetchError::Transport {
                    message: e.to_string(),
                })?;
            Ok(Self { client })
        }
    }

    impl Fetch for HttpFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            check_url(url)?;
            debug!(url, "http get");
            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| FetchError::Transport {
                    message: e.to_string(),
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    code: status.as_u16(),
                });
            }
            let body = response.bytes().map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;
            Ok(body.to_vec())
        }
    }
}
