#![forbid(unsafe_code)]

//! Loading the user list through a [`Fetch`] collaborator.
//!
//! A load is a one-shot pipeline: fetch, decode, then settle a
//! [`LoadState`] observable on `Loaded` or `Failed`. Failures are values on
//! the observable, never panics across the subscribe boundary. Once a load
//! settles, later completions for it are ignored.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rxbind_runtime::{EventLoop, Observable};
use tracing::{debug, error, info, warn};

use crate::error::LoadError;
use crate::fetch::Fetch;
use crate::user::{User, decode_users};

/// Progress of one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(LoadError),
}

impl<T> LoadState<T> {
    /// `Loaded` or `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed(_))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl<T> From<Result<T, LoadError>> for LoadState<T> {
    fn from(result: Result<T, LoadError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(err) => Self::Failed(err),
        }
    }
}

pub type UsersState = Observable<LoadState<Vec<User>>>;

/// Fetches and decodes the user list from one URL.
#[derive(Debug)]
pub struct UserService<F> {
    fetcher: Arc<F>,
    url: String,
}

impl<F> Clone for UserService<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            url: self.url.clone(),
        }
    }
}

impl<F: Fetch + 'static> UserService<F> {
    pub fn new(fetcher: F, url: impl Into<String>) -> Self {
        Self::with_shared(Arc::new(fetcher), url)
    }

    /// Share a fetcher with other services (or with the test that built it).
    pub fn with_shared(fetcher: Arc<F>, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode on the calling thread.
    pub fn obtain_users(&self) -> Result<Vec<User>, LoadError> {
        fetch_users(&*self.fetcher, &self.url)
    }

    /// Drive `state` through `Loading` to a terminal value on the calling
    /// thread.
    pub fn load_into(&self, state: &UsersState) {
        state.set(LoadState::Loading);
        let result = self.obtain_users();
        log_outcome(&self.url, &result);
        state.set(result.into());
    }

    /// Run the fetch on a worker thread and settle `state` on the loop
    /// thread the next time `event_loop` runs.
    ///
    /// `state` is held weakly: if every handle to it is dropped before the
    /// result arrives, the result is discarded. The result travels through a
    /// single-delivery inbox, so the loop forgets the load once it settles.
    pub fn spawn_load(&self, event_loop: &EventLoop, state: &UsersState) -> JoinHandle<()> {
        state.set(LoadState::Loading);

        let target = state.downgrade();
        let url = self.url.clone();
        let inbox = event_loop.inbox_once(move |result: Result<Vec<User>, LoadError>| {
            log_outcome(&url, &result);
            match target.upgrade() {
                Some(state) => state.set(result.into()),
                None => debug!(url = %url, "load target dropped before completion"),
            }
        });

        let fetcher = Arc::clone(&self.fetcher);
        let url = self.url.clone();
        debug!(url = %url, inbox = inbox.id(), "spawning user load");
        thread::spawn(move || {
            let result = fetch_users(&*fetcher, &url);
            if inbox.send(result).is_err() {
                warn!(url = %url, "event loop gone before load completed");
            }
        })
    }
}

fn fetch_users(fetcher: &dyn Fetch, url: &str) -> Result<Vec<User>, LoadError> {
    let body = fetcher.fetch(url)?;
    Ok(decode_users(&body)?)
}

fn log_outcome(url: &str, result: &Result<Vec<User>, LoadError>) {
    match result {
        Ok(users) => info!(url, count = users.len(), "users loaded"),
        Err(err) => error!(url, error = %err, "user load failed"),
    }
}
