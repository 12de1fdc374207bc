#![forbid(unsafe_code)]

//! Scripted runs of each screen.
//!
//! A scenario drives a screen the way a user would and reports what the
//! screen's widgets showed, one line per observation.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rxbind_runtime::{Clock, Event, EventLoop, Observable, from_iter, just};
use tracing::{info, info_span, warn};

use crate::config::{DemoConfig, Scenario};
use crate::error::Result;
use crate::fetch::{Fetch, StubFetcher};
use crate::screens::{NotificationScreen, UsersScreen, ValidationScreen};
use crate::service::{LoadState, UserService, UsersState};

/// URL the built-in sample is served from when no remote URL is configured.
pub const SAMPLE_URL: &str = "https://sample.rxbind.invalid/users";

pub const SAMPLE_USERS_JSON: &str = r#"[
    {"name": "Anton", "age": 18},
    {"name": "Max", "age": 21},
    {"name": "Alex", "age": 31},
    {"name": "Alice", "age": 27}
]"#;

/// Output of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub scenario: Scenario,
    pub lines: Vec<String>,
}

/// Run every scenario `config` selects, one report each, stopping at the
/// first failure.
pub fn run(config: &DemoConfig) -> Result<Vec<Report>> {
    config
        .scenario
        .expand()
        .into_iter()
        .map(|scenario| run_one(scenario, config))
        .collect()
}

/// Run `scenario`; `All` yields a single report with every line.
pub fn run_one(scenario: Scenario, config: &DemoConfig) -> Result<Report> {
    let _span = info_span!("scenario", name = scenario.name()).entered();
    info!("scenario started");
    let lines = match scenario {
        Scenario::Sequence => sequence(),
        Scenario::Users => users(),
        Scenario::Validate => validate(config)?,
        Scenario::Notify => notify(),
        Scenario::Fetch => fetch(config)?,
        Scenario::All => {
            let mut lines = Vec::new();
            for single in Scenario::EACH {
                lines.extend(run_one(single, config)?.lines);
            }
            lines
        }
    };
    info!(lines = lines.len(), "scenario finished");
    Ok(Report { scenario, lines })
}

fn sequence() -> Vec<String> {
    let lines = RefCell::new(Vec::new());

    just("Hello world!").sink_events(|event| {
        let line = match event {
            Event::Value(text) => format!("just: {text}"),
            Event::Completed => "just: completed".to_string(),
        };
        lines.borrow_mut().push(line);
    });

    from_iter(["1", "2", "3"]).sink(
        |value| lines.borrow_mut().push(format!("array: {value}")),
        || lines.borrow_mut().push("array: completed".to_string()),
    );

    lines.into_inner()
}

fn users() -> Vec<String> {
    let screen = UsersScreen::new();
    let mut lines = vec![format!("labels: {}", screen.labels().join(", "))];

    let added = screen.press_add();
    lines.push(format!("added: {} ({})", added.name, added.age));
    lines.push(format!("labels: {}", screen.labels().join(", ")));

    // Re-emitting the same list must not duplicate labels.
    screen.users().set(screen.users().get());
    lines.push(format!("labels after re-emit: {}", screen.labels().len()));
    if let Some(count) = screen.count_text() {
        lines.push(count);
    }
    lines
}

fn validate(config: &DemoConfig) -> Result<Vec<String>> {
    let event_loop = EventLoop::new();
    let clock: Rc<dyn Clock> = Rc::new(event_loop.clone());
    let screen = ValidationScreen::new(&config.pattern, config.debounce, clock)?;
    let mut lines = vec![format!("status: {}", screen.status().unwrap_or_default())];

    for text in ["ann", "ann@", "ann@example.org"] {
        screen.type_text(text);
        lines.push(format!("typed: {text}"));
    }
    let settled = screen.validity().version() + 1;
    event_loop.run_until(config.debounce + Duration::from_secs(1), || {
        screen.validity().version() >= settled
    })?;

    lines.push(format!("status: {}", screen.status().unwrap_or_default()));
    lines.push(format!("validations: {}", screen.status_history().len() - 1));
    Ok(lines)
}

fn notify() -> Vec<String> {
    let users = UsersScreen::new();
    let notifications = NotificationScreen::new();
    let mut lines = Vec::new();

    let early = notifications.listen();
    let first = users.press_add();
    let delivery = notifications.press_button(first);
    lines.push(format!("first press delivered to {}", delivery.delivered));

    let late = notifications.listen();
    let second = users.press_add();
    let delivery = notifications.press_button(second);
    lines.push(format!("second press delivered to {}", delivery.delivered));

    lines.push(format!(
        "early listener: {} ({})",
        early.received(),
        early.label().unwrap_or_default()
    ));
    lines.push(format!(
        "late listener: {} ({})",
        late.received(),
        late.label().unwrap_or_default()
    ));
    lines
}

fn fetch(config: &DemoConfig) -> Result<Vec<String>> {
    let (fetcher, url) = fetcher_for(config)?;
    let service = UserService::new(fetcher, url);
    let event_loop = EventLoop::new();
    let state: UsersState = Observable::new(LoadState::default());

    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink_lines = Rc::clone(&lines);
    let _watch = state.subscribe(move |state: &LoadState<_>| {
        let line = match state {
            LoadState::Idle => "state: idle".to_string(),
            LoadState::Loading => "state: loading".to_string(),
            LoadState::Loaded(users) => format!("state: loaded {} users", users.len()),
            LoadState::Failed(err) => format!("state: failed ({err})"),
        };
        sink_lines.borrow_mut().push(line);
    });

    let worker = service.spawn_load(&event_loop, &state);
    event_loop.run_until(config.fetch_timeout, || state.with(LoadState::is_terminal))?;
    if worker.join().is_err() {
        warn!(url = service.url(), "load worker panicked");
    }

    let settled = state.get();
    let mut lines = lines.take();
    match settled {
        LoadState::Loaded(users) => {
            let screen = UsersScreen::with_users(users);
            lines.push(format!("labels: {}", screen.labels().join(", ")));
            Ok(lines)
        }
        LoadState::Failed(err) => Err(err.into()),
        LoadState::Idle | LoadState::Loading => Ok(lines),
    }
}

fn fetcher_for(config: &DemoConfig) -> Result<(Box<dyn Fetch>, String)> {
    let Some(url) = &config.users_url else {
        let stub = StubFetcher::new().with_body(SAMPLE_URL, SAMPLE_USERS_JSON);
        return Ok((Box::new(stub), SAMPLE_URL.to_string()));
    };
    remote_fetcher(url, config.fetch_timeout).map(|fetcher| (fetcher, url.clone()))
}

#[cfg(feature = "http")]
fn remote_fetcher(url: &str, timeout: Duration) -> Result<Box<dyn Fetch>> {
    use crate::error::LoadError;
    use crate::fetch::{HttpFetcher, check_url};

    check_url(url).map_err(LoadError::from)?;
    let fetcher = HttpFetcher::new(timeout).map_err(LoadError::from)?;
    Ok(Box::new(fetcher))
}

#[cfg(not(feature = "http"))]
fn remote_fetcher(url: &str, _timeout: Duration) -> Result<Box<dyn Fetch>> {
    use crate::error::{FetchError, LoadError};

    Err(LoadError::from(FetchError::Unsupported {
        url: url.to_string(),
    })
    .into())
}
