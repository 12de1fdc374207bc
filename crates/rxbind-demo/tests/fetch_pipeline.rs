//! User loads end to end: fetch on a worker thread, decode, settle on the
//! event loop, render into labels.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use rxbind_demo::{
    DecodeError, FetchError, LoadError, LoadState, StubFetcher, UserService, UsersScreen,
};
use rxbind_runtime::{EventLoop, Observable, bind};

const URL: &str = "https://example.test/users";

fn run_load(stub: StubFetcher) -> (LoadState<Vec<rxbind_demo::User>>, Vec<String>) {
    let service = UserService::new(stub, URL);
    let event_loop = EventLoop::new();
    let state = Observable::new(LoadState::default());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_sink = Rc::clone(&seen);
    let _binding = bind(&state, move |s: LoadState<Vec<rxbind_demo::User>>| {
        let tag = match s {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Loaded(_) => "loaded",
            LoadState::Failed(_) => "failed",
        };
        seen_sink.borrow_mut().push(tag.to_string());
    });

    let worker = service.spawn_load(&event_loop, &state);
    event_loop
        .run_until(Duration::from_secs(5), || state.with(LoadState::is_terminal))
        .expect("load settles");
    worker.join().expect("worker finished");

    let tags = seen.borrow().clone();
    (state.get(), tags)
}

#[test]
fn loaded_users_render_as_labels() {
    let stub = StubFetcher::new().with_body(
        URL,
        r#"[{"name":"Anton","age":18},{"name":"Ann","age":40}]"#,
    );
    let (state, tags) = run_load(stub);
    assert_eq!(tags, vec!["idle", "loading", "loaded"]);

    let LoadState::Loaded(users) = state else {
        panic!("expected loaded state, got {state:?}");
    };
    let screen = UsersScreen::with_users(users);
    assert_eq!(screen.labels(), vec!["Anton", "Ann"]);
}

#[test]
fn http_error_is_terminal_value() {
    let stub = StubFetcher::new().with_failure(URL, FetchError::Status { code: 503 });
    let (state, tags) = run_load(stub);
    assert_eq!(tags, vec!["idle", "loading", "failed"]);
    assert_eq!(
        state,
        LoadState::Failed(LoadError::Fetch(FetchError::Status { code: 503 }))
    );
}

#[test]
fn malformed_body_is_decode_failure() {
    let stub = StubFetcher::new().with_body(URL, r#"{"users": []}"#);
    let (state, _) = run_load(stub);
    assert!(matches!(
        state,
        LoadState::Failed(LoadError::Decode(DecodeError { line: 1, .. }))
    ));
}

#[test]
fn two_loads_share_one_fetcher() {
    let stub = Arc::new(StubFetcher::new().with_body(URL, "[]"));
    let first = UserService::with_shared(Arc::clone(&stub), URL);
    let second = first.clone();
    assert_eq!(first.obtain_users(), Ok(vec![]));
    assert_eq!(second.obtain_users(), Ok(vec![]));
    assert_eq!(stub.calls(), 2);
}
