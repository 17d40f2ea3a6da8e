//! # Request State Testing
//!
//! Testing utilities and helpers for the request lifecycle state machine.
//!
//! This crate provides:
//! - Mock dispatchers and executors for driving requests without a network
//! - A Given-When-Then harness for reducers
//! - proptest strategies for lifecycle actions
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```
//! use request_state_core::executor::{RequestDescriptor, RequestExecutor};
//! use request_state_core::outcome::Response;
//! use request_state_testing::MockExecutor;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let executor = MockExecutor::new().respond_ok(Response::ok(json!({ "id": 1 })));
//!
//! let first = executor.execute(RequestDescriptor::get("/api/users/1/")).await;
//! assert!(first.is_ok());
//!
//! // The script ran out
//! let second = executor.execute(RequestDescriptor::get("/api/users/2/")).await;
//! assert!(second.is_err());
//! assert_eq!(executor.call_count(), 2);
//! # });
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of the dispatcher and executor seams
pub mod mocks {
    use futures::future::BoxFuture;
    use request_state_core::action::RequestAction;
    use request_state_core::dispatch::Dispatcher;
    use request_state_core::executor::{RequestDescriptor, RequestExecutor};
    use request_state_core::outcome::{ErrorKind, RequestError, Response};
    use request_state_core::responses::reduce;
    use request_state_core::state::ResponsesState;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tokio::sync::{mpsc, oneshot};

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records every dispatched action and folds it into a [`ResponsesState`]
    ///
    /// Clones share the same log.
    ///
    /// # Example
    ///
    /// ```
    /// use request_state_core::action::reset_request_state;
    /// use request_state_core::action_set::make_action_set;
    /// use request_state_core::dispatch::Dispatcher;
    /// use request_state_testing::RecordingDispatcher;
    ///
    /// # tokio_test::block_on(async {
    /// let dispatcher = RecordingDispatcher::new();
    /// dispatcher.dispatch(reset_request_state(&make_action_set("A"), None)).await;
    /// assert_eq!(dispatcher.action_types(), ["RESET_REQUEST_STATE"]);
    /// # });
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct RecordingDispatcher {
        log: Arc<Mutex<Log>>,
    }

    #[derive(Debug, Default)]
    struct Log {
        actions: Vec<RequestAction>,
        state: ResponsesState,
        snapshots: Vec<ResponsesState>,
    }

    impl RecordingDispatcher {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every action received so far, in order
        #[must_use]
        pub fn actions(&self) -> Vec<RequestAction> {
            lock(&self.log).actions.clone()
        }

        /// The type string of every action received so far
        #[must_use]
        pub fn action_types(&self) -> Vec<String> {
            lock(&self.log)
                .actions
                .iter()
                .map(|action| action.action_type().to_owned())
                .collect()
        }

        /// Number of actions received
        #[must_use]
        pub fn len(&self) -> usize {
            lock(&self.log).actions.len()
        }

        /// Whether nothing was received
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// The state after reducing every received action
        #[must_use]
        pub fn state(&self) -> ResponsesState {
            lock(&self.log).state.clone()
        }

        /// The state right after each received action
        #[must_use]
        pub fn snapshots(&self) -> Vec<ResponsesState> {
            lock(&self.log).snapshots.clone()
        }

        /// Forget everything received
        pub fn clear(&self) {
            *lock(&self.log) = Log::default();
        }
    }

    impl Dispatcher for RecordingDispatcher {
        fn dispatch(&self, action: RequestAction) -> BoxFuture<'_, ()> {
            {
                let mut log = lock(&self.log);
                let next = reduce(&log.state, &action);
                log.snapshots.push(next.clone());
                log.state = next;
                log.actions.push(action);
            }
            Box::pin(futures::future::ready(()))
        }
    }

    /// Executor that answers from a script
    ///
    /// Results are handed out in the order they were queued. Once the script
    /// runs out every call fails with [`ErrorKind::Other`].
    #[derive(Debug, Clone, Default)]
    pub struct MockExecutor {
        script: Arc<Mutex<VecDeque<Result<Response, RequestError>>>>,
        requests: Arc<Mutex<Vec<RequestDescriptor>>>,
    }

    impl MockExecutor {
        /// An executor with an empty script
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a result
        #[must_use]
        pub fn respond_with(self, result: Result<Response, RequestError>) -> Self {
            lock(&self.script).push_back(result);
            self
        }

        /// Queue a successful response
        #[must_use]
        pub fn respond_ok(self, response: Response) -> Self {
            self.respond_with(Ok(response))
        }

        /// Queue a failure
        #[must_use]
        pub fn respond_err(self, error: RequestError) -> Self {
            self.respond_with(Err(error))
        }

        /// Every request received so far, in order
        #[must_use]
        pub fn requests(&self) -> Vec<RequestDescriptor> {
            lock(&self.requests).clone()
        }

        /// Number of requests received
        #[must_use]
        pub fn call_count(&self) -> usize {
            lock(&self.requests).len()
        }
    }

    impl RequestExecutor for MockExecutor {
        fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<Response, RequestError>> {
            let url = request.url.clone();
            lock(&self.requests).push(request);
            let result = lock(&self.script).pop_front().unwrap_or_else(|| {
                Err(RequestError::new(
                    ErrorKind::Other,
                    format!("no scripted response for {url}"),
                ))
            });
            Box::pin(futures::future::ready(result))
        }
    }

    /// One request held by a [`GatedExecutor`]
    #[derive(Debug)]
    pub struct Gate {
        /// The request as the executor received it
        pub request: RequestDescriptor,
        release: oneshot::Sender<Result<Response, RequestError>>,
    }

    impl Gate {
        /// Let the request settle with `result`
        ///
        /// Returns `false` if the caller already went away.
        pub fn resolve(self, result: Result<Response, RequestError>) -> bool {
            self.release.send(result).is_ok()
        }
    }

    /// Executor whose calls stay in flight until the test releases them
    ///
    /// Used to observe the state while a request is pending and to settle
    /// concurrent requests in a chosen order.
    #[derive(Debug, Clone)]
    pub struct GatedExecutor {
        calls: mpsc::UnboundedSender<Gate>,
        gates: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Gate>>>,
    }

    impl Default for GatedExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GatedExecutor {
        /// Create an executor with no calls in flight
        #[must_use]
        pub fn new() -> Self {
            let (calls, gates) = mpsc::unbounded_channel();
            Self {
                calls,
                gates: Arc::new(tokio::sync::Mutex::new(gates)),
            }
        }

        /// Wait for the next call to arrive
        ///
        /// Returns `None` only if every clone of the executor is gone.
        pub async fn next_call(&self) -> Option<Gate> {
            self.gates.lock().await.recv().await
        }
    }

    impl RequestExecutor for GatedExecutor {
        fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<Response, RequestError>> {
            let (release, settled) = oneshot::channel();
            let queued = self.calls.send(Gate { request, release });

            Box::pin(async move {
                if queued.is_err() {
                    return Err(RequestError::new(ErrorKind::Other, "gate closed"));
                }
                settled
                    .await
                    .unwrap_or_else(|_| Err(RequestError::new(ErrorKind::Other, "gate dropped")))
            })
        }
    }
}

/// proptest strategies for lifecycle values
pub mod properties {
    use proptest::prelude::*;
    use request_state_core::action::{RequestAction, reset_request_state, set_request_state};
    use request_state_core::action_set::{ActionSet, make_action_set};
    use request_state_core::outcome::{Outcome, RequestError, Response};
    use request_state_core::request_state::RequestState;
    use serde_json::json;

    /// A base name such as `FETCH_USER`
    pub fn action_name() -> impl Strategy<Value = String> {
        "[A-Z][A-Z_]{0,15}"
    }

    /// An action set over a random base name
    pub fn action_set() -> impl Strategy<Value = ActionSet> {
        action_name().prop_map(|name| make_action_set(&name))
    }

    /// A short tag; the empty tag comes up often
    pub fn tag() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[a-z0-9]{1,4}"]
    }

    /// Any lifecycle state
    pub fn request_state() -> impl Strategy<Value = RequestState> {
        prop_oneof![
            Just(RequestState::Request),
            Just(RequestState::Success),
            Just(RequestState::Failure),
        ]
    }

    /// A successful or failed outcome with a small body
    pub fn outcome() -> impl Strategy<Value = Outcome> {
        prop_oneof![
            any::<u32>().prop_map(|id| Outcome::Success(Response::ok(json!({ "id": id })))),
            (400u16..600).prop_map(|status| {
                Outcome::Failure(RequestError::status(Response::new(
                    status,
                    json!({ "detail": "failed" }),
                )))
            }),
            "[a-z ]{0,12}".prop_map(|message| Outcome::Failure(RequestError::network(message))),
        ]
    }

    /// A set or reset action over one of `sets`
    ///
    /// Keeping the action sets few makes actions collide on slots.
    pub fn control_action(sets: Vec<ActionSet>) -> impl Strategy<Value = RequestAction> {
        let set = proptest::sample::select(sets);
        prop_oneof![
            3 => (set.clone(), request_state(), proptest::option::of(outcome()), tag()).prop_map(
                |(set, request_state, data, tag)| {
                    set_request_state(&set, request_state, data, Some(&tag))
                }
            ),
            1 => (set, tag()).prop_map(|(set, tag)| reset_request_state(&set, Some(&tag))),
        ]
    }

    /// A sequence of control actions over a few fixed action sets
    pub fn control_actions(max_len: usize) -> impl Strategy<Value = Vec<RequestAction>> {
        let sets = vec![
            make_action_set("FETCH_USER"),
            make_action_set("SAVE_USER"),
            make_action_set("LIST_POSTS"),
        ];
        proptest::collection::vec(control_action(sets), 0..=max_len)
    }
}

/// Test helpers and utilities
pub mod helpers {
    use request_state_core::action::RequestAction;
    use request_state_core::responses::reduce;
    use request_state_core::state::ResponsesState;

    /// Install a tracing subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    /// Reduce `actions` in order, starting from an empty state
    #[must_use]
    pub fn fold_actions<'a, I>(actions: I) -> ResponsesState
    where
        I: IntoIterator<Item = &'a RequestAction>,
    {
        actions
            .into_iter()
            .fold(ResponsesState::new(), |state, action| reduce(&state, action))
    }
}

// Re-export commonly used items
pub use helpers::{fold_actions, init_test_tracing};
pub use mocks::{Gate, GatedExecutor, MockExecutor, RecordingDispatcher};

#[cfg(test)]
mod tests {
    use super::*;
    use request_state_core::action::set_request_state;
    use request_state_core::action_set::make_action_set;
    use request_state_core::dispatch::Dispatcher;
    use request_state_core::executor::{RequestDescriptor, RequestExecutor};
    use request_state_core::outcome::{RequestError, Response};
    use request_state_core::query::is_pending;
    use request_state_core::request_state::RequestState;
    use serde_json::json;

    #[tokio::test]
    async fn test_recording_dispatcher_tracks_state() {
        let set = make_action_set("FETCH");
        let dispatcher = RecordingDispatcher::new();

        dispatcher
            .dispatch(set_request_state(&set, RequestState::Request, None, Some("1")))
            .await;

        assert_eq!(dispatcher.len(), 1);
        assert!(is_pending(&dispatcher.state(), &set, Some("1")));
        assert_eq!(dispatcher.snapshots().len(), 1);

        dispatcher.clear();
        assert!(dispatcher.is_empty());
        assert!(dispatcher.state().is_empty());
    }

    #[tokio::test]
    async fn test_mock_executor_follows_script() {
        let executor = MockExecutor::new()
            .respond_ok(Response::ok(json!(1)))
            .respond_err(RequestError::network("offline"));

        assert_eq!(executor.execute(RequestDescriptor::get("/a")).await.ok(), Some(Response::ok(json!(1))));
        assert_eq!(
            executor.execute(RequestDescriptor::get("/b")).await.err(),
            Some(RequestError::network("offline"))
        );
        assert!(executor.execute(RequestDescriptor::get("/c")).await.is_err());

        let urls: Vec<_> = executor.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, ["/a", "/b", "/c"]);
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test]
    async fn test_gated_executor_holds_until_released() {
        let executor = GatedExecutor::new();
        let pending = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.execute(RequestDescriptor::get("/slow")).await })
        };

        let gate = executor.next_call().await;
        assert_eq!(gate.as_ref().map(|g| g.request.url.as_str()), Some("/slow"));
        if let Some(gate) = gate {
            assert!(gate.resolve(Ok(Response::ok(json!("done")))));
        }

        let settled = pending.await.ok().and_then(Result::ok);
        assert_eq!(settled, Some(Response::ok(json!("done"))));
    }

    #[test]
    fn test_fold_actions() {
        let set = make_action_set("FETCH");
        let actions = [set_request_state(&set, RequestState::Request, None, None)];
        assert!(is_pending(&fold_actions(&actions), &set, None));
    }
}
