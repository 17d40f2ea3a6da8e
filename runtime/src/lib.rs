//! # Request State Runtime
//!
//! Runtime for the request lifecycle state machine.
//!
//! This crate provides the Store runtime that serializes reducer execution
//! and broadcasts reduced actions, and the request driver that turns one
//! request attempt into an ordered stream of lifecycle actions.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that owns state and feeds actions to a reducer
//! - **Driver**: Announces, performs and settles one request through a [`Dispatcher`]
//!
//! ## Example
//!
//! ```
//! use request_state_core::action_set::make_action_set;
//! use request_state_core::meta::RequestOptions;
//! use request_state_core::outcome::Response;
//! use request_state_core::query::has_succeeded;
//! use request_state_core::responses::ResponsesReducer;
//! use request_state_core::state::ResponsesState;
//! use request_state_runtime::{driver, Store};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = Store::new(ResponsesState::new(), ResponsesReducer::new(), ());
//! let fetch_user = make_action_set("FETCH_USER");
//!
//! let response = driver::request_from_fn(
//!     &store,
//!     &fetch_user,
//!     || async { Ok(Response::ok(json!({ "id": 42 }))) },
//!     RequestOptions::new().with_tag("42"),
//! )
//! .await;
//!
//! assert!(matches!(response, Ok(Some(_))));
//! assert!(store.state(|s| has_succeeded(s, &fetch_user, Some("42"))).await);
//! # });
//! ```
//!
//! [`Dispatcher`]: request_state_core::dispatch::Dispatcher

use request_state_core::reducer::Reducer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

pub mod driver;

pub use driver::RequestDriver;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown gave up while sends were still being reduced
        #[error("Shutdown timed out with {0} actions still in flight")]
        ShutdownTimeout(usize),

        /// No matching action arrived in time
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use request_state_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for each slow subscriber
    pub broadcast_capacity: usize,
    /// How long [`Store::shutdown_gracefully`] waits for in-flight sends
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration from explicit values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    ///
    /// A capacity of zero is raised to one when the store is built.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(64, Duration::from_secs(30))
    }
}

/// Counts a send as in flight until dropped
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime: owns the state and serializes reductions.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, Duration, InFlightGuard, Ordering, Reducer, RwLock,
        StoreConfig, StoreError,
    };
    use futures::future::BoxFuture;
    use request_state_core::action::RequestAction;
    use request_state_core::dispatch::Dispatcher;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// - State lives behind a `RwLock`; each [`send`](Store::send) reduces
    ///   under the write lock, readers go through [`state`](Store::state).
    /// - Every reduced action is broadcast to subscribers afterwards.
    /// - After [`shutdown`](Store::shutdown) new actions are rejected.
    ///
    /// Clones share state, subscribers and the shutdown flag.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        in_flight: Arc<AtomicUsize>,
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
        A: Clone,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```
        /// use request_state_core::responses::ResponsesReducer;
        /// use request_state_core::state::ResponsesState;
        /// use request_state_runtime::{Store, StoreConfig};
        ///
        /// let store = Store::with_config(
        ///     ResponsesState::new(),
        ///     ResponsesReducer::new(),
        ///     (),
        ///     StoreConfig::default().with_broadcast_capacity(1024),
        /// );
        /// # let _ = store;
        /// ```
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Stop accepting actions and wait for in-flight sends to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if sends are still being
        /// reduced when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let in_flight = self.in_flight.load(Ordering::Acquire);
                if in_flight == 0 {
                    tracing::info!("Shutdown complete");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(in_flight, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(in_flight));
                }

                tracing::debug!(in_flight, "Waiting for in-flight sends");
                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_gracefully(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Whether shutdown has been initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Reduce an action, then broadcast it to subscribers
        ///
        /// Returns once the state has been updated.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            // Entered before the flag check so shutdown waits for this send
            let _in_flight = InFlightGuard::enter(&self.in_flight);

            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);
            let observed = action.clone();

            {
                let mut state = self.state.write().await;
                let _span = tracing::debug_span!("reducer_execution").entered();
                self.reducer.reduce(&mut *state, action, &self.environment);
            }

            // No subscribers is not an error
            let _ = self.action_broadcast.send(observed);
            Ok(())
        }

        /// Send an action and wait for a matching action
        ///
        /// Subscribes before sending, so the sent action itself and anything
        /// other callers send afterwards are candidates.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action reduced by this store
        ///
        /// A receiver that falls more than the configured broadcast capacity
        /// behind skips old actions and sees `RecvError::Lagged`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let pending = store.state(|s| is_pending(s, &fetch_user, None)).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                in_flight: Arc::clone(&self.in_flight),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    /// A store accepts lifecycle actions from the request driver
    ///
    /// A rejected send (the store is shutting down) is logged and dropped,
    /// the driver carries on with its protocol.
    impl<S, A, E, R> Dispatcher for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync,
        A: From<RequestAction> + Clone + Send + Sync,
        S: Send + Sync,
        E: Send + Sync,
    {
        fn dispatch(&self, action: RequestAction) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                let action_type = action.action_type().to_owned();
                if let Err(error) = self.send(A::from(action)).await {
                    tracing::warn!(action = %action_type, error = %error, "Store rejected request action");
                }
            })
        }
    }
}

// Re-export for convenience
pub use store::Store;
