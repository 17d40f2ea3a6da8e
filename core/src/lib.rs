//! # Request State Core
//!
//! Core types for tracking the lifecycle of asynchronous requests as
//! normalized, queryable state.
//!
//! Every request type is named by an [`ActionSet`](action_set::ActionSet).
//! Concurrent instances of the same request type are told apart by a tag.
//! Each (action set, tag) pair owns one slot in
//! [`ResponsesState`](state::ResponsesState), which records whether the latest
//! attempt is pending, succeeded or failed, together with its outcome.
//!
//! ## Core Concepts
//!
//! - **Action set**: `<NAME>_REQUEST` / `<NAME>_SUCCESS` / `<NAME>_FAILURE`
//! - **Action**: lifecycle events emitted while a request runs
//! - **Reducer**: pure function `(State, Action) → State`
//! - **Queries**: pure reads over the state (`is_pending`, `get_error_data`, ...)
//! - **Dispatcher / Executor**: the injected seams to the outside world
//!
//! ## Slot state machine
//!
//! ```text
//!               set REQUEST            set SUCCESS
//!  unobserved ───────────────▶ REQUEST ───────────▶ SUCCESS
//!      ▲                          │
//!      │ reset (any state)        │ set FAILURE
//!      └──────────────────────────┴───────────────▶ FAILURE
//! ```
//!
//! The reducer blocks no transition; ordering comes from the driver.
//!
//! ## Example
//!
//! ```
//! use request_state_core::action::{reset_request_state, set_request_state};
//! use request_state_core::action_set::make_action_set;
//! use request_state_core::outcome::{Outcome, Response};
//! use request_state_core::query::{has_succeeded, is_pending};
//! use request_state_core::request_state::RequestState;
//! use request_state_core::responses::reduce;
//! use request_state_core::state::ResponsesState;
//! use serde_json::json;
//!
//! let fetch_user = make_action_set("FETCH_USER");
//!
//! let state = reduce(
//!     &ResponsesState::new(),
//!     &set_request_state(&fetch_user, RequestState::Request, None, Some("42")),
//! );
//! assert!(is_pending(&state, &fetch_user, Some("42")));
//!
//! let response = Outcome::Success(Response::ok(json!({ "id": 42 })));
//! let state = reduce(
//!     &state,
//!     &set_request_state(&fetch_user, RequestState::Success, Some(response), Some("42")),
//! );
//! assert!(has_succeeded(&state, &fetch_user, Some("42")));
//! assert!(!has_succeeded(&state, &fetch_user, Some("7")));
//!
//! let state = reduce(&state, &reset_request_state(&fetch_user, Some("42")));
//! assert!(!has_succeeded(&state, &fetch_user, Some("42")));
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};

pub mod action;
pub mod action_set;
pub mod dispatch;
pub mod executor;
pub mod meta;
pub mod outcome;
pub mod query;
pub mod request_state;
pub mod responses;
pub mod state;
pub mod tag;

/// Reducer module - The core trait for state transitions
///
/// Reducers are functions: `(State, Action, Environment) → State`
///
/// Side effects stay outside: the request driver performs the I/O and hands
/// the reducer only the actions describing what happened.
pub mod reducer {
    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```
    /// use request_state_core::reducer::Reducer;
    ///
    /// struct CountReducer;
    ///
    /// impl Reducer for CountReducer {
    ///     type State = u32;
    ///     type Action = ();
    ///     type Environment = ();
    ///
    ///     fn reduce(&self, state: &mut u32, _action: (), _env: &()) {
    ///         *state += 1;
    ///     }
    /// }
    ///
    /// let mut state = 0;
    /// CountReducer.reduce(&mut state, (), &());
    /// assert_eq!(state, 1);
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Fold one action into the state
        ///
        /// Must not block or perform I/O; the store holds its write lock
        /// for the whole call.
        fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment);
    }
}
