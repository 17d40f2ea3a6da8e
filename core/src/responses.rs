//! The responses reducer: folds lifecycle control actions into [`ResponsesState`].
//!
//! | action | result |
//! |---|---|
//! | `REQUEST_STATE` | slot ← `{ requestState, data }` |
//! | `RESET_REQUEST_STATE` | slot ← `{ null, null }` |
//! | anything else | the same state, by identity |
//!
//! No transition is refused: a slot may move from any state to any state.
//! Ordering is the driver's concern.

use crate::action::RequestAction;
use crate::reducer::Reducer;
use crate::state::{ResponseState, ResponsesState};
use serde_json::Value;

/// Fold one action into the state
///
/// Returns `state` itself (same `Arc`) for actions that are not lifecycle
/// control actions.
///
/// # Example
///
/// ```
/// use request_state_core::action::set_request_state;
/// use request_state_core::action_set::make_action_set;
/// use request_state_core::query::is_pending;
/// use request_state_core::request_state::RequestState;
/// use request_state_core::responses::reduce;
/// use request_state_core::state::ResponsesState;
///
/// let fetch = make_action_set("FETCH");
/// let state = reduce(
///     &ResponsesState::new(),
///     &set_request_state(&fetch, RequestState::Request, None, Some("1")),
/// );
/// assert!(is_pending(&state, &fetch, Some("1")));
/// ```
#[must_use]
pub fn reduce(state: &ResponsesState, action: &RequestAction) -> ResponsesState {
    match action {
        RequestAction::SetRequestState(payload) => state.with_slot(
            payload.action_set.request(),
            &payload.tag,
            ResponseState {
                request_state: Some(payload.request_state),
                data: payload.data.clone(),
            },
        ),
        RequestAction::ResetRequestState(payload) => state.with_slot(
            payload.action_set.request(),
            &payload.tag,
            ResponseState::cleared(),
        ),
        RequestAction::Started { .. }
        | RequestAction::Succeeded { .. }
        | RequestAction::Failed { .. } => state.clone(),
    }
}

/// Fold an arbitrary dispatched JSON action into the state
///
/// Anything that is not a well-formed `REQUEST_STATE`/`RESET_REQUEST_STATE`
/// flux standard action leaves the state untouched.
#[must_use]
pub fn reduce_json(state: &ResponsesState, action: &Value) -> ResponsesState {
    RequestAction::from_json(action)
        .map_or_else(|_| state.clone(), |action| reduce(state, &action))
}

/// [`Reducer`] wrapper around [`reduce`] for use in a store
///
/// Leaves the state's `Arc` untouched when the action changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponsesReducer;

impl ResponsesReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ResponsesReducer {
    type State = ResponsesState;
    type Action = RequestAction;
    type Environment = ();

    fn reduce(&self, state: &mut Self::State, action: Self::Action, _env: &Self::Environment) {
        let next = reduce(state, &action);
        if !ResponsesState::ptr_eq(state, &next) {
            *state = next;
        }
    }
}
