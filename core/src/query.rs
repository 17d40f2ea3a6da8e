//! Read-side queries over [`ResponsesState`].
//!
//! All queries are total: a missing action set or tag reads as a cleared
//! slot, so every status query returns `false` for it.

use crate::action_set::ActionSet;
use crate::outcome::{Outcome, RequestError, Response};
use crate::request_state::RequestState;
use crate::state::{ResponseState, ResponsesState};
use crate::tag::normalize_tag;
use serde::de::DeserializeOwned;

static CLEARED: ResponseState = ResponseState::cleared();

/// The slot for an action set and tag, or a cleared slot if there is none
#[must_use]
pub fn get_response_state<'a>(
    state: &'a ResponsesState,
    action_set: &ActionSet,
    tag: Option<&str>,
) -> &'a ResponseState {
    state.slot(action_set, tag).unwrap_or(&CLEARED)
}

/// Whether the request is in flight
#[must_use]
pub fn is_pending(state: &ResponsesState, action_set: &ActionSet, tag: Option<&str>) -> bool {
    get_response_state(state, action_set, tag).is(RequestState::Request)
}

/// Whether the request's latest attempt failed
#[must_use]
pub fn has_failed(state: &ResponsesState, action_set: &ActionSet, tag: Option<&str>) -> bool {
    get_response_state(state, action_set, tag).is(RequestState::Failure)
}

/// Whether the request's latest attempt succeeded
#[must_use]
pub fn has_succeeded(state: &ResponsesState, action_set: &ActionSet, tag: Option<&str>) -> bool {
    get_response_state(state, action_set, tag).is(RequestState::Success)
}

/// One entry of an [`any_pending`] query
///
/// Built from `&ActionSet` (the `""` tag) or `(&ActionSet, tag)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingQuery<'a> {
    action_set: &'a ActionSet,
    tag: Option<&'a str>,
}

impl<'a> PendingQuery<'a> {
    /// Query a specific tag of an action set
    #[must_use]
    pub const fn new(action_set: &'a ActionSet, tag: Option<&'a str>) -> Self {
        Self { action_set, tag }
    }
}

impl<'a> From<&'a ActionSet> for PendingQuery<'a> {
    fn from(action_set: &'a ActionSet) -> Self {
        Self::new(action_set, None)
    }
}

impl<'a> From<(&'a ActionSet, &'a str)> for PendingQuery<'a> {
    fn from((action_set, tag): (&'a ActionSet, &'a str)) -> Self {
        Self::new(action_set, Some(tag))
    }
}

/// Whether any of the listed requests is in flight
///
/// # Example
///
/// ```
/// use request_state_core::action::set_request_state;
/// use request_state_core::action_set::make_action_set;
/// use request_state_core::query::{any_pending, PendingQuery};
/// use request_state_core::request_state::RequestState;
/// use request_state_core::responses::reduce;
/// use request_state_core::state::ResponsesState;
///
/// let users = make_action_set("USERS");
/// let posts = make_action_set("POSTS");
/// let state = reduce(
///     &ResponsesState::new(),
///     &set_request_state(&posts, RequestState::Request, None, None),
/// );
///
/// assert!(any_pending(&state, &[(&users, "x").into(), PendingQuery::from(&posts)]));
/// assert!(!any_pending(&state, &[(&posts, "x").into()]));
/// ```
#[must_use]
pub fn any_pending(state: &ResponsesState, queries: &[PendingQuery<'_>]) -> bool {
    queries
        .iter()
        .any(|query| is_pending(state, query.action_set, query.tag))
}

/// The error of a failed request
///
/// `None` unless the slot is in the failure state *and* holds a failure
/// outcome.
#[must_use]
pub fn get_error_data<'a>(
    state: &'a ResponsesState,
    action_set: &ActionSet,
    tag: Option<&str>,
) -> Option<&'a RequestError> {
    let slot = get_response_state(state, action_set, tag);
    if !slot.is(RequestState::Failure) {
        return None;
    }
    slot.data.as_ref().and_then(Outcome::as_error)
}

/// The decoded body of a failed request's error response
///
/// `None` when [`get_error_data`] is `None`, when the failure carried no
/// response, or when the body does not decode as `T`.
#[must_use]
pub fn get_error_body<T: DeserializeOwned>(
    state: &ResponsesState,
    action_set: &ActionSet,
    tag: Option<&str>,
) -> Option<T> {
    get_error_data(state, action_set, tag)?
        .decode_body()
        .and_then(Result::ok)
}

/// The response of a succeeded request
#[must_use]
pub fn get_response<'a>(
    state: &'a ResponsesState,
    action_set: &ActionSet,
    tag: Option<&str>,
) -> Option<&'a Response> {
    let slot = get_response_state(state, action_set, tag);
    if !slot.is(RequestState::Success) {
        return None;
    }
    slot.data.as_ref().and_then(Outcome::as_response)
}

/// The storage key of a slot, for logging
#[must_use]
pub fn slot_key(action_set: &ActionSet, tag: Option<&str>) -> String {
    format!("{}[{:?}]", action_set.request(), normalize_tag(tag))
}
