//! Action sets: the three correlated action types of one logical request.
//!
//! Every request type in an application is identified by an [`ActionSet`].
//! The `REQUEST` member doubles as the key of the request's slot in
//! [`ResponsesState`](crate::state::ResponsesState).

use crate::request_state::RequestState;
use serde::{Deserialize, Serialize};

/// The `REQUEST`/`SUCCESS`/`FAILURE` action types of one logical request.
///
/// # Example
///
/// ```
/// use request_state_core::action_set::make_action_set;
///
/// let fetch_user = make_action_set("FETCH_USER");
/// assert_eq!(fetch_user.request(), "FETCH_USER_REQUEST");
/// assert_eq!(fetch_user.success(), "FETCH_USER_SUCCESS");
/// assert_eq!(fetch_user.failure(), "FETCH_USER_FAILURE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSet {
    #[serde(rename = "REQUEST")]
    request: String,
    #[serde(rename = "SUCCESS")]
    success: String,
    #[serde(rename = "FAILURE")]
    failure: String,
}

impl ActionSet {
    /// Derive an action set from a base action name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            request: format!("{name}_REQUEST"),
            success: format!("{name}_SUCCESS"),
            failure: format!("{name}_FAILURE"),
        }
    }

    /// Build an action set from explicit action types
    ///
    /// Useful when the action types predate the `<NAME>_<STATE>` convention.
    #[must_use]
    pub fn from_parts(
        request: impl Into<String>,
        success: impl Into<String>,
        failure: impl Into<String>,
    ) -> Self {
        Self {
            request: request.into(),
            success: success.into(),
            failure: failure.into(),
        }
    }

    /// The action type announcing a request was started
    ///
    /// Also the key under which this request's slots are stored.
    #[must_use]
    pub fn request(&self) -> &str {
        &self.request
    }

    /// The action type announcing a request succeeded
    #[must_use]
    pub fn success(&self) -> &str {
        &self.success
    }

    /// The action type announcing a request failed
    #[must_use]
    pub fn failure(&self) -> &str {
        &self.failure
    }

    /// The action type matching a lifecycle state
    #[must_use]
    pub fn action_type(&self, state: RequestState) -> &str {
        match state {
            RequestState::Request => &self.request,
            RequestState::Success => &self.success,
            RequestState::Failure => &self.failure,
        }
    }
}

/// Derive an action set from a base action name
///
/// Shorthand for [`ActionSet::new`].
#[must_use]
pub fn make_action_set(name: &str) -> ActionSet {
    ActionSet::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_make_action_set_suffixes_name() {
        let set = make_action_set("FETCH_USER");

        assert_eq!(set.request(), "FETCH_USER_REQUEST");
        assert_eq!(set.success(), "FETCH_USER_SUCCESS");
        assert_eq!(set.failure(), "FETCH_USER_FAILURE");
    }

    #[test]
    fn test_action_type_by_state() {
        let set = make_action_set("LOAD");

        assert_eq!(set.action_type(RequestState::Request), "LOAD_REQUEST");
        assert_eq!(set.action_type(RequestState::Success), "LOAD_SUCCESS");
        assert_eq!(set.action_type(RequestState::Failure), "LOAD_FAILURE");
    }

    #[test]
    fn test_serializes_with_upper_case_keys() {
        let json = serde_json::to_value(make_action_set("X")).ok();

        assert_eq!(
            json,
            Some(serde_json::json!({
                "REQUEST": "X_REQUEST",
                "SUCCESS": "X_SUCCESS",
                "FAILURE": "X_FAILURE",
            }))
        );
    }

    proptest! {
        #[test]
        fn prop_members_are_distinct_and_derived(name in ".*") {
            let set = make_action_set(&name);

            prop_assert_eq!(set.request(), format!("{name}_REQUEST"));
            prop_assert_eq!(set.success(), format!("{name}_SUCCESS"));
            prop_assert_eq!(set.failure(), format!("{name}_FAILURE"));
            prop_assert_ne!(set.request(), set.success());
            prop_assert_ne!(set.success(), set.failure());
            prop_assert_ne!(set.request(), set.failure());
            prop_assert_eq!(set, make_action_set(&name));
        }
    }
}
