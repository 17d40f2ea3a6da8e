//! Lifecycle actions and their flux-standard-action wire form.
//!
//! Two kinds of action exist:
//!
//! - **Raw transport actions**, typed after the request's [`ActionSet`]
//!   (`<NAME>_REQUEST`, `<NAME>_SUCCESS`, `<NAME>_FAILURE`). They exist for
//!   subscribers; the responses reducer ignores them.
//! - **Control actions**, [`REQUEST_STATE`] and [`RESET_REQUEST_STATE`], which
//!   the responses reducer folds into [`ResponsesState`](crate::state::ResponsesState).
//!
//! # Wire catalogue
//!
//! | type | fields |
//! |---|---|
//! | `<NAME>_REQUEST` | `meta` |
//! | `<NAME>_SUCCESS` | `payload` (response), `meta` |
//! | `<NAME>_FAILURE` | `payload` (error), `meta`, `error: true` |
//! | `REQUEST_STATE` | `payload: { actionSet, requestState, data, tag }` |
//! | `RESET_REQUEST_STATE` | `payload: { actionSet, tag }` |

use crate::action_set::ActionSet;
use crate::meta::RequestMeta;
use crate::outcome::{Outcome, RequestError, Response};
use crate::request_state::RequestState;
use crate::tag::normalize_tag;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Action type that records a lifecycle transition
pub const REQUEST_STATE: &str = "REQUEST_STATE";

/// Action type that clears a slot
pub const RESET_REQUEST_STATE: &str = "RESET_REQUEST_STATE";

/// Payload of a [`REQUEST_STATE`] action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRequestState {
    /// The request type
    pub action_set: ActionSet,
    /// The state to record
    pub request_state: RequestState,
    /// The outcome to record (`None` while pending)
    pub data: Option<Outcome>,
    /// Slot tag, already normalized
    #[serde(default, deserialize_with = "deserialize_tag")]
    pub tag: String,
}

/// Payload of a [`RESET_REQUEST_STATE`] action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestState {
    /// The request type
    pub action_set: ActionSet,
    /// Slot tag, already normalized
    #[serde(default, deserialize_with = "deserialize_tag")]
    pub tag: String,
}

/// Every action emitted over a request's lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum RequestAction {
    /// `<NAME>_REQUEST`: a request is about to be sent
    Started {
        /// The request type
        action_set: ActionSet,
        /// Tag and caller metadata
        meta: RequestMeta,
    },

    /// `<NAME>_SUCCESS`: the transport returned a response
    Succeeded {
        /// The request type
        action_set: ActionSet,
        /// The response
        response: Response,
        /// Tag and caller metadata
        meta: RequestMeta,
    },

    /// `<NAME>_FAILURE`: the transport failed
    Failed {
        /// The request type
        action_set: ActionSet,
        /// The failure
        error: RequestError,
        /// Tag and caller metadata
        meta: RequestMeta,
    },

    /// [`REQUEST_STATE`]: record a transition in a slot
    SetRequestState(SetRequestState),

    /// [`RESET_REQUEST_STATE`]: clear a slot
    ResetRequestState(ResetRequestState),
}

/// Build a [`REQUEST_STATE`] action
///
/// A missing tag becomes `""`.
///
/// # Example
///
/// ```
/// use request_state_core::action::{set_request_state, RequestAction};
/// use request_state_core::action_set::make_action_set;
/// use request_state_core::request_state::RequestState;
///
/// let action = set_request_state(&make_action_set("FETCH"), RequestState::Request, None, None);
/// assert_eq!(action.action_type(), "REQUEST_STATE");
/// ```
#[must_use]
pub fn set_request_state(
    action_set: &ActionSet,
    request_state: RequestState,
    data: Option<Outcome>,
    tag: Option<&str>,
) -> RequestAction {
    RequestAction::SetRequestState(SetRequestState {
        action_set: action_set.clone(),
        request_state,
        data,
        tag: normalize_tag(tag).to_owned(),
    })
}

/// Build a [`RESET_REQUEST_STATE`] action
///
/// A missing tag becomes `""`.
#[must_use]
pub fn reset_request_state(action_set: &ActionSet, tag: Option<&str>) -> RequestAction {
    RequestAction::ResetRequestState(ResetRequestState {
        action_set: action_set.clone(),
        tag: normalize_tag(tag).to_owned(),
    })
}

impl RequestAction {
    /// The wire `type` of this action
    #[must_use]
    pub fn action_type(&self) -> &str {
        match self {
            Self::Started { action_set, .. } => action_set.request(),
            Self::Succeeded { action_set, .. } => action_set.success(),
            Self::Failed { action_set, .. } => action_set.failure(),
            Self::SetRequestState(_) => REQUEST_STATE,
            Self::ResetRequestState(_) => RESET_REQUEST_STATE,
        }
    }

    /// Whether this action reports an error (`error: true` on the wire)
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The slot tag this action refers to
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Started { meta, .. }
            | Self::Succeeded { meta, .. }
            | Self::Failed { meta, .. } => meta.tag(),
            Self::SetRequestState(payload) => &payload.tag,
            Self::ResetRequestState(payload) => &payload.tag,
        }
    }

    /// Encode as a flux standard action
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if a payload cannot be represented as JSON.
    pub fn to_flux(&self) -> Result<FluxStandardAction, CodecError> {
        let encode = |value: Result<Value, serde_json::Error>| {
            value.map_err(|e| CodecError::Encode(e.to_string()))
        };

        let mut flux = FluxStandardAction::new(self.action_type());
        match self {
            Self::Started { meta, .. } => {
                flux.meta = Some(encode(serde_json::to_value(meta))?);
            },
            Self::Succeeded { response, meta, .. } => {
                flux.payload = Some(encode(serde_json::to_value(response))?);
                flux.meta = Some(encode(serde_json::to_value(meta))?);
            },
            Self::Failed { error, meta, .. } => {
                flux.payload = Some(encode(serde_json::to_value(error))?);
                flux.meta = Some(encode(serde_json::to_value(meta))?);
                flux.error = Some(Value::Bool(true));
            },
            Self::SetRequestState(payload) => {
                flux.payload = Some(encode(serde_json::to_value(payload))?);
            },
            Self::ResetRequestState(payload) => {
                flux.payload = Some(encode(serde_json::to_value(payload))?);
            },
        }
        Ok(flux)
    }

    /// Encode as a JSON value
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if a payload cannot be represented as JSON.
    pub fn to_json(&self) -> Result<Value, CodecError> {
        let flux = self.to_flux()?;
        serde_json::to_value(flux).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Decode a control action from its flux standard form
    ///
    /// Only [`REQUEST_STATE`] and [`RESET_REQUEST_STATE`] can be decoded: the
    /// raw `<NAME>_*` types cannot be told apart from unrelated actions.
    ///
    /// # Errors
    ///
    /// - [`CodecError::UnrecognizedType`] for any other action type
    /// - [`CodecError::InvalidPayload`] if the payload does not match
    pub fn from_flux(flux: &FluxStandardAction) -> Result<Self, CodecError> {
        let payload = flux.payload.as_ref().unwrap_or(&Value::Null);
        let invalid = |e: serde_json::Error| CodecError::InvalidPayload {
            action_type: flux.action_type.clone(),
            reason: e.to_string(),
        };

        match flux.action_type.as_str() {
            REQUEST_STATE => SetRequestState::deserialize(payload)
                .map(Self::SetRequestState)
                .map_err(invalid),
            RESET_REQUEST_STATE => ResetRequestState::deserialize(payload)
                .map(Self::ResetRequestState)
                .map_err(invalid),
            other => Err(CodecError::UnrecognizedType(other.to_owned())),
        }
    }

    /// Decode a control action from arbitrary JSON
    ///
    /// # Errors
    ///
    /// - [`CodecError::NotFluxStandard`] if `value` is not a flux standard action
    /// - any error from [`RequestAction::from_flux`]
    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let flux = FluxStandardAction::try_from(value)?;
        Self::from_flux(&flux)
    }
}

/// A flux standard action: `{ type, payload?, meta?, error? }`
///
/// No other keys are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FluxStandardAction {
    /// The action type
    #[serde(rename = "type")]
    pub action_type: String,
    /// Action payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Action metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Set when the payload is an error
    ///
    /// Any JSON value is accepted on decode; encoding only ever writes `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl FluxStandardAction {
    /// An action with only a type
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            meta: None,
            error: None,
        }
    }

    /// Whether `value` has the shape of a flux standard action
    #[must_use]
    pub fn is_flux_standard(value: &Value) -> bool {
        Self::try_from(value).is_ok()
    }
}

impl TryFrom<&Value> for FluxStandardAction {
    type Error = CodecError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        if !value.is_object() {
            return Err(CodecError::NotFluxStandard("not an object".to_string()));
        }
        Self::deserialize(value).map_err(|e| CodecError::NotFluxStandard(e.to_string()))
    }
}

/// A `null` or missing tag decodes as the default tag
fn deserialize_tag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let tag = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_tag(tag.as_deref()).to_owned())
}

/// Errors converting between [`RequestAction`] and its wire form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value is not a flux standard action
    #[error("Not a flux standard action: {0}")]
    NotFluxStandard(String),

    /// The action type is not a lifecycle control action
    #[error("Unrecognized action type: {0}")]
    UnrecognizedType(String),

    /// The payload does not match the action type
    #[error("Invalid payload for '{action_type}': {reason}")]
    InvalidPayload {
        /// The action type being decoded
        action_type: String,
        /// What went wrong
        reason: String,
    },

    /// A payload could not be encoded
    #[error("Encoding failed: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_set::make_action_set;
    use serde_json::json;

    fn action_set() -> ActionSet {
        ActionSet::from_parts("REQUEST", "SUCCESS", "FAILURE")
    }

    #[test]
    fn test_set_request_state_builds_control_action() {
        let action = set_request_state(
            &action_set(),
            RequestState::Success,
            Some(Outcome::Success(Response::ok(json!("hello")))),
            Some("tag"),
        );

        assert_eq!(action.action_type(), REQUEST_STATE);
        assert_eq!(action.tag(), "tag");
        assert!(!action.is_error());
    }

    #[test]
    fn test_builders_default_tag_to_empty() {
        let set = set_request_state(&action_set(), RequestState::Success, None, None);
        let reset = reset_request_state(&action_set(), None);

        assert_eq!(set.tag(), "");
        assert_eq!(reset.tag(), "");
        assert_eq!(
            reset.to_json().ok(),
            Some(json!({
                "type": "RESET_REQUEST_STATE",
                "payload": {
                    "actionSet": { "REQUEST": "REQUEST", "SUCCESS": "SUCCESS", "FAILURE": "FAILURE" },
                    "tag": "",
                },
            }))
        );
    }

    #[test]
    fn test_raw_actions_wire_shape() {
        let set = make_action_set("FETCH_USER");
        let meta = RequestMeta::tagged("42");

        let started = RequestAction::Started { action_set: set.clone(), meta: meta.clone() };
        assert_eq!(
            started.to_json().ok(),
            Some(json!({ "type": "FETCH_USER_REQUEST", "meta": { "tag": "42" } }))
        );

        let failed = RequestAction::Failed {
            action_set: set,
            error: RequestError::network("timeout"),
            meta,
        };
        assert!(failed.is_error());
        assert_eq!(
            failed.to_json().ok(),
            Some(json!({
                "type": "FETCH_USER_FAILURE",
                "payload": { "kind": "network", "message": "timeout" },
                "meta": { "tag": "42" },
                "error": true,
            }))
        );
    }

    #[test]
    fn test_control_actions_decode_from_wire() {
        let action = set_request_state(
            &make_action_set("FETCH_USER"),
            RequestState::Failure,
            Some(Outcome::Failure(RequestError::network("timeout"))),
            Some("7"),
        );

        let decoded = action
            .to_json()
            .and_then(|json| RequestAction::from_json(&json));
        assert_eq!(decoded, Ok(action));
    }

    #[test]
    fn test_missing_tag_on_wire_defaults_to_empty() {
        let decoded = RequestAction::from_json(&json!({
            "type": "RESET_REQUEST_STATE",
            "payload": { "actionSet": { "REQUEST": "A", "SUCCESS": "B", "FAILURE": "C" } },
        }));

        assert_eq!(decoded.map(|a| a.tag().to_owned()), Ok(String::new()));
    }

    #[test]
    fn test_rejects_non_flux_standard_values() {
        assert!(matches!(
            RequestAction::from_json(&json!("REQUEST_STATE")),
            Err(CodecError::NotFluxStandard(_))
        ));
        assert!(matches!(
            RequestAction::from_json(&json!({ "type": "REQUEST_STATE", "extra": 1 })),
            Err(CodecError::NotFluxStandard(_))
        ));
        assert!(matches!(
            RequestAction::from_json(&json!({ "type": 3 })),
            Err(CodecError::NotFluxStandard(_))
        ));
    }

    #[test]
    fn test_rejects_unrelated_and_malformed_actions() {
        assert_eq!(
            RequestAction::from_json(&json!({ "type": "FETCH_USER_REQUEST" })),
            Err(CodecError::UnrecognizedType("FETCH_USER_REQUEST".to_string()))
        );
        assert!(matches!(
            RequestAction::from_json(&json!({ "type": "REQUEST_STATE", "payload": { "tag": "x" } })),
            Err(CodecError::InvalidPayload { .. })
        ));
        assert!(matches!(
            RequestAction::from_json(&json!({ "type": "REQUEST_STATE" })),
            Err(CodecError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_is_flux_standard() {
        assert!(FluxStandardAction::is_flux_standard(&json!({ "type": "ANYTHING" })));
        assert!(FluxStandardAction::is_flux_standard(
            &json!({ "type": "X", "payload": null, "meta": {}, "error": false })
        ));
        assert!(FluxStandardAction::is_flux_standard(&json!({ "type": "X", "error": "x" })));
        assert!(!FluxStandardAction::is_flux_standard(&json!({ "payload": 1 })));
        assert!(!FluxStandardAction::is_flux_standard(&json!([1, 2])));
    }
}
