//! Lifecycle states of a single request slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a request is in its lifecycle
///
/// A slot with no state (`None`) has never been observed or was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestState {
    /// The request is in flight
    Request,
    /// The request completed successfully
    Success,
    /// The request failed
    Failure,
}

impl RequestState {
    /// Wire name of the state (`"REQUEST"`, `"SUCCESS"` or `"FAILURE"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
