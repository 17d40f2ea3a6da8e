//! Request outcomes as delivered by a [`RequestExecutor`](crate::executor::RequestExecutor).
//!
//! Slots store the full [`Outcome`] of a settled request. Success and failure
//! are separate variants, so reading error data never has to guess at the
//! shape of a stored payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A response received from the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Decoded response body (`Value::Null` when empty)
    #[serde(default)]
    pub body: Value,
}

impl Response {
    /// Create a response with no headers
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    /// Create a `200 OK` response
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Whether the status is in the 2xx range
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decode the body into a concrete type
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Broad category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request never produced a response (connection, DNS, TLS)
    Network,
    /// A response arrived with a non-success status
    Status,
    /// A response arrived but could not be read
    Decode,
    /// The request could not be built
    InvalidRequest,
    /// Anything else
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Status => "status",
            Self::Decode => "decode",
            Self::InvalidRequest => "invalid request",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failed request
///
/// Carries the response when the server answered with an error status.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct RequestError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human readable description
    pub message: String,
    /// The error response, if one was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
}

impl RequestError {
    /// Create an error without a response
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
        }
    }

    /// A failure before any response was received
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// A response with a non-success status
    #[must_use]
    pub fn status(response: Response) -> Self {
        Self {
            kind: ErrorKind::Status,
            message: format!("request failed with status code {}", response.status),
            response: Some(response),
        }
    }

    /// A response whose body could not be read
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// A request that could not be built
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Attach the response that came with the failure
    #[must_use]
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    /// Status code of the error response, if any
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status)
    }

    /// Body of the error response, if any
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.response.as_ref().map(|response| &response.body)
    }

    /// Decode the error response body into a concrete type
    ///
    /// Returns `None` when there is no response.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body does not match `T`.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.response.as_ref().map(Response::json)
    }
}

/// How a request settled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// The transport returned a response
    Success(Response),
    /// The transport failed
    Failure(RequestError),
}

impl Outcome {
    /// The response, if the request succeeded
    #[must_use]
    pub const fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Success(response) => Some(response),
            Self::Failure(_) => None,
        }
    }

    /// The error, if the request failed
    #[must_use]
    pub const fn as_error(&self) -> Option<&RequestError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Self::Success(response)
    }
}

impl From<RequestError> for Outcome {
    fn from(error: RequestError) -> Self {
        Self::Failure(error)
    }
}

impl From<Result<Response, RequestError>> for Outcome {
    fn from(result: Result<Response, RequestError>) -> Self {
        match result {
            Ok(response) => Self::Success(response),
            Err(error) => Self::Failure(error),
        }
    }
}
