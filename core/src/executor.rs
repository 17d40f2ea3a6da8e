//! The request executor boundary.
//!
//! The lifecycle core never performs I/O. It asks a [`RequestExecutor`] to
//! carry out a [`RequestDescriptor`] and records whichever way the returned
//! future settles.

use crate::outcome::{RequestError, Response};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// HTTP verb of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `PATCH`
    Patch,
}

impl Method {
    /// The verb as sent on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Absolute URL, or a path resolved by the executor
    pub url: String,
    /// HTTP verb
    pub method: Method,
    /// Request data: query parameters for `GET`, JSON body otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Extra headers, overriding the executor's defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// A request without data or headers
    #[must_use]
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            data: None,
            headers: BTreeMap::new(),
        }
    }

    /// A `GET` request
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::Get)
    }

    /// A `POST` request with a JSON body
    #[must_use]
    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self::new(url, Method::Post).with_data(data)
    }

    /// Set the request data
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add one header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merge several headers
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Performs requests
///
/// The returned future must settle exactly once: `Ok` with the response or
/// `Err` with the failure.
pub trait RequestExecutor: Send + Sync {
    /// Send one request
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<Response, RequestError>>;
}

impl<T: RequestExecutor + ?Sized> RequestExecutor for Arc<T> {
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<Response, RequestError>> {
        (**self).execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_builders() {
        let request = RequestDescriptor::post("/api/users/", json!({"name": "Ada"}))
            .with_header("X-One", "1")
            .with_headers([("X-Two", "2")]);

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.data, Some(json!({"name": "Ada"})));
        assert_eq!(request.headers.len(), 2);
        assert_eq!(RequestDescriptor::get("/").method.to_string(), "GET");
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(serde_json::to_value(Method::Patch).ok(), Some(json!("PATCH")));
        assert_eq!(Method::Options.as_str(), "OPTIONS");
    }
}
