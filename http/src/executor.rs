//! reqwest-backed [`RequestExecutor`].

use crate::config::HttpConfig;
use crate::error::HttpConfigError;
use crate::url::{is_absolute, resolve_url};
use futures::future::BoxFuture;
use request_state_core::executor::{Method, RequestDescriptor, RequestExecutor};
use request_state_core::outcome::{RequestError, Response};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Sends requests over HTTP
///
/// - Default headers from [`HttpConfig`] go out with every request; the
///   request's own headers replace them by name.
/// - Relative URLs are normalized and joined onto the base URL.
/// - `GET` data becomes query parameters, other verbs send it as a JSON body
///   (`{}` when there is none).
/// - A non-2xx answer fails with [`ErrorKind::Status`] and keeps the response.
///
/// [`ErrorKind::Status`]: request_state_core::outcome::ErrorKind::Status
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    base_url: Option<String>,
    default_headers: HeaderMap,
}

impl HttpExecutor {
    /// Create an executor with its own client
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError`] if the base URL or a default header is
    /// invalid, or the client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, HttpConfigError> {
        let client = Client::builder()
            .build()
            .map_err(|e| HttpConfigError::Client(e.to_string()))?;
        Self::with_client(client, config)
    }

    /// Create an executor configured from the environment
    ///
    /// # Errors
    ///
    /// See [`HttpExecutor::new`].
    pub fn from_env() -> Result<Self, HttpConfigError> {
        Self::new(HttpConfig::from_env())
    }

    /// Create an executor around an existing client
    ///
    /// # Errors
    ///
    /// Returns [`HttpConfigError`] if the base URL or a default header is invalid.
    pub fn with_client(client: Client, config: HttpConfig) -> Result<Self, HttpConfigError> {
        if let Some(base_url) = &config.base_url {
            reqwest::Url::parse(base_url).map_err(|e| HttpConfigError::InvalidBaseUrl {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in config.headers() {
            let (header, value) = parse_header(&name, &value)
                .ok_or_else(|| HttpConfigError::InvalidHeader { name: name.clone() })?;
            default_headers.insert(header, value);
        }

        Ok(Self {
            client,
            base_url: config.base_url,
            default_headers,
        })
    }

    /// The base URL relative paths are joined onto
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Send one request
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a relative URL without a base URL, a bad
    ///   header, or `GET` data that is not an object
    /// - `Network` when no response arrived
    /// - `Decode` when the response body could not be read
    /// - `Status` for a non-2xx response
    #[tracing::instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response, RequestError> {
        let url = resolve_url(self.base_url.as_deref(), &request.url);
        if !is_absolute(&url) {
            return Err(RequestError::invalid_request(format!(
                "cannot send to {url}: relative URL and no base URL configured"
            )));
        }

        let mut headers = self.default_headers.clone();
        for (name, value) in &request.headers {
            let (header, value) = parse_header(name, value).ok_or_else(|| {
                RequestError::invalid_request(format!("invalid header {name:?}"))
            })?;
            headers.insert(header, value);
        }

        let builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .headers(headers);

        let builder = if request.method == Method::Get {
            let pairs = query_pairs(request.data.as_ref())?;
            if pairs.is_empty() {
                builder
            } else {
                builder.query(&pairs)
            }
        } else {
            builder.json(&request.data.unwrap_or_else(|| json!({})))
        };

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RequestError::decode(e.to_string()))?;

        let response = Response {
            status,
            headers,
            body: decode_body(&bytes),
        };

        if response.is_success() {
            tracing::debug!(status, "Request succeeded");
            Ok(response)
        } else {
            tracing::debug!(status, "Request failed with error status");
            Err(RequestError::status(response))
        }
    }
}

impl RequestExecutor for HttpExecutor {
    fn execute(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<Response, RequestError>> {
        Box::pin(self.send(request))
    }
}

fn parse_header(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
    let value = HeaderValue::from_str(value).ok()?;
    Some((name, value))
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

/// Query parameters for `GET` data
///
/// `null` entries are skipped; strings go as is, anything else as JSON text.
fn query_pairs(data: Option<&Value>) -> Result<Vec<(String, String)>, RequestError> {
    match data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(params)) => Ok(params
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(text) => Some((key.clone(), text.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()),
        Some(other) => Err(RequestError::invalid_request(format!(
            "GET data must be an object, got {other}"
        ))),
    }
}

/// JSON when the body parses, a JSON string otherwise, `null` when empty
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn transport_error(error: reqwest::Error) -> RequestError {
    if error.is_builder() {
        RequestError::invalid_request(error.to_string())
    } else if error.is_decode() {
        RequestError::decode(error.to_string())
    } else {
        RequestError::network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_nulls() {
        let pairs = query_pairs(Some(&json!({"page": 2, "q": "rust", "tag": null, "ids": [1, 2]})));
        assert_eq!(
            pairs.ok(),
            Some(vec![
                ("ids".to_string(), "[1,2]".to_string()),
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "rust".to_string()),
            ])
        );
        assert_eq!(query_pairs(None).ok(), Some(Vec::new()));
        assert!(query_pairs(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(decode_body(b"<html>"), json!("<html>"));
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let bad_url = HttpExecutor::new(HttpConfig::new().with_base_url("not a url"));
        assert!(matches!(bad_url, Err(HttpConfigError::InvalidBaseUrl { .. })));

        let bad_header = HttpExecutor::new(HttpConfig::new().with_default_header("Bad Header", "x"));
        assert!(matches!(bad_header, Err(HttpConfigError::InvalidHeader { .. })));
    }

    #[tokio::test]
    async fn test_relative_url_without_base_is_invalid() {
        let executor = HttpExecutor::new(HttpConfig::new());
        let Ok(executor) = executor else {
            return;
        };
        let result = executor.send(RequestDescriptor::get("/api/users/")).await;
        assert_eq!(
            result.err().map(|e| e.kind),
            Some(request_state_core::outcome::ErrorKind::InvalidRequest)
        );
    }
}
