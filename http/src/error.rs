//! Error types for the HTTP executor

use thiserror::Error;

/// Errors raised while building an [`HttpExecutor`](crate::HttpExecutor)
#[derive(Debug, Error)]
pub enum HttpConfigError {
    /// The base URL does not parse as an absolute URL
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The configured value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A default header name or value is not valid HTTP
    #[error("Invalid header {name:?}")]
    InvalidHeader {
        /// The offending header name
        name: String,
    },

    /// The underlying HTTP client could not be created
    #[error("HTTP client failed to build: {0}")]
    Client(String),
}
