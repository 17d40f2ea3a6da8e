//! Configuration for the HTTP executor.

use std::collections::BTreeMap;

/// Environment variable read by [`HttpConfig::from_env`] for the base URL
pub const BASE_URL_ENV: &str = "REQUEST_STATE_BASE_URL";

/// Environment variable read by [`HttpConfig::from_env`] for the CSRF token
pub const CSRF_TOKEN_ENV: &str = "REQUEST_STATE_CSRF_TOKEN";

/// Header the CSRF token is sent in
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Settings shared by every request an executor sends
///
/// # Example
///
/// ```
/// use request_state_http::HttpConfig;
///
/// let config = HttpConfig::default()
///     .with_base_url("http://localhost:8000")
///     .with_csrf_token("abc")
///     .with_default_header("X-Client", "demo");
///
/// assert_eq!(config.headers().get("X-CSRFToken").map(String::as_str), Some("abc"));
/// assert_eq!(config.headers().get("Accept").map(String::as_str), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Prefix for every URL that is not absolute
    pub base_url: Option<String>,
    /// Headers sent with every request unless the request overrides them
    pub default_headers: BTreeMap<String, String>,
    /// Sent as `X-CSRFToken` when set
    pub csrf_token: Option<String>,
}

impl HttpConfig {
    /// Create a configuration with the standard JSON headers
    #[must_use]
    pub fn new() -> Self {
        let default_headers = [
            ("Accept", "application/json"),
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-cache"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect();

        Self {
            base_url: None,
            default_headers,
            csrf_token: None,
        }
    }

    /// Load from `REQUEST_STATE_BASE_URL` and `REQUEST_STATE_CSRF_TOKEN`
    ///
    /// Unset or empty variables leave the setting empty.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());

        let mut config = Self::new();
        config.base_url = read(BASE_URL_ENV);
        config.csrf_token = read(CSRF_TOKEN_ENV);
        config
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the CSRF token
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Add or replace a default header
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Every header sent by default, the CSRF header included
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = self.default_headers.clone();
        if let Some(token) = &self.csrf_token {
            headers.insert(CSRF_HEADER.to_owned(), token.clone());
        }
        headers
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}
