//! Request metadata and per-request options.
//!
//! [`RequestMeta`] travels on the raw `<NAME>_REQUEST`/`_SUCCESS`/`_FAILURE`
//! actions. Its `tag` always comes from [`RequestOptions::with_tag`]; a
//! `"tag"` key in the caller's extra metadata is discarded.

use crate::outcome::RequestError;
use crate::tag::normalize_tag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Metadata attached to the raw lifecycle actions
///
/// Serializes flat: `{ "tag": "42", "page": 3 }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default)]
    tag: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RequestMeta {
    /// Build metadata from a tag and caller supplied extras
    ///
    /// Any `"tag"` entry in `extra` is dropped in favour of `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>, mut extra: Map<String, Value>) -> Self {
        extra.remove("tag");
        Self {
            tag: tag.into(),
            extra,
        }
    }

    /// Metadata carrying only a tag
    #[must_use]
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self::new(tag, Map::new())
    }

    /// The request tag (empty when untagged)
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Caller supplied metadata, without the tag
    #[must_use]
    pub const fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Look up one extra metadata value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Decides whether a failed request should be returned as an error
pub type RethrowPredicate = Arc<dyn Fn(&RequestError) -> bool + Send + Sync>;

/// Options for a single driven request
///
/// # Example
///
/// ```
/// use request_state_core::meta::RequestOptions;
///
/// let options = RequestOptions::new()
///     .with_tag("42")
///     .with_meta("page", 3)
///     .with_header("Authorization", "Token abc")
///     .with_should_rethrow(|error| error.status_code() == Some(401));
///
/// assert_eq!(options.meta().tag(), "42");
/// ```
#[derive(Clone, Default)]
pub struct RequestOptions {
    tag: Option<String>,
    meta: Map<String, Value>,
    headers: BTreeMap<String, String>,
    should_rethrow: Option<RethrowPredicate>,
}

impl RequestOptions {
    /// Options with no tag, metadata, headers or rethrow policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag identifying this request instance
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add one metadata entry
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Merge a metadata map
    #[must_use]
    pub fn with_meta_map(mut self, meta: Map<String, Value>) -> Self {
        self.meta.extend(meta);
        self
    }

    /// Add a request header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Return failures matching `predicate` as errors instead of swallowing them
    #[must_use]
    pub fn with_should_rethrow<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestError) -> bool + Send + Sync + 'static,
    {
        self.should_rethrow = Some(Arc::new(predicate));
        self
    }

    /// Return every failure as an error
    #[must_use]
    pub fn always_rethrow(self) -> Self {
        self.with_should_rethrow(|_| true)
    }

    /// The tag, normalized (empty when unset)
    #[must_use]
    pub fn tag(&self) -> &str {
        normalize_tag(self.tag.as_deref())
    }

    /// Request headers supplied by the caller
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Metadata for the raw lifecycle actions
    #[must_use]
    pub fn meta(&self) -> RequestMeta {
        RequestMeta::new(self.tag(), self.meta.clone())
    }

    /// Whether `error` should be returned to the caller
    #[must_use]
    pub fn should_rethrow(&self, error: &RequestError) -> bool {
        self.should_rethrow
            .as_ref()
            .is_some_and(|predicate| predicate(error))
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("tag", &self.tag)
            .field("meta", &self.meta)
            .field("headers", &self.headers)
            .field("should_rethrow", &self.should_rethrow.is_some())
            .finish()
    }
}
