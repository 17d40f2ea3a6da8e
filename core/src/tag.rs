//! Tags distinguish concurrent instances of the same request type.
//!
//! A missing tag is stored under [`DEFAULT_TAG`], so every call site that
//! omits a tag shares one slot.

/// The tag used when none is given
pub const DEFAULT_TAG: &str = "";

/// Resolve an optional tag to its storage key
#[must_use]
pub fn normalize_tag(tag: Option<&str>) -> &str {
    tag.unwrap_or(DEFAULT_TAG)
}
