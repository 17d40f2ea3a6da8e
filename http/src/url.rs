//! URL helpers: path normalization, base URL joining and query formatting.

use std::fmt::Display;

/// Whether `url` carries a scheme (`http://...`) and is used as given
#[must_use]
pub fn is_absolute(url: &str) -> bool {
    url.contains("://")
}

/// Normalize a URL path
///
/// Repeated slashes collapse, `.` segments drop, `..` removes the segment
/// before it, and a trailing slash survives. A query string after `?` is
/// left alone. An empty path becomes `.`.
///
/// # Example
///
/// ```
/// use request_state_http::url::normalize_path;
///
/// assert_eq!(normalize_path("/api//users/./42/../"), "/api/users/");
/// assert_eq!(normalize_path("api/users?page=2"), "api/users?page=2");
/// ```
#[must_use]
pub fn normalize_path(url: &str) -> String {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    let rooted = path.starts_with('/');
    let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                },
                _ if rooted => {},
                _ => segments.push(".."),
            },
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(url.len());
    if rooted {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if trailing && !segments.is_empty() {
        normalized.push('/');
    }
    if normalized.is_empty() {
        normalized.push('.');
    }
    if let Some(query) = query {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}

/// Resolve the URL a request is sent to
///
/// Absolute URLs are returned unchanged. Anything else is normalized and
/// appended to `base_url` with exactly one slash between them. Without a
/// base URL the normalized path is returned as is.
#[must_use]
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    if is_absolute(url) {
        return url.to_owned();
    }

    let path = normalize_path(url);
    match base_url {
        Some(base) => {
            let path = path.strip_prefix("./").unwrap_or(&path);
            let path = if path == "." { "" } else { path };
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        },
        None => path,
    }
}

/// Build a query string from optional parameters
///
/// Parameters whose value is `None` are skipped. Returns `""` when nothing
/// remains, otherwise `?key=value&...` in the given order. Values are
/// written with `Display` and not percent-encoded.
///
/// This is a standalone formatter for callers building URLs by hand.
/// [`HttpExecutor`](crate::HttpExecutor) sends `GET` data through reqwest's
/// own query encoding instead.
///
/// # Example
///
/// ```
/// use request_state_http::url::format_query_params;
///
/// assert_eq!(format_query_params(&[("page", Some(2)), ("size", None)]), "?page=2");
/// assert_eq!(format_query_params::<&str, u8>(&[("page", None)]), "");
/// ```
#[must_use]
pub fn format_query_params<K, V>(params: &[(K, Option<V>)]) -> String
where
    K: Display,
    V: Display,
{
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|value| format!("{key}={value}")))
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
