//! Cache-version tagging of entity tags.
//!
//! Responses leaving the router carry `ETag: <backend tag>--c<version>` so a
//! bump of the application's cache version invalidates every client cache.
//! Conditional requests coming back in have the current version's suffix
//! removed before they reach the backend, which only knows its own tags;
//! tags from earlier versions pass through untouched and never match.

const SUFFIX_MARKER: &str = "--c";

/// Rewrite applied by the transport to a backend `ETag` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtagRewrite {
    /// Append the suffix inside the tag's quotes.
    AppendSuffix(String),
}

impl EtagRewrite {
    /// Rule for an application's current cache version.
    pub fn for_cache_version(version: &str) -> Self {
        EtagRewrite::AppendSuffix(format!("{}{}", SUFFIX_MARKER, version))
    }

    pub fn apply(&self, etag: &str) -> String {
        match self {
            EtagRewrite::AppendSuffix(suffix) => {
                if etag.len() >= 2 && etag.ends_with('"') {
                    let (body, quote) = etag.split_at(etag.len() - 1);
                    format!("{}{}{}", body, suffix, quote)
                } else {
                    format!("{}{}", etag, suffix)
                }
            }
        }
    }
}

/// Remove the current cache version's suffix from every tag of an
/// `If-None-Match` value.
///
/// Tags carrying any other version are left as they are, so the backend
/// never matches a validator issued before the last cache version bump.
pub fn strip_cache_version(header: &str, version: &str) -> String {
    let suffix = format!("{}{}", SUFFIX_MARKER, version);
    header
        .split(',')
        .map(|tag| strip_tag(tag.trim(), &suffix))
        .collect::<Vec<_>>()
        .join(", ")
}

fn strip_tag(tag: &str, suffix: &str) -> String {
    let (weak, rest) = match tag.strip_prefix("W/") {
        Some(rest) => ("W/", rest),
        None => ("", tag),
    };

    let quoted = rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"');
    let inner = if quoted { &rest[1..rest.len() - 1] } else { rest };

    let Some(stripped) = inner.strip_suffix(suffix) else {
        return tag.to_string();
    };

    if quoted {
        format!("{}\"{}\"", weak, stripped)
    } else {
        format!("{}{}", weak, stripped)
    }
}
