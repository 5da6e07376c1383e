//! Candidate generation and first-match lookup.
//!
//! # Responsibilities
//! - Expand a hostname into its wildcard candidates
//! - Expand a path into its prefix candidates
//! - Fetch all candidates in one round trip and pick the most specific hit
//!
//! # Design Decisions
//! - Hostnames are case-insensitive and lowercased before expansion
//! - Paths are case-sensitive
//! - Candidates are ordered most specific first; the first non-empty value wins
//! - No regex: candidate keys are plain strings looked up by exact field

use std::time::Duration;

use crate::error::{RouteError, Stage};
use crate::resilience::timeouts::bounded;
use crate::routing::rule::Rule;
use crate::store::RuleStore;

/// Lookup keys for a hostname, most specific first.
///
/// `app.example.com` yields `app.example.com.`, `*.app.example.com.`,
/// `*.example.com.`, `*.com.`, `*.`.
pub fn domain_candidates(hostname: &str) -> Vec<String> {
    let hostname = hostname.to_lowercase();
    let mut labels: Vec<&str> = hostname.split('.').collect();
    if labels.last() == Some(&"") {
        labels.pop();
    }

    let mut candidates = Vec::with_capacity(labels.len() + 2);
    candidates.push(format!("{}.", labels.join(".")));
    for start in 0..labels.len() {
        candidates.push(format!("*.{}.", labels[start..].join(".")));
    }
    candidates.push("*.".to_string());
    candidates
}

/// Lookup keys for a path, most specific first.
///
/// `/v1/x` yields `/v1/x`, `/v1/x/*`, `/v1/*`, `/*`.
pub fn path_candidates(path: &str) -> Vec<String> {
    let mut segments: Vec<&str> = path.split('/').collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    if segments.is_empty() {
        segments.push("");
    }

    let mut candidates = Vec::with_capacity(segments.len() + 1);
    candidates.push(path.to_string());
    for end in (1..=segments.len()).rev() {
        candidates.push(format!("{}/*", segments[..end].join("/")));
    }
    candidates
}

/// First candidate, in order, whose value is present and non-empty.
pub fn first_match<'a>(
    candidates: &'a [String],
    values: &'a [Option<String>],
) -> Option<(&'a str, &'a str)> {
    candidates
        .iter()
        .zip(values.iter())
        .find_map(|(candidate, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((candidate.as_str(), v)),
            _ => None,
        })
}

/// Fetch `candidates` from the rule hash `key` and decode the winning rule.
///
/// Returns the matched pattern with its rule, or `RuleNotFound` naming
/// `subject`.
pub async fn lookup_rule(
    store: &dyn RuleStore,
    key: &str,
    candidates: &[String],
    lookup_timeout: Duration,
    stage: Stage,
    subject: &str,
) -> Result<(String, Rule), RouteError> {
    let values = bounded(lookup_timeout, store.hash_get_many(key, candidates))
        .await
        .map_err(RouteError::store(stage))?;

    let (pattern, raw) = first_match(candidates, &values).ok_or_else(|| RouteError::RuleNotFound {
        stage,
        subject: subject.to_string(),
    })?;

    let rule = Rule::parse(raw).map_err(|reason| RouteError::MalformedEntry {
        key: format!("{} {}", key, pattern),
        reason,
    })?;

    tracing::trace!(stage = %stage, subject = %subject, pattern = %pattern, rule_id = %rule.id, "Rule matched");
    Ok((pattern.to_string(), rule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_candidates_order() {
        assert_eq!(
            domain_candidates("app.example.com"),
            vec![
                "app.example.com.",
                "*.app.example.com.",
                "*.example.com.",
                "*.com.",
                "*.",
            ]
        );
    }

    #[test]
    fn test_domain_candidates_trailing_dot_and_case() {
        assert_eq!(domain_candidates("Example.COM."), domain_candidates("example.com"));
        assert_eq!(
            domain_candidates("localhost"),
            vec!["localhost.", "*.localhost.", "*."]
        );
    }

    #[test]
    fn test_path_candidates_order() {
        assert_eq!(path_candidates("/v1/x"), vec!["/v1/x", "/v1/x/*", "/v1/*", "/*"]);
        assert_eq!(path_candidates("/v1/x/"), vec!["/v1/x/", "/v1/x/*", "/v1/*", "/*"]);
        assert_eq!(path_candidates("/"), vec!["/", "/*"]);
    }

    #[test]
    fn test_first_match_skips_empty_values() {
        let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values = vec![None, Some(String::new()), Some("rule".to_string())];
        assert_eq!(first_match(&candidates, &values), Some(("c", "rule")));

        let values = vec![None, None, None];
        assert_eq!(first_match(&candidates, &values), None);
    }

    #[test]
    fn test_first_match_prefers_most_specific() {
        let candidates = domain_candidates("app.example.com");
        let mut values = vec![None; candidates.len()];
        values[2] = Some("specific".to_string());
        values[4] = Some("global".to_string());
        assert_eq!(
            first_match(&candidates, &values),
            Some(("*.example.com.", "specific"))
        );
    }
}
