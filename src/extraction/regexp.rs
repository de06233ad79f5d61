//! Regular-expression extraction over the raw response text.
//!
//! Each match contributes one candidate: the first declared capture group,
//! or the whole match for patterns without groups. The `selection` field of
//! the query then picks among candidates.

use regex::Regex;

/// Runs a pattern over the body text.
///
/// # Errors
///
/// Returns the regex compilation message for malformed patterns. A
/// malformed query is a hard failure upstream, while an empty candidate
/// list is plain no-match.
pub(crate) fn extract(body: &str, pattern: &str) -> Result<Vec<String>, String> {
    let regex = Regex::new(pattern).map_err(|e| e.to_string())?;

    let candidates = regex
        .captures_iter(body)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
        .collect();

    Ok(candidates)
}
