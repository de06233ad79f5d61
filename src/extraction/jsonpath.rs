//! JSONPath-style queries over parsed JSON values.
//!
//! The supported grammar is the dotted-path subset produced by recorded
//! scenarios: object fields separated by dots and array indices in
//! brackets, e.g. `post.id`, `$.data.items[0].name`. A leading `$` or `$.`
//! is accepted and ignored, so both the classic form and the bare form
//! address the same value. The EDN backend reuses this module unchanged.

use serde_json::Value as JsonValue;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSegment {
    /// Object field access, e.g. `user`
    Field(String),

    /// Array index access, e.g. `[0]`
    Index(usize),
}

/// Parses a query string into path segments.
///
/// # Errors
///
/// Returns a message when brackets are unbalanced or an index is not a
/// non-negative integer. Malformed queries are hard failures upstream,
/// unlike queries that simply match nothing.
pub(crate) fn parse_segments(path: &str) -> Result<Vec<PathSegment>, String> {
    let path = path.trim();
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Field(std::mem::take(&mut current)));
                }

                let mut index_str = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    index_str.push(next);
                }
                if !closed {
                    return Err(format!("unclosed '[' in '{}'", path));
                }
                let index: usize = index_str
                    .trim()
                    .parse()
                    .map_err(|_| format!("'{}' is not a valid array index", index_str))?;
                segments.push(PathSegment::Index(index));
            }
            ']' => return Err(format!("unmatched ']' in '{}'", path)),
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Field(current));
    }

    Ok(segments)
}

/// Walks the segments down a JSON value. `None` means no match, which is
/// never an error for extraction.
pub(crate) fn evaluate<'a>(json: &'a JsonValue, segments: &[PathSegment]) -> Option<&'a JsonValue> {
    let mut current = json;
    for segment in segments {
        current = match segment {
            PathSegment::Field(name) => current.get(name)?,
            PathSegment::Index(index) => current.get(index)?,
        };
    }
    Some(current)
}

/// Renders an extracted JSON value as a parameter string: strings are
/// unquoted, scalars use their literal form, arrays and objects serialize
/// compactly.
pub(crate) fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(json: &JsonValue, path: &str) -> Option<String> {
        let segments = parse_segments(path).unwrap();
        evaluate(json, &segments).map(value_to_string)
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            parse_segments("user.name").unwrap(),
            vec![
                PathSegment::Field("user".to_string()),
                PathSegment::Field("name".to_string())
            ]
        );
        assert_eq!(
            parse_segments("items[0].id").unwrap(),
            vec![
                PathSegment::Field("items".to_string()),
                PathSegment::Index(0),
                PathSegment::Field("id".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_segments_dollar_prefix_optional() {
        assert_eq!(
            parse_segments("$.post.id").unwrap(),
            parse_segments("post.id").unwrap()
        );
        assert_eq!(parse_segments("$").unwrap(), vec![]);
        assert_eq!(parse_segments("").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_segments_malformed() {
        assert!(parse_segments("items[0").is_err());
        assert!(parse_segments("items]0[").is_err());
        assert!(parse_segments("items[abc]").is_err());
        assert!(parse_segments("items[-1]").is_err());
    }

    #[test]
    fn test_evaluate_simple_and_nested() {
        let body = json!({"post": {"id": 123}});
        assert_eq!(query(&body, "post.id").unwrap(), "123");
        assert_eq!(query(&body, "$.post.id").unwrap(), "123");
    }

    #[test]
    fn test_evaluate_array_index() {
        let body = json!({"items": [{"id": 1}, {"id": 2}]});
        assert_eq!(query(&body, "items[1].id").unwrap(), "2");
        assert_eq!(query(&body, "items[2].id"), None);
    }

    #[test]
    fn test_evaluate_root() {
        let body = json!({"ok": true});
        assert_eq!(query(&body, "$").unwrap(), r#"{"ok":true}"#);
    }

    #[test]
    fn test_no_match_is_none() {
        let body = json!({"user": {"id": 1}});
        assert_eq!(query(&body, "user.missing"), None);
        assert_eq!(query(&body, "missing.deeper.still"), None);
    }

    #[test]
    fn test_value_rendering() {
        let body = json!({
            "s": "text",
            "n": 19.99,
            "b": false,
            "z": null,
            "a": [1, 2],
            "o": {"k": "v"}
        });
        assert_eq!(query(&body, "s").unwrap(), "text");
        assert_eq!(query(&body, "n").unwrap(), "19.99");
        assert_eq!(query(&body, "b").unwrap(), "false");
        assert_eq!(query(&body, "z").unwrap(), "null");
        assert_eq!(query(&body, "a").unwrap(), "[1,2]");
        assert_eq!(query(&body, "o").unwrap(), r#"{"k":"v"}"#);
    }
}
