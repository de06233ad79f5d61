//! Extraction functions: `__regexp`, `__jsonpath`, `__jquery`.
//!
//! These run the corresponding extraction backends over an argument string
//! instead of a response body, so already-extracted values can be queried
//! further. As with backend extraction, no-match yields an empty string;
//! only malformed query syntax is an error.

use crate::expression::error::EvalError;
use crate::extraction::dom::Document;
use crate::extraction::selector::Selector;
use crate::extraction::{jsonpath, regexp};

/// `__regexp(value, pattern)`: first capture group of the first match.
pub(super) fn regexp(args: &[String]) -> Result<String, EvalError> {
    let candidates = regexp::extract(&args[0], &args[1]).map_err(|message| {
        EvalError::InvalidArgument {
            function: "__regexp".to_string(),
            message,
        }
    })?;
    Ok(candidates.into_iter().next().unwrap_or_default())
}

/// `__jsonpath(value, query)`: queries a JSON-valued argument. A value
/// that is not JSON, like a query that matches nothing, yields empty.
pub(super) fn jsonpath(args: &[String]) -> Result<String, EvalError> {
    let segments =
        jsonpath::parse_segments(&args[1]).map_err(|message| EvalError::InvalidArgument {
            function: "__jsonpath".to_string(),
            message,
        })?;

    let parsed = match serde_json::from_str(&args[0]) {
        Ok(value) => value,
        Err(_) => return Ok(String::new()),
    };

    Ok(jsonpath::evaluate(&parsed, &segments)
        .map(jsonpath::value_to_string)
        .unwrap_or_default())
}

/// `__jquery(value, selector[, attribute])`: first selector match over a
/// markup-valued argument, returning the attribute value or the element
/// text.
pub(super) fn jquery(args: &[String]) -> Result<String, EvalError> {
    let selector = Selector::parse(&args[1]).map_err(|e| EvalError::InvalidArgument {
        function: "__jquery".to_string(),
        message: e.message,
    })?;

    let document = Document::parse(&args[0]);
    let matches = selector.select(&document);

    let value = match args.get(2) {
        Some(attribute) => matches
            .iter()
            .find_map(|element| element.attr(attribute))
            .map(str::to_string),
        None => matches.first().map(|element| element.text()),
    };
    Ok(value.unwrap_or_default())
}
