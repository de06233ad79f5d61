//! Textual functions.
//!
//! String lengths and slice indices count characters, not bytes, so
//! multi-byte values extracted from real responses behave predictably.

use super::truncated_int;
use crate::expression::error::EvalError;
use crate::expression::evaluator::parse_number;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value as JsonValue;

/// Characters kept verbatim by `__encode_url`, matching URI component
/// encoding: unreserved marks stay, everything else is percent-escaped.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `__usd(amount)`: formats a number as US dollars with thousands
/// separators and two decimal places, e.g. `1234.5` → `$1,234.50`.
pub(super) fn usd(args: &[String]) -> Result<String, EvalError> {
    let amount = parse_number(&args[0])?;
    let negative = amount < 0.0;
    let rounded = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some(parts) => parts,
        None => (rounded.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    Ok(format!("{}${}.{}", sign, grouped, frac_part))
}

/// `__length(value)`: number of characters.
pub(super) fn length(args: &[String]) -> Result<String, EvalError> {
    Ok(args[0].chars().count().to_string())
}

/// `__array_length(array)`: number of elements in a JSON array string.
pub(super) fn array_length(args: &[String]) -> Result<String, EvalError> {
    match serde_json::from_str::<JsonValue>(&args[0]) {
        Ok(JsonValue::Array(items)) => Ok(items.len().to_string()),
        _ => Err(EvalError::InvalidArgument {
            function: "__array_length".to_string(),
            message: format!("'{}' is not a JSON array", args[0]),
        }),
    }
}

/// `__escape_regexp(value)`: escapes regular-expression metacharacters.
pub(super) fn escape_regexp(args: &[String]) -> Result<String, EvalError> {
    Ok(regex::escape(&args[0]))
}

/// `__encode_url(value)`: percent-encodes a URI component.
pub(super) fn encode_url(args: &[String]) -> Result<String, EvalError> {
    Ok(utf8_percent_encode(&args[0], URL_COMPONENT).to_string())
}

/// `__decode_url(value)`: reverses percent-encoding.
pub(super) fn decode_url(args: &[String]) -> Result<String, EvalError> {
    percent_decode_str(&args[0])
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| EvalError::InvalidArgument {
            function: "__decode_url".to_string(),
            message: format!("not valid UTF-8 after decoding: {}", e),
        })
}

/// `__escape_quotes(value)`: backslash-escapes double quotes (and
/// backslashes) so the value can be embedded in a JSON string.
pub(super) fn escape_quotes(args: &[String]) -> Result<String, EvalError> {
    Ok(args[0].replace('\\', "\\\\").replace('"', "\\\""))
}

pub(super) fn lower(args: &[String]) -> Result<String, EvalError> {
    Ok(args[0].to_lowercase())
}

pub(super) fn upper(args: &[String]) -> Result<String, EvalError> {
    Ok(args[0].to_uppercase())
}

/// `__slice(value, start[, end])`: half-open character interval with
/// zero-based indices. Negative indices count from the end; the end index
/// defaults to the length of the value.
pub(super) fn slice(args: &[String]) -> Result<String, EvalError> {
    let chars: Vec<char> = args[0].chars().collect();
    let len = chars.len() as i64;

    let start = clamp_index(truncated_int("__slice", &args[1])?, len);
    let end = match args.get(2) {
        Some(raw) => clamp_index(truncated_int("__slice", raw)?, len),
        None => len,
    };

    if start >= end {
        return Ok(String::new());
    }
    Ok(chars[start as usize..end as usize].iter().collect())
}

fn clamp_index(index: i64, len: i64) -> i64 {
    if index < 0 {
        (len + index).max(0)
    } else {
        index.min(len)
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::EvalError;
    use crate::functions::call;

    fn f(name: &str, args: &[&str]) -> Result<String, EvalError> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        call(name, &owned)
    }

    #[test]
    fn test_usd() {
        assert_eq!(f("__usd", &["1234.5"]).unwrap(), "$1,234.50");
        assert_eq!(f("__usd", &["0"]).unwrap(), "$0.00");
        assert_eq!(f("__usd", &["999"]).unwrap(), "$999.00");
        assert_eq!(f("__usd", &["1000000"]).unwrap(), "$1,000,000.00");
        assert_eq!(f("__usd", &["-42.5"]).unwrap(), "-$42.50");
        assert!(f("__usd", &["soon"]).is_err());
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(f("__length", &[""]).unwrap(), "0");
        assert_eq!(f("__length", &["hello"]).unwrap(), "5");
        assert_eq!(f("__length", &["héllo"]).unwrap(), "5");
    }

    #[test]
    fn test_array_length() {
        assert_eq!(f("__array_length", &["[]"]).unwrap(), "0");
        assert_eq!(f("__array_length", &[r#"[1,2,3]"#]).unwrap(), "3");
        assert!(f("__array_length", &["{}"]).is_err());
        assert!(f("__array_length", &["nope"]).is_err());
    }

    #[test]
    fn test_escape_regexp() {
        assert_eq!(f("__escape_regexp", &["a.b*c"]).unwrap(), r"a\.b\*c");
        assert_eq!(f("__escape_regexp", &["plain"]).unwrap(), "plain");
    }

    #[test]
    fn test_encode_decode_url() {
        assert_eq!(
            f("__encode_url", &["a b&c=d"]).unwrap(),
            "a%20b%26c%3Dd"
        );
        assert_eq!(f("__encode_url", &["safe-._~"]).unwrap(), "safe-._~");
        assert_eq!(f("__decode_url", &["a%20b%26c"]).unwrap(), "a b&c");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let original = "user@example.com/path?q=1 2";
        let encoded = f("__encode_url", &[original]).unwrap();
        assert_eq!(f("__decode_url", &[&encoded]).unwrap(), original);
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(
            f("__escape_quotes", &[r#"say "hi""#]).unwrap(),
            r#"say \"hi\""#
        );
        assert_eq!(f("__escape_quotes", &[r"a\b"]).unwrap(), r"a\\b");
    }

    #[test]
    fn test_lower_upper() {
        assert_eq!(f("__lower", &["MiXeD"]).unwrap(), "mixed");
        assert_eq!(f("__upper", &["MiXeD"]).unwrap(), "MIXED");
    }

    #[test]
    fn test_slice_half_open() {
        assert_eq!(f("__slice", &["abcdef", "1", "4"]).unwrap(), "bcd");
        assert_eq!(f("__slice", &["abcdef", "0", "0"]).unwrap(), "");
        assert_eq!(f("__slice", &["abcdef", "2"]).unwrap(), "cdef");
    }

    #[test]
    fn test_slice_negative_and_out_of_range() {
        assert_eq!(f("__slice", &["abcdef", "-2"]).unwrap(), "ef");
        assert_eq!(f("__slice", &["abcdef", "0", "-1"]).unwrap(), "abcde");
        assert_eq!(f("__slice", &["abcdef", "4", "100"]).unwrap(), "ef");
        assert_eq!(f("__slice", &["abcdef", "5", "2"]).unwrap(), "");
    }

    #[test]
    fn test_slice_non_numeric_index() {
        assert!(f("__slice", &["abcdef", "x"]).is_err());
    }
}
