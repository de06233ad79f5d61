//! EDN (extensible data notation) reading for the `edn` backend.
//!
//! Clojure services answer with keyword-map structures like
//! `{:post {:id 123}}`. The reader turns that into a JSON-shaped tree so
//! the JSONPath module can address it with the same query syntax; map keys
//! keep their leading colon, so the query for the example above is
//! `:post.:id`.
//!
//! The supported surface is the data subset real responses use: nil,
//! booleans, numbers, strings, keywords, symbols, vectors, lists, sets,
//! maps, and tagged literals (whose tag is skipped). Commas are whitespace.

use serde_json::{Map, Number, Value as JsonValue};

/// Parses EDN text into a JSON-shaped value.
///
/// # Errors
///
/// Returns a message for truncated or unbalanced input. Callers treat a
/// body that fails to parse as no-match, not as a failure; the body simply
/// is not EDN.
pub(crate) fn parse(input: &str) -> Result<JsonValue, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    skip_whitespace(&chars, &mut pos);
    let value = parse_value(&chars, &mut pos)?;
    skip_whitespace(&chars, &mut pos);
    if pos != chars.len() {
        return Err(format!("trailing characters at offset {}", pos));
    }
    Ok(value)
}

fn parse_value(chars: &[char], pos: &mut usize) -> Result<JsonValue, String> {
    match chars.get(*pos) {
        None => Err("unexpected end of input".to_string()),
        Some('{') => parse_map(chars, pos),
        Some('[') => parse_sequence(chars, pos, ']'),
        Some('(') => parse_sequence(chars, pos, ')'),
        Some('"') => parse_string(chars, pos).map(JsonValue::String),
        Some(':') => Ok(JsonValue::String(read_token(chars, pos))),
        Some('\\') => parse_character(chars, pos),
        Some('#') => parse_dispatch(chars, pos),
        Some(_) => parse_scalar(chars, pos),
    }
}

fn parse_map(chars: &[char], pos: &mut usize) -> Result<JsonValue, String> {
    *pos += 1; // {
    let mut map = Map::new();
    loop {
        skip_whitespace(chars, pos);
        match chars.get(*pos) {
            None => return Err("unterminated map".to_string()),
            Some('}') => {
                *pos += 1;
                return Ok(JsonValue::Object(map));
            }
            Some(_) => {
                let key = parse_value(chars, pos)?;
                skip_whitespace(chars, pos);
                if chars.get(*pos) == Some(&'}') {
                    return Err("map has a key without a value".to_string());
                }
                let value = parse_value(chars, pos)?;
                map.insert(key_string(&key), value);
            }
        }
    }
}

fn parse_sequence(chars: &[char], pos: &mut usize, close: char) -> Result<JsonValue, String> {
    *pos += 1; // [ or (
    let mut items = Vec::new();
    loop {
        skip_whitespace(chars, pos);
        match chars.get(*pos) {
            None => return Err(format!("unterminated sequence, expected '{}'", close)),
            Some(c) if *c == close => {
                *pos += 1;
                return Ok(JsonValue::Array(items));
            }
            Some(_) => items.push(parse_value(chars, pos)?),
        }
    }
}

fn parse_string(chars: &[char], pos: &mut usize) -> Result<String, String> {
    *pos += 1; // "
    let mut out = String::new();
    loop {
        match chars.get(*pos) {
            None => return Err("unterminated string".to_string()),
            Some('"') => {
                *pos += 1;
                return Ok(out);
            }
            Some('\\') => {
                *pos += 1;
                match chars.get(*pos) {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => out.push(*other),
                    None => return Err("unterminated escape".to_string()),
                }
                *pos += 1;
            }
            Some(c) => {
                out.push(*c);
                *pos += 1;
            }
        }
    }
}

/// `\c`, `\newline`, `\space`, `\tab` character literals.
fn parse_character(chars: &[char], pos: &mut usize) -> Result<JsonValue, String> {
    *pos += 1; // backslash
    let name = read_token(chars, pos);
    let ch = match name.as_str() {
        "newline" => "\n".to_string(),
        "space" => " ".to_string(),
        "tab" => "\t".to_string(),
        "" => return Err("empty character literal".to_string()),
        other => other.to_string(),
    };
    Ok(JsonValue::String(ch))
}

/// `#{...}` sets and `#tag value` tagged literals.
fn parse_dispatch(chars: &[char], pos: &mut usize) -> Result<JsonValue, String> {
    *pos += 1; // #
    match chars.get(*pos) {
        Some('{') => parse_set(chars, pos),
        Some(c) if c.is_ascii_alphabetic() => {
            // Tagged literal: skip the tag, keep the value.
            read_token(chars, pos);
            skip_whitespace(chars, pos);
            parse_value(chars, pos)
        }
        _ => Err("unsupported dispatch form".to_string()),
    }
}

fn parse_set(chars: &[char], pos: &mut usize) -> Result<JsonValue, String> {
    *pos += 1; // {
    let mut items = Vec::new();
    loop {
        skip_whitespace(chars, pos);
        match chars.get(*pos) {
            None => return Err("unterminated set".to_string()),
            Some('}') => {
                *pos += 1;
                return Ok(JsonValue::Array(items));
            }
            Some(_) => items.push(parse_value(chars, pos)?),
        }
    }
}

fn parse_scalar(chars: &[char], pos: &mut usize) -> Result<JsonValue, String> {
    let token = read_token(chars, pos);
    if token.is_empty() {
        return Err(format!(
            "unexpected character '{}'",
            chars.get(*pos).copied().unwrap_or(' ')
        ));
    }

    match token.as_str() {
        "nil" => return Ok(JsonValue::Null),
        "true" => return Ok(JsonValue::Bool(true)),
        "false" => return Ok(JsonValue::Bool(false)),
        _ => {}
    }

    if looks_numeric(&token) {
        // Integer suffixes (N, M) mark arbitrary precision in EDN.
        let numeric = token.trim_end_matches(['N', 'M']);
        if let Ok(n) = numeric.parse::<i64>() {
            return Ok(JsonValue::Number(n.into()));
        }
        if let Ok(f) = numeric.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return Ok(JsonValue::Number(n));
            }
        }
    }

    // Bare symbols read as their name. Anything stranger is not the data
    // subset responses use.
    if token.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
        Ok(JsonValue::String(token))
    } else {
        Err(format!("unexpected token '{}'", token))
    }
}

fn looks_numeric(token: &str) -> bool {
    let rest = token.strip_prefix(['+', '-']).unwrap_or(token);
    rest.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Reads a keyword/symbol/number token up to the next delimiter.
fn read_token(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while let Some(c) = chars.get(*pos) {
        if c.is_whitespace() || matches!(c, ',' | '{' | '}' | '[' | ']' | '(' | ')' | '"' | ';') {
            break;
        }
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

/// Renders a parsed key for the JSON-shaped map. Keywords keep their
/// leading colon; other key types use their string form.
fn key_string(key: &JsonValue) -> String {
    match key {
        JsonValue::String(s) => s.clone(),
        other => super::jsonpath::value_to_string(other),
    }
}

/// Skips whitespace, commas (whitespace in EDN) and `;` line comments.
fn skip_whitespace(chars: &[char], pos: &mut usize) {
    loop {
        match chars.get(*pos) {
            Some(c) if c.is_whitespace() || *c == ',' => *pos += 1,
            Some(';') => {
                while *pos < chars.len() && chars[*pos] != '\n' {
                    *pos += 1;
                }
            }
            _ => break,
        }
    }
}
