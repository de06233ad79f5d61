//! Conditional and selection functions.
//!
//! Boolean results are rendered as `"true"`/`"false"`, and every boolean
//! test goes through the shared True Semantics helper. The `i`-suffixed
//! comparison variants lowercase both operands before comparing.

use super::selection_index;
use crate::expression::error::EvalError;
use crate::expression::evaluator::{bool_str, is_truthy, parse_number};
use crate::extraction::jsonpath::value_to_string;
use regex::Regex;
use serde_json::Value as JsonValue;

pub(super) fn and(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args.iter().all(|a| is_truthy(Some(a)))))
}

pub(super) fn or(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args.iter().any(|a| is_truthy(Some(a)))))
}

pub(super) fn not(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(!is_truthy(Some(&args[0]))))
}

pub(super) fn eq(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args[0] == args[1]))
}

pub(super) fn neq(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args[0] != args[1]))
}

pub(super) fn eqi(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args[0].to_lowercase() == args[1].to_lowercase()))
}

pub(super) fn neqi(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args[0].to_lowercase() != args[1].to_lowercase()))
}

pub(super) fn lt(args: &[String]) -> Result<String, EvalError> {
    numeric_compare(args, |a, b| a < b)
}

pub(super) fn lte(args: &[String]) -> Result<String, EvalError> {
    numeric_compare(args, |a, b| a <= b)
}

pub(super) fn gt(args: &[String]) -> Result<String, EvalError> {
    numeric_compare(args, |a, b| a > b)
}

pub(super) fn gte(args: &[String]) -> Result<String, EvalError> {
    numeric_compare(args, |a, b| a >= b)
}

fn numeric_compare(args: &[String], f: impl Fn(f64, f64) -> bool) -> Result<String, EvalError> {
    Ok(bool_str(f(parse_number(&args[0])?, parse_number(&args[1])?)))
}

/// `__matches(value, pattern)`: regular-expression search over the value.
pub(super) fn matches(args: &[String]) -> Result<String, EvalError> {
    let pattern = Regex::new(&args[1]).map_err(|e| EvalError::InvalidArgument {
        function: "__matches".to_string(),
        message: format!("bad pattern: {}", e),
    })?;
    Ok(bool_str(pattern.is_match(&args[0])))
}

pub(super) fn contains(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(args[0].contains(args[1].as_str())))
}

pub(super) fn containsi(args: &[String]) -> Result<String, EvalError> {
    Ok(bool_str(
        args[0].to_lowercase().contains(&args[1].to_lowercase()),
    ))
}

/// `__if_then_else(condition, then[, else])`: else defaults to empty.
pub(super) fn if_then_else(args: &[String]) -> Result<String, EvalError> {
    if is_truthy(Some(&args[0])) {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or_default())
    }
}

/// `__switch(target, case1, value1, case2, value2, ...[, default])`: cases
/// are matched top to bottom, first case equal to the target wins. An odd
/// trailing argument after the pairs is the default; otherwise the default
/// is the empty string.
pub(super) fn switch(args: &[String]) -> Result<String, EvalError> {
    switch_impl(args, false)
}

/// `__switchi`: as `__switch` with case-insensitive case matching.
pub(super) fn switchi(args: &[String]) -> Result<String, EvalError> {
    switch_impl(args, true)
}

fn switch_impl(args: &[String], fold_case: bool) -> Result<String, EvalError> {
    let target = if fold_case {
        args[0].to_lowercase()
    } else {
        args[0].clone()
    };

    let rest = &args[1..];
    let pairs = rest.len() / 2;
    for i in 0..pairs {
        let case = &rest[i * 2];
        let case = if fold_case {
            case.to_lowercase()
        } else {
            case.clone()
        };
        if case == target {
            return Ok(rest[i * 2 + 1].clone());
        }
    }

    // Odd trailing argument after the pairs is the default.
    if rest.len() % 2 == 1 {
        Ok(rest[rest.len() - 1].clone())
    } else {
        Ok(String::new())
    }
}

/// `__pick(array[, selection])`: selects an element from a JSON array
/// string, as produced by JSONPath extraction of an array value. The
/// selection defaults to index 0; numeric indices are truncated and clamped
/// to the array bounds; `random` selects uniformly.
pub(super) fn pick(args: &[String]) -> Result<String, EvalError> {
    let items = parse_array("__pick", &args[0])?;
    let index = selection_index("__pick", args.get(1).map(String::as_str), items.len())?;
    Ok(value_to_string(&items[index]))
}

/// `__pick_random(array)`: a uniformly random element of a JSON array
/// string.
pub(super) fn pick_random(args: &[String]) -> Result<String, EvalError> {
    let items = parse_array("__pick_random", &args[0])?;
    let index = selection_index("__pick_random", Some("random"), items.len())?;
    Ok(value_to_string(&items[index]))
}

/// `__split_pick(value, separator[, selection])`: splits the value on the
/// separator and selects a part, with the same selection rules as `__pick`.
pub(super) fn split_pick(args: &[String]) -> Result<String, EvalError> {
    if args[1].is_empty() {
        return Err(EvalError::InvalidArgument {
            function: "__split_pick".to_string(),
            message: "separator must not be empty".to_string(),
        });
    }
    let parts: Vec<&str> = args[0].split(args[1].as_str()).collect();
    let index = selection_index("__split_pick", args.get(2).map(String::as_str), parts.len())?;
    Ok(parts[index].to_string())
}

fn parse_array(function: &str, raw: &str) -> Result<Vec<JsonValue>, EvalError> {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(items)) => Ok(items),
        _ => Err(EvalError::InvalidArgument {
            function: function.to_string(),
            message: format!("'{}' is not a JSON array", raw),
        }),
    }
}
