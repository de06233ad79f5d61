//! The fixed function library.
//!
//! Every function is a pure mapping over string arguments (the random and
//! time groups draw on thread-local entropy and the clock, but never on the
//! store). The registry is closed: names, arities and defaults are declared
//! here, and [`call`] dispatches by match, validating arity first.
//!
//! Groups live in submodules: numeric, conditional, textual, extraction,
//! randomization, time.

pub(crate) mod conditional;
pub(crate) mod extract;
pub(crate) mod numeric;
pub(crate) mod random;
pub(crate) mod text;
pub(crate) mod time;

use crate::expression::error::EvalError;
use crate::expression::evaluator::parse_number;
use rand::Rng;

/// Returns true when `name` is a registered function. The expression parser
/// uses this to decide whether `name(...)` is a call or a syntax error.
pub fn is_function(name: &str) -> bool {
    arity(name).is_some()
}

/// Returns true when `name` may be called with no arguments. Bare
/// identifiers fall back to these during atom resolution, which is how the
/// no-argument built-ins shadow parameters.
pub fn accepts_zero_args(name: &str) -> bool {
    matches!(arity(name), Some((0, _)))
}

/// Declared arity per function: (minimum, maximum) argument counts, with
/// `None` meaning variadic.
fn arity(name: &str) -> Option<(usize, Option<usize>)> {
    let pair = match name {
        // numeric
        "__abs" | "__neg" => (1, Some(1)),
        "__add" | "__mult" => (1, None),
        "__sub" | "__div" => (2, Some(2)),

        // conditional
        "__true" | "__false" => (0, Some(0)),
        "__and" | "__or" => (1, None),
        "__not" => (1, Some(1)),
        "__eq" | "__neq" | "__eqi" | "__neqi" => (2, Some(2)),
        "__lt" | "__lte" | "__gt" | "__gte" => (2, Some(2)),
        "__matches" | "__contains" | "__containsi" => (2, Some(2)),
        "__if_then_else" => (2, Some(3)),
        "__switch" | "__switchi" => (1, None),
        "__pick" => (1, Some(2)),
        "__pick_random" => (1, Some(1)),
        "__split_pick" => (2, Some(3)),

        // textual
        "__usd" | "__length" | "__array_length" => (1, Some(1)),
        "__escape_regexp" | "__encode_url" | "__decode_url" => (1, Some(1)),
        "__escape_quotes" | "__lower" | "__upper" => (1, Some(1)),
        "__slice" => (2, Some(3)),

        // extraction
        "__regexp" | "__jsonpath" => (2, Some(2)),
        "__jquery" => (2, Some(3)),

        // randomization
        "__random_uuid" | "__random_boolean" => (0, Some(0)),
        "__random_number" => (1, Some(2)),
        "__random_chars" | "__random_digits" | "__random_letters" => (0, Some(1)),
        "__random_uppers" | "__random_lowers" | "__random_hex" => (0, Some(1)),
        "__random_from" => (1, None),

        // time
        "__now" | "__now_iso" => (0, Some(0)),
        "__date_iso" => (0, Some(1)),

        _ => return None,
    };
    Some(pair)
}

/// Calls a registered function with already-resolved argument values.
///
/// # Errors
///
/// `ArityError` when the argument count falls outside the declared range,
/// plus whatever the function itself raises (`NotANumber`,
/// `DivisionByZero`, `InvalidArgument`).
pub fn call(name: &str, args: &[String]) -> Result<String, EvalError> {
    let (min, max) = arity(name).ok_or_else(|| EvalError::InvalidArgument {
        function: name.to_string(),
        message: "unknown function".to_string(),
    })?;

    if args.len() < min || max.is_some_and(|max| args.len() > max) {
        return Err(EvalError::ArityError {
            function: name.to_string(),
            min,
            max,
            got: args.len(),
        });
    }

    match name {
        "__abs" => numeric::abs(args),
        "__add" => numeric::add(args),
        "__sub" => numeric::sub(args),
        "__neg" => numeric::neg(args),
        "__mult" => numeric::mult(args),
        "__div" => numeric::div(args),

        "__true" => Ok("true".to_string()),
        "__false" => Ok("false".to_string()),
        "__and" => conditional::and(args),
        "__or" => conditional::or(args),
        "__not" => conditional::not(args),
        "__eq" => conditional::eq(args),
        "__neq" => conditional::neq(args),
        "__eqi" => conditional::eqi(args),
        "__neqi" => conditional::neqi(args),
        "__lt" => conditional::lt(args),
        "__lte" => conditional::lte(args),
        "__gt" => conditional::gt(args),
        "__gte" => conditional::gte(args),
        "__matches" => conditional::matches(args),
        "__contains" => conditional::contains(args),
        "__containsi" => conditional::containsi(args),
        "__if_then_else" => conditional::if_then_else(args),
        "__switch" => conditional::switch(args),
        "__switchi" => conditional::switchi(args),
        "__pick" => conditional::pick(args),
        "__pick_random" => conditional::pick_random(args),
        "__split_pick" => conditional::split_pick(args),

        "__usd" => text::usd(args),
        "__length" => text::length(args),
        "__array_length" => text::array_length(args),
        "__escape_regexp" => text::escape_regexp(args),
        "__encode_url" => text::encode_url(args),
        "__decode_url" => text::decode_url(args),
        "__escape_quotes" => text::escape_quotes(args),
        "__lower" => text::lower(args),
        "__upper" => text::upper(args),
        "__slice" => text::slice(args),

        "__regexp" => extract::regexp(args),
        "__jsonpath" => extract::jsonpath(args),
        "__jquery" => extract::jquery(args),

        "__random_uuid" => random::uuid(),
        "__random_boolean" => random::boolean(),
        "__random_number" => random::number(args),
        "__random_chars" => random::chars(args),
        "__random_digits" => random::digits(args),
        "__random_letters" => random::letters(args),
        "__random_uppers" => random::uppers(args),
        "__random_lowers" => random::lowers(args),
        "__random_hex" => random::hex(args),
        "__random_from" => random::from(args),

        "__now" => time::now(),
        "__now_iso" => time::now_iso(),
        "__date_iso" => time::date_iso(args),

        _ => Err(EvalError::InvalidArgument {
            function: name.to_string(),
            message: "unknown function".to_string(),
        }),
    }
}

/// Parses a numeric argument and truncates it toward zero.
pub(crate) fn truncated_int(function: &str, value: &str) -> Result<i64, EvalError> {
    let n = parse_number(value)?;
    let truncated = n.trunc();
    if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
        return Err(EvalError::InvalidArgument {
            function: function.to_string(),
            message: format!("'{}' is out of range", value),
        });
    }
    Ok(truncated as i64)
}

/// Resolves a selection argument over `len` candidates: absent selects index
/// 0, `random` selects uniformly, a numeric index is truncated and clamped
/// to the candidate bounds.
pub(crate) fn selection_index(
    function: &str,
    selection: Option<&str>,
    len: usize,
) -> Result<usize, EvalError> {
    if len == 0 {
        return Err(EvalError::InvalidArgument {
            function: function.to_string(),
            message: "nothing to select from".to_string(),
        });
    }
    match selection {
        None => Ok(0),
        Some("random") => Ok(rand::thread_rng().gen_range(0..len)),
        Some(raw) => {
            let index = truncated_int(function, raw)?;
            let clamped = index.clamp(0, len as i64 - 1);
            Ok(clamped as usize)
        }
    }
}
