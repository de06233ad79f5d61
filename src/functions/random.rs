//! Randomization functions.
//!
//! All entropy comes from the thread-local RNG, so concurrent runs never
//! contend on shared generator state. Distributions are uniform over the
//! candidate set.

use super::truncated_int;
use crate::expression::error::EvalError;
use rand::Rng;
use uuid::Uuid;

const DEFAULT_LENGTH: usize = 10;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const DIGITS: &[u8] = b"0123456789";
const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const UPPERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const HEX: &[u8] = b"0123456789abcdef";

pub(super) fn uuid() -> Result<String, EvalError> {
    Ok(Uuid::new_v4().to_string())
}

pub(super) fn boolean() -> Result<String, EvalError> {
    Ok(if rand::thread_rng().gen::<bool>() {
        "true".to_string()
    } else {
        "false".to_string()
    })
}

/// `__random_number(max)` draws from `[0, max]`;
/// `__random_number(min, max)` draws from `[min, max]`. Bounds are
/// truncated integers and must satisfy min <= max.
pub(super) fn number(args: &[String]) -> Result<String, EvalError> {
    let (min, max) = if args.len() == 1 {
        (0, truncated_int("__random_number", &args[0])?)
    } else {
        (
            truncated_int("__random_number", &args[0])?,
            truncated_int("__random_number", &args[1])?,
        )
    };

    if min > max {
        return Err(EvalError::InvalidArgument {
            function: "__random_number".to_string(),
            message: format!("min ({}) is greater than max ({})", min, max),
        });
    }

    Ok(rand::thread_rng().gen_range(min..=max).to_string())
}

pub(super) fn chars(args: &[String]) -> Result<String, EvalError> {
    from_charset("__random_chars", args, ALPHANUMERIC)
}

pub(super) fn digits(args: &[String]) -> Result<String, EvalError> {
    from_charset("__random_digits", args, DIGITS)
}

pub(super) fn letters(args: &[String]) -> Result<String, EvalError> {
    from_charset("__random_letters", args, LETTERS)
}

pub(super) fn uppers(args: &[String]) -> Result<String, EvalError> {
    from_charset("__random_uppers", args, UPPERS)
}

pub(super) fn lowers(args: &[String]) -> Result<String, EvalError> {
    from_charset("__random_lowers", args, LOWERS)
}

pub(super) fn hex(args: &[String]) -> Result<String, EvalError> {
    from_charset("__random_hex", args, HEX)
}

/// `__random_from(v1, ..., vn)`: one of the arguments, uniformly.
pub(super) fn from(args: &[String]) -> Result<String, EvalError> {
    let index = rand::thread_rng().gen_range(0..args.len());
    Ok(args[index].clone())
}

/// Draws `length` characters (default 10) uniformly from the charset.
fn from_charset(function: &str, args: &[String], charset: &[u8]) -> Result<String, EvalError> {
    let length = match args.first() {
        Some(raw) => {
            let n = truncated_int(function, raw)?;
            if n < 0 {
                return Err(EvalError::InvalidArgument {
                    function: function.to_string(),
                    message: format!("length must not be negative, got {}", n),
                });
            }
            n as usize
        }
        None => DEFAULT_LENGTH,
    };

    let mut rng = rand::thread_rng();
    Ok((0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect())
}
