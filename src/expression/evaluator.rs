//! Expression evaluation against a parameter store.
//!
//! Evaluation is pure and synchronous: the store is read-only here, and the
//! only side effects live in the function library's random/time helpers.
//! Semantic failures (a missing operand value, a non-numeric operand, a bad
//! argument) are hard errors that fail the owning step, in contrast to parse
//! failures which the template resolver absorbs.

use super::ast::{Atom, Expr};
use super::error::EvalError;
use crate::functions;
use crate::store::ParameterStore;

/// Evaluates a parsed expression to a string value.
///
/// # Arguments
///
/// * `expr` - The parsed span expression
/// * `store` - Parameter store for reference resolution (read-only)
///
/// # Errors
///
/// Returns an [`EvalError`] when an operand or argument has no value, when
/// numeric coercion fails, on division by zero, or when a function rejects
/// its arguments.
pub fn evaluate(expr: &Expr, store: &ParameterStore) -> Result<String, EvalError> {
    match expr {
        Expr::Atom(atom) => resolve_required(atom, store),
        Expr::OperatorChain {
            operands,
            operators,
        } => evaluate_chain(operands, operators, store),
        Expr::FunctionCall { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(resolve_required(arg, store)?);
            }
            functions::call(name, &values)
        }
    }
}

/// Resolves an atom to its value, if it has one.
///
/// Literals always have a value. A reference resolves through the store
/// (built-in overlay first), then falls back to a registered no-argument
/// function of the same name. That fallback is what lets `__now` and the
/// other zero-arg built-ins stand wherever a parameter can.
pub(crate) fn resolve_atom(atom: &Atom, store: &ParameterStore) -> Option<String> {
    match atom {
        Atom::Literal(text) => Some(text.clone()),
        Atom::ParamRef(name) => store.get(name).or_else(|| {
            if functions::accepts_zero_args(name) {
                functions::call(name, &[]).ok()
            } else {
                None
            }
        }),
    }
}

/// Resolves an atom, failing with `MissingParameter` when absent. Used for
/// operator operands and function arguments, which must always be present.
fn resolve_required(atom: &Atom, store: &ParameterStore) -> Result<String, EvalError> {
    resolve_atom(atom, store).ok_or_else(|| EvalError::MissingParameter {
        name: atom.param_name().unwrap_or_default().to_string(),
    })
}

/// Right-associative fold over an operator chain: `a1 op1 (a2 op2 (a3 ...))`.
/// All operators share one precedence level; only associativity
/// disambiguates multi-operator chains.
fn evaluate_chain(
    operands: &[Atom],
    operators: &[&'static str],
    store: &ParameterStore,
) -> Result<String, EvalError> {
    let mut values = Vec::with_capacity(operands.len());
    for operand in operands {
        values.push(resolve_required(operand, store)?);
    }

    let mut acc = match values.pop() {
        Some(last) => last,
        None => return Ok(String::new()),
    };
    for (op, lhs) in operators.iter().rev().zip(values.into_iter().rev()) {
        acc = apply_operator(op, &lhs, &acc)?;
    }
    Ok(acc)
}

/// Applies one binary operator to two present values.
pub(crate) fn apply_operator(op: &str, lhs: &str, rhs: &str) -> Result<String, EvalError> {
    match op {
        "=" | "==" | "===" => Ok(bool_str(lhs == rhs)),
        "!=" | "!==" => Ok(bool_str(lhs != rhs)),
        "&" | "&&" => Ok(bool_str(is_truthy(Some(lhs)) && is_truthy(Some(rhs)))),
        "|" | "||" => Ok(bool_str(is_truthy(Some(lhs)) || is_truthy(Some(rhs)))),
        "+" => numeric(lhs, rhs, |a, b| a + b),
        "-" => numeric(lhs, rhs, |a, b| a - b),
        "*" => numeric(lhs, rhs, |a, b| a * b),
        "/" => {
            let a = parse_number(lhs)?;
            let b = parse_number(rhs)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(format_number(a / b))
        }
        "<" => comparison(lhs, rhs, |a, b| a < b),
        "<=" => comparison(lhs, rhs, |a, b| a <= b),
        ">" => comparison(lhs, rhs, |a, b| a > b),
        ">=" => comparison(lhs, rhs, |a, b| a >= b),
        other => Err(EvalError::InvalidArgument {
            function: other.to_string(),
            message: "unsupported operator".to_string(),
        }),
    }
}

fn numeric(lhs: &str, rhs: &str, f: impl Fn(f64, f64) -> f64) -> Result<String, EvalError> {
    let a = parse_number(lhs)?;
    let b = parse_number(rhs)?;
    Ok(format_number(f(a, b)))
}

fn comparison(lhs: &str, rhs: &str, f: impl Fn(f64, f64) -> bool) -> Result<String, EvalError> {
    let a = parse_number(lhs)?;
    let b = parse_number(rhs)?;
    Ok(bool_str(f(a, b)))
}

/// True Semantics, implemented once and reused everywhere a boolean is
/// needed: a value is true iff it is present, non-empty, and does not
/// case-insensitively equal the word "false".
pub fn is_truthy(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
    }
}

/// Renders a boolean as the canonical parameter value.
pub(crate) fn bool_str(value: bool) -> String {
    let rendered = if value { "true" } else { "false" };
    rendered.to_string()
}

/// Coerces a value to a finite number. Anything else is rejected, including
/// the infinity and NaN spellings `f64` would otherwise accept.
pub(crate) fn parse_number(value: &str) -> Result<f64, EvalError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(EvalError::NotANumber {
            value: value.to_string(),
        }),
    }
}

/// Formats a numeric result. Integral values print without a fractional
/// part; everything else uses the shortest `f64` representation. Results are
/// never rounded or truncated.
pub(crate) fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Collapses negative zero.
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}
