//! Error types for expression evaluation.
//!
//! These errors represent semantic failures while computing a parsed
//! expression. They are distinct from parse-level [`SyntaxError`]s, which are
//! absorbed by the template resolver as verbatim pass-through: an evaluation
//! error always fails the step that owns the template.
//!
//! [`SyntaxError`]: crate::expression::parser::SyntaxError

use std::fmt;

/// Errors that can occur while evaluating an expression against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An operand or function argument referenced a parameter with no value.
    MissingParameter {
        /// Name of the parameter that had no value
        name: String,
    },

    /// An operand of a numeric operator or function did not parse as a
    /// finite decimal number.
    NotANumber {
        /// The value that failed numeric coercion
        value: String,
    },

    /// Division by zero in `/` or `__div`.
    DivisionByZero,

    /// A function was called with an argument count outside its declared
    /// minimum/maximum arity.
    ArityError {
        /// Name of the function
        function: String,
        /// Minimum number of arguments accepted
        min: usize,
        /// Maximum number of arguments accepted, if bounded
        max: Option<usize>,
        /// Number of arguments actually supplied
        got: usize,
    },

    /// An argument was present but invalid for the function (bad regex
    /// pattern, malformed JSON array, negative length, min > max, ...).
    InvalidArgument {
        /// Name of the function or operator that rejected the argument
        function: String,
        /// Description of the problem
        message: String,
    },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::MissingParameter { name } => {
                write!(f, "Parameter '{}' has no value", name)
            }
            EvalError::NotANumber { value } => {
                write!(f, "Value '{}' is not a finite number", value)
            }
            EvalError::DivisionByZero => write!(f, "Division by zero"),
            EvalError::ArityError {
                function,
                min,
                max,
                got,
            } => match max {
                Some(max) if max == min => write!(
                    f,
                    "Function {} expects {} argument(s), got {}",
                    function, min, got
                ),
                Some(max) => write!(
                    f,
                    "Function {} expects between {} and {} arguments, got {}",
                    function, min, max, got
                ),
                None => write!(
                    f,
                    "Function {} expects at least {} argument(s), got {}",
                    function, min, got
                ),
            },
            EvalError::InvalidArgument { function, message } => {
                write!(f, "Invalid argument to {}: {}", function, message)
            }
        }
    }
}

impl std::error::Error for EvalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_missing_parameter() {
        let err = EvalError::MissingParameter {
            name: "token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("token"));
        assert!(msg.contains("no value"));
    }

    #[test]
    fn test_display_arity_fixed() {
        let err = EvalError::ArityError {
            function: "__abs".to_string(),
            min: 1,
            max: Some(1),
            got: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("__abs"));
        assert!(msg.contains("1 argument"));
        assert!(msg.contains("got 3"));
    }

    #[test]
    fn test_display_arity_range() {
        let err = EvalError::ArityError {
            function: "__random_number".to_string(),
            min: 1,
            max: Some(2),
            got: 0,
        };
        assert!(format!("{}", err).contains("between 1 and 2"));
    }

    #[test]
    fn test_display_arity_variadic() {
        let err = EvalError::ArityError {
            function: "__add".to_string(),
            min: 1,
            max: None,
            got: 0,
        };
        assert!(format!("{}", err).contains("at least 1"));
    }

    #[test]
    fn test_equality() {
        assert_eq!(EvalError::DivisionByZero, EvalError::DivisionByZero);
        assert_ne!(
            EvalError::NotANumber {
                value: "a".to_string()
            },
            EvalError::NotANumber {
                value: "b".to_string()
            }
        );
    }
}
