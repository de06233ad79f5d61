//! Parser for the text inside one `${...}` span.
//!
//! The grammar is flat and strict by design:
//!
//! ```text
//! expr := atom (op atom)*
//!       | funcname '(' [atom (',' atom)*] ')'
//!       | funcname
//! atom := quoted-literal | identifier
//! ```
//!
//! Tokenization rules, all enforced here:
//! - operators carry exactly one space on each side (`x + y`, never `x+y`);
//! - no other whitespace is permitted anywhere in the expression;
//! - quoted literals use `'...'` with no escapes; the content must not
//!   contain whitespace, `,` or `'`;
//! - function arguments are comma-separated with no spaces, atoms only;
//! - no grouping parentheses.
//!
//! Any violation yields a [`SyntaxError`]. Callers treat that as inert: the
//! span is emitted verbatim and never evaluated.

use super::ast::{Atom, Expr};
use crate::functions;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Recognized operator symbols. All share one precedence level; chains group
/// right-to-left during evaluation.
const OPERATORS: &[&str] = &[
    "===", "==", "=", "!==", "!=", "||", "|", "&&", "&", "+", "-", "*", "/", "<=", "<", ">=", ">",
];

/// Shape of a parameter name usable as a bare atom.
static IDENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.]*$").expect("Failed to compile identifier regex")
});

/// Shape of a function name in call position.
static FUNC_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("Failed to compile function name regex")
});

/// Errors raised while parsing one span's inner text.
///
/// A syntax error is never surfaced as a test failure; the resolver leaves
/// the offending span untouched in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// The span was empty (`${}`).
    Empty,

    /// Whitespace other than single operator-separating spaces was found.
    Whitespace,

    /// A token in operator position is not a recognized operator symbol.
    InvalidOperator(String),

    /// The expression ends on an operator with no right-hand operand.
    TrailingOperator(String),

    /// A token in operand position is neither a quoted literal nor an
    /// identifier. Grouping parentheses and nested calls land here.
    InvalidAtom(String),

    /// A quoted literal is unterminated or contains a forbidden character.
    InvalidLiteral(String),

    /// A call-position name is not a registered function.
    UnknownFunction(String),

    /// A call token has malformed parentheses or a malformed argument list.
    MalformedCall(String),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::Empty => write!(f, "Empty expression"),
            SyntaxError::Whitespace => {
                write!(
                    f,
                    "Whitespace is only permitted as a single space around operators"
                )
            }
            SyntaxError::InvalidOperator(token) => {
                write!(f, "'{}' is not a recognized operator", token)
            }
            SyntaxError::TrailingOperator(token) => {
                write!(f, "Expression ends on operator '{}'", token)
            }
            SyntaxError::InvalidAtom(token) => {
                write!(
                    f,
                    "'{}' is not a quoted literal or parameter identifier",
                    token
                )
            }
            SyntaxError::InvalidLiteral(token) => {
                write!(
                    f,
                    "Malformed literal {}: quoted text must not contain whitespace, ',' or '''",
                    token
                )
            }
            SyntaxError::UnknownFunction(name) => {
                write!(f, "Unknown function '{}'", name)
            }
            SyntaxError::MalformedCall(token) => {
                write!(f, "Malformed function call '{}'", token)
            }
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Parses the inner text of one `${...}` span into an expression.
///
/// # Examples
///
/// ```
/// use param_engine::expression::parser::parse;
/// use param_engine::expression::ast::{Atom, Expr};
///
/// let expr = parse("userId").unwrap();
/// assert_eq!(expr, Expr::Atom(Atom::ParamRef("userId".to_string())));
///
/// // Missing spaces around the operator: a syntax error, not a chain.
/// assert!(parse("x+y").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
    if input.is_empty() {
        return Err(SyntaxError::Empty);
    }

    // Only plain spaces may appear, and only singly, around operators.
    if input.chars().any(|c| c.is_whitespace() && c != ' ') {
        return Err(SyntaxError::Whitespace);
    }

    let tokens: Vec<&str> = input.split(' ').collect();
    if tokens.iter().any(|t| t.is_empty()) {
        // Leading, trailing, or doubled spaces.
        return Err(SyntaxError::Whitespace);
    }

    if tokens.len() == 1 {
        return parse_single(tokens[0]);
    }

    if tokens.len() % 2 == 0 {
        // An even token count means the expression ends on an operator.
        return Err(SyntaxError::TrailingOperator(
            tokens[tokens.len() - 1].to_string(),
        ));
    }

    let mut operands = Vec::with_capacity(tokens.len() / 2 + 1);
    let mut operators = Vec::with_capacity(tokens.len() / 2);

    for (i, token) in tokens.iter().enumerate() {
        if i % 2 == 0 {
            operands.push(parse_atom(token)?);
        } else {
            operators.push(
                operator_symbol(token)
                    .ok_or_else(|| SyntaxError::InvalidOperator(token.to_string()))?,
            );
        }
    }

    Ok(Expr::OperatorChain {
        operands,
        operators,
    })
}

/// Parses a one-token expression: a literal, a function call, or a bare
/// parameter reference.
fn parse_single(token: &str) -> Result<Expr, SyntaxError> {
    if token.starts_with('\'') {
        return parse_atom(token).map(Expr::Atom);
    }
    if token.contains('(') || token.contains(')') {
        return parse_call(token);
    }
    parse_atom(token).map(Expr::Atom)
}

/// Parses a `name(arg,...)` token. The name must be a registered function;
/// anything else leaves the span inert rather than failing the step.
fn parse_call(token: &str) -> Result<Expr, SyntaxError> {
    let open = match token.find('(') {
        Some(pos) => pos,
        None => return Err(SyntaxError::MalformedCall(token.to_string())),
    };

    let name = &token[..open];
    if !FUNC_NAME_REGEX.is_match(name) {
        return Err(SyntaxError::MalformedCall(token.to_string()));
    }

    if !token.ends_with(')') {
        return Err(SyntaxError::MalformedCall(token.to_string()));
    }

    let inner = &token[open + 1..token.len() - 1];

    if !functions::is_function(name) {
        return Err(SyntaxError::UnknownFunction(name.to_string()));
    }

    let args = if inner.is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(parse_atom)
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(Expr::FunctionCall {
        name: name.to_string(),
        args,
    })
}

/// Parses one atom token: `'literal'` or identifier.
fn parse_atom(token: &str) -> Result<Atom, SyntaxError> {
    if let Some(rest) = token.strip_prefix('\'') {
        let content = rest
            .strip_suffix('\'')
            .ok_or_else(|| SyntaxError::InvalidLiteral(token.to_string()))?;
        if content.contains('\'') || content.contains(',') || content.contains(char::is_whitespace)
        {
            return Err(SyntaxError::InvalidLiteral(token.to_string()));
        }
        return Ok(Atom::Literal(content.to_string()));
    }

    if IDENT_REGEX.is_match(token) {
        Ok(Atom::ParamRef(token.to_string()))
    } else {
        Err(SyntaxError::InvalidAtom(token.to_string()))
    }
}

/// Maps a token onto the canonical operator symbol, if it is one.
fn operator_symbol(token: &str) -> Option<&'static str> {
    OPERATORS.iter().find(|op| **op == token).copied()
}
