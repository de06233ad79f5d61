//! Expression AST for `${...}` span interiors.
//!
//! The grammar is deliberately flat: operands and function arguments are
//! atoms (quoted literals or parameter references), never nested expressions.
//! The parser enforces this as a hard grammar rule, so the types here do not
//! even allow nesting to be represented.

/// A single operand: the only things allowed inside operator chains and
/// function argument lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Quoted text (`'...'`). Content never contains whitespace, `,` or `'`.
    Literal(String),

    /// Reference to a named parameter (or a no-argument built-in function).
    ParamRef(String),
}

impl Atom {
    /// Returns the referenced parameter name, if this atom is a reference.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Atom::ParamRef(name) => Some(name),
            Atom::Literal(_) => None,
        }
    }
}

/// A parsed expression: exactly one of these per `${...}` span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A single atom: a literal or a bare parameter reference.
    Atom(Atom),

    /// `a1 op1 a2 op2 a3 ...`: all operators share one precedence level and
    /// group right-to-left. `operators.len() == operands.len() - 1`.
    OperatorChain {
        /// Ordered operand atoms, at least two
        operands: Vec<Atom>,
        /// Ordered operator symbols, one fewer than the operands
        operators: Vec<&'static str>,
    },

    /// `name(arg, ...)` or a bare registered function name. Arguments are
    /// atoms only.
    FunctionCall {
        /// Registered function name, e.g. `__add`
        name: String,
        /// Ordered argument atoms
        args: Vec<Atom>,
    },
}

impl Expr {
    /// Collects the names of all parameters referenced anywhere in this
    /// expression, in source order. Used by default-parameter ordering and
    /// by editor tooling.
    pub fn referenced_parameters(&self) -> Vec<&str> {
        match self {
            Expr::Atom(atom) => atom.param_name().into_iter().collect(),
            Expr::OperatorChain { operands, .. } => {
                operands.iter().filter_map(Atom::param_name).collect()
            }
            Expr::FunctionCall { args, .. } => {
                args.iter().filter_map(Atom::param_name).collect()
            }
        }
    }
}
