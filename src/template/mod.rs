//! Template resolution: locating and substituting `${...}` spans.
//!
//! The scan is a single left-to-right pass over the host string. Braces do
//! not nest (the first `}` after a `${` closes the span) and substituted
//! output is never rescanned, so resolving an already-resolved string is a
//! no-op.
//!
//! Per-span policy:
//! - syntax errors leave the span verbatim (inert pass-through; the editor
//!   shows such spans unhighlighted);
//! - a bare reference to a parameter with no value also stays verbatim;
//! - every other evaluation failure propagates and fails the owning step.

use crate::expression::ast::{Atom, Expr};
use crate::expression::evaluator::{evaluate, resolve_atom};
use crate::expression::parser;
use crate::expression::EvalError;
use crate::store::ParameterStore;

/// Resolves every `${...}` span in `text` against the store.
///
/// The store is read-only here; extraction write-back is the only mutator
/// in the engine.
///
/// # Examples
///
/// ```
/// use param_engine::store::ParameterStore;
/// use param_engine::template::resolve;
///
/// let mut store = ParameterStore::new();
/// store.set("userId", "12345");
///
/// let url = resolve("https://api.example.com/users/${userId}", &store).unwrap();
/// assert_eq!(url, "https://api.example.com/users/12345");
/// ```
pub fn resolve(text: &str, store: &ParameterStore) -> Result<String, EvalError> {
    // Fast path: nothing to substitute.
    if !text.contains("${") {
        return Ok(text.to_string());
    }

    let mut result = String::with_capacity(text.len() + text.len() / 4);
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let close = match after.find('}') {
            Some(close) => close,
            None => {
                // Unterminated span: everything from `${` on is literal.
                result.push_str(&rest[start..]);
                return Ok(result);
            }
        };

        let inner = &after[..close];
        let span = &rest[start..start + 2 + close + 1];

        match parser::parse(inner) {
            // Malformed spans are inert, not errors.
            Err(_) => result.push_str(span),
            // A bare reference to an unset parameter degrades to literal
            // pass-through; anything stricter fails below.
            Ok(Expr::Atom(ref atom @ Atom::ParamRef(_))) => match resolve_atom(atom, store) {
                Some(value) => result.push_str(&value),
                None => result.push_str(span),
            },
            Ok(expr) => result.push_str(&evaluate(&expr, store)?),
        }

        rest = &after[close + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(pairs: &[(&str, &str)]) -> ParameterStore {
        let mut store = ParameterStore::new();
        for (name, value) in pairs {
            store.set(*name, *value);
        }
        store
    }

    #[test]
    fn test_identity_without_spans() {
        let store = ParameterStore::new();
        let text = "GET https://api.example.com/users?limit=10";
        assert_eq!(resolve(text, &store).unwrap(), text);
    }

    #[test]
    fn test_simple_substitution() {
        let store = store_with(&[("userId", "12345")]);
        assert_eq!(
            resolve("/users/${userId}/posts", &store).unwrap(),
            "/users/12345/posts"
        );
    }

    #[test]
    fn test_multiple_spans() {
        let store = store_with(&[("host", "api.example.com"), ("id", "7")]);
        assert_eq!(
            resolve("https://${host}/users/${id}?v=${id}", &store).unwrap(),
            "https://api.example.com/users/7?v=7"
        );
    }

    #[test]
    fn test_literal_span() {
        let store = ParameterStore::new();
        assert_eq!(resolve("x=${'fixed'}", &store).unwrap(), "x=fixed");
    }

    #[test]
    fn test_expression_span() {
        let store = store_with(&[("a", "2"), ("b", "3")]);
        assert_eq!(resolve("sum=${a + b}", &store).unwrap(), "sum=5");
    }

    #[test]
    fn test_malformed_spans_stay_verbatim() {
        let store = store_with(&[("x", "1"), ("y", "2"), ("z", "3"), ("fullName", "John Doe")]);
        for text in [
            "${x+y}",
            "${(x*y)+z}",
            "${fullName == 'John Doe'}",
            "${}",
            "${x  +  y}",
        ] {
            assert_eq!(resolve(text, &store).unwrap(), text, "span: {}", text);
        }
    }

    #[test]
    fn test_unset_bare_reference_stays_verbatim() {
        let store = ParameterStore::new();
        assert_eq!(
            resolve("value=${missingParam}", &store).unwrap(),
            "value=${missingParam}"
        );
    }

    #[test]
    fn test_empty_value_substitutes_as_empty() {
        let store = store_with(&[("empty", "")]);
        assert_eq!(resolve("[${empty}]", &store).unwrap(), "[]");
    }

    #[test]
    fn test_missing_param_in_operator_chain_fails() {
        let store = store_with(&[("x", "1")]);
        assert_eq!(
            resolve("${x + missing}", &store),
            Err(EvalError::MissingParameter {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_missing_param_in_function_fails() {
        let store = ParameterStore::new();
        assert_eq!(
            resolve("${__if_then_else(is_good,'Success!',':_(')}", &store),
            Err(EvalError::MissingParameter {
                name: "is_good".to_string()
            })
        );
    }

    #[test]
    fn test_first_brace_closes_the_span() {
        // Braces do not nest: the span is `${a}` followed by literal text.
        let store = store_with(&[("a", "1")]);
        assert_eq!(resolve("${a}}", &store).unwrap(), "1}");
    }

    #[test]
    fn test_unterminated_span_stays_verbatim() {
        let store = store_with(&[("a", "1")]);
        assert_eq!(resolve("x=${a", &store).unwrap(), "x=${a");
        assert_eq!(resolve("${a} then ${b", &store).unwrap(), "1 then ${b");
    }

    #[test]
    fn test_substituted_output_is_not_rescanned() {
        let store = store_with(&[("outer", "${inner}"), ("inner", "surprise")]);
        assert_eq!(resolve("${outer}", &store).unwrap(), "${inner}");
    }

    #[test]
    fn test_idempotence_on_resolved_text() {
        let store = store_with(&[("id", "42")]);
        let once = resolve("user ${id} of ${'team'}", &store).unwrap();
        assert_eq!(resolve(&once, &store).unwrap(), once);
    }

    #[test]
    fn test_builtin_function_span() {
        let store = ParameterStore::new();
        let value = resolve("${__random_uuid}", &store).unwrap();
        assert_eq!(value.len(), 36);

        let with_parens = resolve("${__random_uuid()}", &store).unwrap();
        assert_eq!(with_parens.len(), 36);
    }

    #[test]
    fn test_builtin_store_overlay() {
        let mut store = ParameterStore::new();
        store.record_response(crate::store::ResponseMeta {
            status: 201,
            status_text: "Created".to_string(),
            response_time_ms: 55,
        });
        assert_eq!(
            resolve("${__status} ${__statusText}", &store).unwrap(),
            "201 Created"
        );
    }

    #[test]
    fn test_right_associativity_through_template() {
        let store = store_with(&[("x", "1"), ("y", "2"), ("z", "3"), ("j", "4"), ("k", "5")]);
        assert_eq!(resolve("${x * y + z - j + k}", &store).unwrap(), "-4");
    }

    #[test]
    fn test_span_in_json_body() {
        let store = store_with(&[("token", "abc"), ("count", "3")]);
        assert_eq!(
            resolve(r#"{"auth":"${token}","n":${count}}"#, &store).unwrap(),
            r#"{"auth":"abc","n":3}"#
        );
    }
}
