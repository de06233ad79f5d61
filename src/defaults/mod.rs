//! Default parameters: expression-valued seeds resolved at
//! configuration-validation time.
//!
//! Defaults let one scenario run against many environments. They are
//! computed exactly once, when the configuration is validated, never while
//! a test runs, and any failure here invalidates the whole configuration
//! up front.
//!
//! A default may reference other defaults, so resolution is a single
//! topologically-ordered pass over the dependency graph collected from the
//! parsed spans. Cyclic references fail validation explicitly.

use crate::expression::parser;
use crate::expression::EvalError;
use crate::store::ParameterStore;
use crate::template;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Errors that invalidate a test configuration before any run starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Default parameters reference each other in a cycle.
    CyclicDefaults {
        /// The parameters involved, sorted by name
        parameters: Vec<String>,
    },

    /// Evaluating one default's expression failed.
    Evaluation {
        /// The default parameter being computed
        parameter: String,
        /// The underlying evaluation failure
        source: EvalError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::CyclicDefaults { parameters } => {
                write!(
                    f,
                    "Default parameters reference each other cyclically: {}",
                    parameters.join(", ")
                )
            }
            ConfigError::Evaluation { parameter, source } => {
                write!(f, "Default parameter '{}' failed: {}", parameter, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Evaluation { source, .. } => Some(source),
            ConfigError::CyclicDefaults { .. } => None,
        }
    }
}

/// Resolves all default parameters against a fresh store and returns the
/// seeded store.
///
/// The returned values are immutable seeds: copy them into each run's store
/// (see [`ParameterStore::seeded`]) rather than sharing mutable state.
///
/// # Errors
///
/// `ConfigError::CyclicDefaults` when defaults form a reference cycle, and
/// `ConfigError::Evaluation` when any default's expression fails. Both are
/// configuration-load failures, not run-time test failures.
pub fn validate_defaults(
    defaults: &HashMap<String, String>,
) -> Result<ParameterStore, ConfigError> {
    let order = resolution_order(defaults)?;

    let mut store = ParameterStore::new();
    for name in order {
        let text = &defaults[&name];
        let value =
            template::resolve(text, &store).map_err(|source| ConfigError::Evaluation {
                parameter: name.clone(),
                source,
            })?;
        store.set(name, value);
    }
    Ok(store)
}

/// Orders defaults so that every default is computed after the defaults it
/// references. References to non-default names (built-ins, functions,
/// absent parameters) impose no ordering.
fn resolution_order(defaults: &HashMap<String, String>) -> Result<Vec<String>, ConfigError> {
    let mut dependencies: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, text) in defaults {
        let refs = referenced_defaults(text, defaults);
        dependencies.insert(name.as_str(), refs);
    }

    let mut remaining: HashMap<&str, usize> = dependencies
        .iter()
        .map(|(name, deps)| (*name, deps.len()))
        .collect();

    // BTreeSet keeps the ready queue deterministic regardless of map order.
    let mut ready: BTreeSet<&str> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(defaults.len());
    while let Some(name) = ready.iter().next().copied() {
        ready.remove(name);
        remaining.remove(name);
        order.push(name.to_string());

        for (dependent, deps) in &dependencies {
            if deps.contains(&name) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count = count.saturating_sub(deps.iter().filter(|d| **d == name).count());
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }
    }

    if !remaining.is_empty() {
        let mut parameters: Vec<String> = remaining.keys().map(|s| s.to_string()).collect();
        parameters.sort();
        return Err(ConfigError::CyclicDefaults { parameters });
    }

    Ok(order)
}

/// Collects the other default names referenced by one default's template
/// text. Malformed spans contribute nothing, mirroring the resolver's
/// pass-through rule.
fn referenced_defaults<'a>(
    text: &str,
    defaults: &'a HashMap<String, String>,
) -> Vec<&'a str> {
    let mut refs = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let close = match after.find('}') {
            Some(close) => close,
            None => break,
        };

        if let Ok(expr) = parser::parse(&after[..close]) {
            for name in expr.referenced_parameters() {
                if let Some((key, _)) = defaults.get_key_value(name) {
                    if !refs.contains(&key.as_str()) {
                        refs.push(key.as_str());
                    }
                }
            }
        }

        rest = &after[close + 1..];
    }

    refs
}
