//! Parameter templating and extraction engine for recorded HTTP test
//! scenarios.
//!
//! Recorded scenarios become dynamic by capturing values from one response
//! and re-injecting them into later requests through `${...}` expressions,
//! optionally transformed by a fixed library of operators and functions.
//!
//! # Architecture
//!
//! The engine is organized into several modules:
//!
//! - **store**: run-scoped parameter store with computed built-ins
//!   (`__status`, `__testRunId`, ...)
//! - **expression**: the strict span grammar (parser, AST, evaluator)
//! - **functions**: the fixed function library (`__add`, `__switch`,
//!   `__random_uuid`, ...)
//! - **template**: `${...}` span scanning and substitution
//! - **extraction**: the query backends (jsonpath, jquery, regexp, header,
//!   assignment, edn) and the store write-back
//! - **defaults**: one-shot default-parameter validation
//! - **models**: response data with lazy JSON/DOM views
//!
//! # Control flow
//!
//! The scenario runner executes a step, records the response, and runs the
//! step's extraction queries; later steps' request templates then resolve
//! against the accumulated store. Steps are strictly sequential within a
//! run, and each run owns an isolated store, so concurrent virtual users
//! never share state.
//!
//! # Example
//!
//! ```
//! use param_engine::extraction::{ExtractionQuery, QueryType};
//! use param_engine::models::ResponseData;
//! use param_engine::store::ParameterStore;
//! use param_engine::{resolve_template, run_extraction};
//!
//! let mut store = ParameterStore::new();
//!
//! // Step 1 responded with a post id; capture it.
//! let mut response = ResponseData::new(200, "OK");
//! response.set_body(r#"{"post":{"id":123}}"#);
//! let capture = ExtractionQuery::new("postId", QueryType::Jsonpath, "post.id");
//! run_extraction(&capture, &response, &mut store).unwrap();
//!
//! // Step 2's request template reads it back.
//! let url = resolve_template("https://api.example.com/posts/${postId}", &store).unwrap();
//! assert_eq!(url, "https://api.example.com/posts/123");
//! ```
//!
//! # Failure policy
//!
//! Malformed `${...}` spans are inert and stay verbatim in the output.
//! Missing parameters used inside operators or functions, bad numeric
//! coercions and malformed extraction queries are hard failures that abort
//! the owning step. Extraction no-match is neither: it yields the query's
//! default or the empty string.

pub mod defaults;
pub mod expression;
pub mod extraction;
pub mod functions;
pub mod models;
pub mod store;
pub mod template;

pub use defaults::{validate_defaults, ConfigError};
pub use expression::{EvalError, SyntaxError};
pub use extraction::{run_extraction, ExtractionError, ExtractionQuery, QueryType, Selection};
pub use models::ResponseData;
pub use store::{ParameterStore, ResponseMeta, RunInfo};
pub use template::resolve as resolve_template;
