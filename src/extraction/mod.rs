//! Extraction: deriving parameters from response data via typed queries.
//!
//! Each query record names a target parameter, a backend (`jsonpath`,
//! `jquery`, `regexp`, `header`, `assignment`, `edn`), the query text, and
//! optionally an attribute, a selection and a default. The runner hands
//! these over as JSON, so the records derive serde traits.
//!
//! Extraction never fails a test on absence: no-match yields the query's
//! `default` or the empty string. Only malformed query syntax is a hard
//! failure, as is a template error inside the query text itself. Writing
//! the extracted value into the store is the single mutation a running
//! scenario performs.

pub mod dom;
pub(crate) mod edn;
pub(crate) mod jsonpath;
pub(crate) mod regexp;
pub mod selector;

use crate::expression::EvalError;
use crate::models::ResponseData;
use crate::store::ParameterStore;
use crate::template;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend evaluates the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// JSONPath over the JSON-parsed body
    Jsonpath,

    /// CSS-selector subset over the markup-parsed body
    Jquery,

    /// Regular expression over the raw body text
    Regexp,

    /// Case-insensitive response-header lookup
    Header,

    /// The resolved query text itself is the value
    Assignment,

    /// JSONPath over the EDN-parsed body
    Edn,
}

/// Picks among multiple extraction candidates.
///
/// Deserializes from either an integer index or the string `"random"`; any
/// other string is rejected when the query runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Zero-based candidate index
    Index(usize),

    /// A selection keyword; only `random` is meaningful
    Keyword(String),
}

/// One extraction request, as consumed from the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionQuery {
    /// Name of the parameter to write
    pub parameter: String,

    /// Backend to evaluate the query with
    #[serde(rename = "type")]
    pub query_type: QueryType,

    /// Query text; may itself contain `${...}` spans, resolved before the
    /// query is parsed
    pub query: String,

    /// For `jquery`: return this attribute instead of the element text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Candidate selection where the backend can yield several matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,

    /// Substitute for no-match; without it no-match yields an empty string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ExtractionQuery {
    /// Creates a query with no attribute, selection or default.
    pub fn new(
        parameter: impl Into<String>,
        query_type: QueryType,
        query: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            query_type,
            query: query.into(),
            attribute: None,
            selection: None,
            default: None,
        }
    }

    /// Sets the attribute to extract (selector backend).
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Sets the candidate selection.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Sets the no-match default.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Errors that abort an extraction (and with it the owning step).
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The query text is malformed for its backend: bad regex, bad
    /// selector, bad path syntax, or an unknown selection keyword.
    InvalidQuery {
        /// The query text as evaluated
        query: String,
        /// Description of the problem
        message: String,
    },

    /// Resolving `${...}` spans inside the query text failed.
    Eval(EvalError),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::InvalidQuery { query, message } => {
                write!(f, "Invalid extraction query '{}': {}", query, message)
            }
            ExtractionError::Eval(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Eval(err) => Some(err),
            ExtractionError::InvalidQuery { .. } => None,
        }
    }
}

impl From<EvalError> for ExtractionError {
    fn from(err: EvalError) -> Self {
        ExtractionError::Eval(err)
    }
}

/// Runs one extraction against a response and writes the named parameter.
///
/// The query text (and attribute, if any) is template-resolved against the
/// store first, so queries can reference previously extracted parameters.
pub fn run_extraction(
    query: &ExtractionQuery,
    response: &ResponseData,
    store: &mut ParameterStore,
) -> Result<(), ExtractionError> {
    let query_text = template::resolve(&query.query, store)?;
    let attribute = match &query.attribute {
        Some(raw) => Some(template::resolve(raw, store)?),
        None => None,
    };

    let candidates = collect_candidates(query, &query_text, attribute.as_deref(), response)?;
    let matched = select_candidate(&candidates, query.selection.as_ref(), &query_text)?;

    let value = matched
        .or_else(|| query.default.clone())
        .unwrap_or_default();
    store.set(query.parameter.as_str(), value);
    Ok(())
}

/// Evaluates the backend, producing the ordered candidate set.
fn collect_candidates(
    query: &ExtractionQuery,
    query_text: &str,
    attribute: Option<&str>,
    response: &ResponseData,
) -> Result<Vec<String>, ExtractionError> {
    let invalid = |message: String| ExtractionError::InvalidQuery {
        query: query_text.to_string(),
        message,
    };

    match query.query_type {
        QueryType::Jsonpath => {
            let segments = jsonpath::parse_segments(query_text).map_err(invalid)?;
            let candidates = response
                .json()
                .and_then(|body| jsonpath::evaluate(body, &segments))
                .map(jsonpath::value_to_string)
                .into_iter()
                .collect();
            Ok(candidates)
        }
        QueryType::Edn => {
            let segments = jsonpath::parse_segments(query_text).map_err(invalid)?;
            // A body that is not EDN is absence, not an error.
            let candidates = edn::parse(&response.body)
                .ok()
                .as_ref()
                .and_then(|tree| jsonpath::evaluate(tree, &segments))
                .map(jsonpath::value_to_string)
                .into_iter()
                .collect();
            Ok(candidates)
        }
        QueryType::Regexp => regexp::extract(&response.body, query_text).map_err(invalid),
        QueryType::Jquery => {
            let selector =
                selector::Selector::parse(query_text).map_err(|e| invalid(e.message))?;
            let matches = selector.select(response.dom());
            let candidates = matches
                .into_iter()
                .filter_map(|element| match attribute {
                    Some(name) => element.attr(name).map(str::to_string),
                    None => Some(element.text()),
                })
                .collect();
            Ok(candidates)
        }
        QueryType::Header => Ok(response
            .header(query_text)
            .map(str::to_string)
            .into_iter()
            .collect()),
        QueryType::Assignment => Ok(vec![query_text.to_string()]),
    }
}

/// Applies the selection to the candidate set. Out-of-range indices are
/// no-match; an unknown selection keyword is a malformed query.
fn select_candidate(
    candidates: &[String],
    selection: Option<&Selection>,
    query_text: &str,
) -> Result<Option<String>, ExtractionError> {
    match selection {
        None => Ok(candidates.first().cloned()),
        Some(Selection::Index(index)) => Ok(candidates.get(*index).cloned()),
        Some(Selection::Keyword(keyword)) if keyword == "random" => {
            if candidates.is_empty() {
                return Ok(None);
            }
            let index = rand::thread_rng().gen_range(0..candidates.len());
            Ok(Some(candidates[index].clone()))
        }
        Some(Selection::Keyword(other)) => Err(ExtractionError::InvalidQuery {
            query: query_text.to_string(),
            message: format!("unknown selection '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_response(body: &str) -> ResponseData {
        let mut response = ResponseData::new(200, "OK");
        response.add_header("Content-Type", "application/json");
        response.set_body(body);
        response
    }

    fn extract(query: ExtractionQuery, response: &ResponseData) -> Option<String> {
        let mut store = ParameterStore::new();
        run_extraction(&query, response, &mut store).unwrap();
        store.get(&query.parameter)
    }

    #[test]
    fn test_jsonpath_extraction() {
        let response = json_response(r#"{"post":{"id":123}}"#);
        let query = ExtractionQuery::new("postId", QueryType::Jsonpath, "post.id");
        assert_eq!(extract(query, &response).unwrap(), "123");
    }

    #[test]
    fn test_regexp_extraction_agrees_with_jsonpath() {
        let response = json_response(r#"{"post":{"id":123}}"#);
        let query =
            ExtractionQuery::new("postId", QueryType::Regexp, r#".*"id":\s*([0-9]*)"#);
        assert_eq!(extract(query, &response).unwrap(), "123");
    }

    #[test]
    fn test_jsonpath_no_match_yields_empty() {
        let response = json_response(r#"{"post":{"id":123}}"#);
        let query = ExtractionQuery::new("missing", QueryType::Jsonpath, "post.title");
        assert_eq!(extract(query, &response).unwrap(), "");
    }

    #[test]
    fn test_default_substitutes_for_no_match() {
        let response = json_response(r#"{"post":{"id":123}}"#);
        let query = ExtractionQuery::new("missing", QueryType::Jsonpath, "post.title")
            .with_default("untitled");
        assert_eq!(extract(query, &response).unwrap(), "untitled");
    }

    #[test]
    fn test_non_json_body_is_no_match_for_jsonpath() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body("plain text");
        let query = ExtractionQuery::new("x", QueryType::Jsonpath, "post.id");
        assert_eq!(extract(query, &response).unwrap(), "");
    }

    #[test]
    fn test_header_extraction_is_case_insensitive() {
        let mut response = ResponseData::new(200, "OK");
        response.add_header("X-Request-Id", "req-42");
        let query = ExtractionQuery::new("rid", QueryType::Header, "x-request-id");
        assert_eq!(extract(query, &response).unwrap(), "req-42");
    }

    #[test]
    fn test_assignment_resolves_templates() {
        let mut store = ParameterStore::new();
        store.set("host", "api.example.com");
        let response = ResponseData::new(200, "OK");
        let query =
            ExtractionQuery::new("url", QueryType::Assignment, "https://${host}/v1");
        run_extraction(&query, &response, &mut store).unwrap();
        assert_eq!(store.get("url").unwrap(), "https://api.example.com/v1");
    }

    #[test]
    fn test_query_text_template_resolution_before_parsing() {
        let mut store = ParameterStore::new();
        store.set("field", "id");
        let response = json_response(r#"{"post":{"id":123}}"#);
        let query = ExtractionQuery::new("postId", QueryType::Jsonpath, "post.${field}");
        run_extraction(&query, &response, &mut store).unwrap();
        assert_eq!(store.get("postId").unwrap(), "123");
    }

    #[test]
    fn test_jquery_text_and_attribute() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body(r#"<div id="user"><a href="/u/1" class="profile">Ada</a></div>"#);

        let text_query = ExtractionQuery::new("name", QueryType::Jquery, "#user a.profile");
        assert_eq!(extract(text_query, &response).unwrap(), "Ada");

        let attr_query = ExtractionQuery::new("link", QueryType::Jquery, "#user a.profile")
            .with_attribute("href");
        assert_eq!(extract(attr_query, &response).unwrap(), "/u/1");
    }

    #[test]
    fn test_jquery_selection_index_and_out_of_range() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body("<ul><li>a</li><li>b</li><li>c</li></ul>");

        let second = ExtractionQuery::new("item", QueryType::Jquery, "li")
            .with_selection(Selection::Index(1));
        assert_eq!(extract(second, &response).unwrap(), "b");

        let gone = ExtractionQuery::new("item", QueryType::Jquery, "li")
            .with_selection(Selection::Index(9))
            .with_default("none");
        assert_eq!(extract(gone, &response).unwrap(), "none");
    }

    #[test]
    fn test_random_selection_stays_in_candidate_set() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body("<ul><li>a</li><li>b</li></ul>");
        let query = ExtractionQuery::new("item", QueryType::Jquery, "li")
            .with_selection(Selection::Keyword("random".to_string()));
        for _ in 0..20 {
            let value = extract(query.clone(), &response).unwrap();
            assert!(value == "a" || value == "b");
        }
    }

    #[test]
    fn test_unknown_selection_keyword_is_invalid() {
        let mut store = ParameterStore::new();
        let response = ResponseData::new(200, "OK");
        let query = ExtractionQuery::new("x", QueryType::Assignment, "v")
            .with_selection(Selection::Keyword("last".to_string()));
        assert!(matches!(
            run_extraction(&query, &response, &mut store),
            Err(ExtractionError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_malformed_regex_is_invalid() {
        let mut store = ParameterStore::new();
        let response = ResponseData::new(200, "OK");
        let query = ExtractionQuery::new("x", QueryType::Regexp, "(unclosed");
        assert!(matches!(
            run_extraction(&query, &response, &mut store),
            Err(ExtractionError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_template_failure_in_query_text_propagates() {
        let mut store = ParameterStore::new();
        let response = ResponseData::new(200, "OK");
        // `${missing + 'x'}` is a valid chain over an absent parameter.
        let query =
            ExtractionQuery::new("x", QueryType::Assignment, "${missing + 'x'}");
        assert!(matches!(
            run_extraction(&query, &response, &mut store),
            Err(ExtractionError::Eval(EvalError::MissingParameter { .. }))
        ));
    }

    #[test]
    fn test_edn_extraction() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body("{:post {:id 123}}");
        let query = ExtractionQuery::new("postId", QueryType::Edn, ":post.:id");
        assert_eq!(extract(query, &response).unwrap(), "123");
    }

    #[test]
    fn test_edn_non_edn_body_is_no_match() {
        let response = json_response(r#"{"post":{"id":123}}"#);
        // JSON string keys do not carry keyword colons.
        let query = ExtractionQuery::new("postId", QueryType::Edn, ":post.:id");
        assert_eq!(extract(query, &response).unwrap(), "");
    }

    #[test]
    fn test_query_record_deserializes_from_runner_json() {
        let raw = r#"{
            "parameter": "token",
            "type": "jsonpath",
            "query": "auth.token",
            "selection": 0,
            "default": "anonymous"
        }"#;
        let query: ExtractionQuery = serde_json::from_str(raw).unwrap();
        assert_eq!(query.parameter, "token");
        assert_eq!(query.query_type, QueryType::Jsonpath);
        assert_eq!(query.selection, Some(Selection::Index(0)));
        assert_eq!(query.default, Some("anonymous".to_string()));

        let random = r#"{"parameter":"p","type":"jquery","query":"li","selection":"random"}"#;
        let query: ExtractionQuery = serde_json::from_str(random).unwrap();
        assert_eq!(
            query.selection,
            Some(Selection::Keyword("random".to_string()))
        );
    }

    #[test]
    fn test_extraction_write_back_last_wins() {
        let response = json_response(r#"{"a":"1","b":"2"}"#);
        let mut store = ParameterStore::new();
        run_extraction(
            &ExtractionQuery::new("v", QueryType::Jsonpath, "a"),
            &response,
            &mut store,
        )
        .unwrap();
        run_extraction(
            &ExtractionQuery::new("v", QueryType::Jsonpath, "b"),
            &response,
            &mut store,
        )
        .unwrap();
        assert_eq!(store.get("v").unwrap(), "2");
    }
}
