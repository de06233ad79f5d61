//! Response data consumed by the extraction backends.
//!
//! The HTTP client collaborator produces one [`ResponseData`] per executed
//! step. The body is carried as text; the JSON and DOM views the backends
//! query are parsed lazily on first use and cached. Each run owns its
//! response data, so the caches are plain single-threaded cells.

use crate::extraction::dom::Document;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;

/// An HTTP response as seen by the extraction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseData {
    /// HTTP status code (e.g. 200, 404)
    pub status: u16,

    /// HTTP status text (e.g. "OK", "Not Found")
    pub status_text: String,

    /// Response headers as name/value pairs
    pub headers: HashMap<String, String>,

    /// Response body as text
    pub body: String,

    /// Total request duration, as measured by the HTTP client
    pub response_time: Duration,

    /// Lazily parsed JSON view of the body (`None` once parsing failed)
    #[serde(skip)]
    json: OnceCell<Option<JsonValue>>,

    /// Lazily parsed markup view of the body
    #[serde(skip)]
    dom: OnceCell<Document>,
}

impl ResponseData {
    /// Creates a response with the given status line and no body.
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: HashMap::new(),
            body: String::new(),
            response_time: Duration::from_millis(0),
            json: OnceCell::new(),
            dom: OnceCell::new(),
        }
    }

    /// Replaces the body text, dropping any cached parsed views.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.json.take();
        self.dom.take();
    }

    /// Adds a response header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Sets the measured response time.
    pub fn set_response_time(&mut self, duration: Duration) {
        self.response_time = duration;
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The Content-Type header value, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The body parsed as JSON. Parsed once on first call; `None` when the
    /// body is not valid JSON.
    pub fn json(&self) -> Option<&JsonValue> {
        self.json
            .get_or_init(|| serde_json::from_str(&self.body).ok())
            .as_ref()
    }

    /// The body parsed as a lenient HTML/XML document. Parsed once on first
    /// call; malformed markup degrades rather than failing.
    pub fn dom(&self) -> &Document {
        self.dom.get_or_init(|| Document::parse(&self.body))
    }

    /// Response time in whole milliseconds.
    pub fn response_time_ms(&self) -> u64 {
        self.response_time.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut response = ResponseData::new(200, "OK");
        response.add_header("X-Session-Id", "abc");

        assert_eq!(response.header("x-session-id"), Some("abc"));
        assert_eq!(response.header("X-SESSION-ID"), Some("abc"));
        assert_eq!(response.header("X-Missing"), None);
    }

    #[test]
    fn test_content_type() {
        let mut response = ResponseData::new(200, "OK");
        response.add_header("Content-Type", "application/json; charset=utf-8");
        assert_eq!(
            response.content_type(),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn test_json_view_is_cached() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body(r#"{"id": 7}"#);

        let first = response.json().unwrap() as *const JsonValue;
        let second = response.json().unwrap() as *const JsonValue;
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_view_none_for_invalid_body() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body("not json");
        assert!(response.json().is_none());
    }

    #[test]
    fn test_set_body_resets_cached_views() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body(r#"{"id": 1}"#);
        assert!(response.json().is_some());

        response.set_body("plain text");
        assert!(response.json().is_none());
    }

    #[test]
    fn test_dom_view_tolerates_non_markup() {
        let mut response = ResponseData::new(200, "OK");
        response.set_body("just some text");
        // Lenient parsing: never fails, just yields no elements.
        assert_eq!(response.dom().elements().count(), 0);
    }

    #[test]
    fn test_response_time_ms() {
        let mut response = ResponseData::new(200, "OK");
        response.set_response_time(Duration::from_millis(345));
        assert_eq!(response.response_time_ms(), 345);
    }
}
