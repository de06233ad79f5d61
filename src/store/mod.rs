//! Run-scoped parameter store.
//!
//! Each executing scenario run owns exactly one [`ParameterStore`]. Steps
//! run strictly sequentially, so the store is single-writer by construction
//! and needs no locking; concurrent runs (e.g. many virtual users) each get
//! an isolated instance instead of sharing state.
//!
//! The reserved built-in names (`__status`, `__statusText`,
//! `__responseTime`, `__testRunId`, `__testStartTime`, `__launchedBy`) are a
//! computed read-only overlay, checked before user values on every lookup.
//! A user write to one of those names can therefore never shadow them.

use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of one test run, seeding the run-level built-in parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    /// Unique id of this run (`__testRunId`)
    pub test_run_id: String,

    /// Run start time as epoch milliseconds (`__testStartTime`)
    pub test_start_time: i64,

    /// Who or what launched the run (`__launchedBy`); absent when unknown
    pub launched_by: Option<String>,
}

impl RunInfo {
    /// Creates run metadata with a fresh id and the current start time.
    pub fn new() -> Self {
        Self {
            test_run_id: Uuid::new_v4().to_string(),
            test_start_time: Utc::now().timestamp_millis(),
            launched_by: None,
        }
    }

    /// Sets the launcher identity (CI job, user name, scheduler).
    pub fn launched_by(mut self, who: impl Into<String>) -> Self {
        self.launched_by = Some(who.into());
        self
    }
}

impl Default for RunInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Response facts backing the per-response built-ins. Recorded by the runner
/// after each executed step; the previous step's values are replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status code (`__status`)
    pub status: u16,

    /// HTTP status text (`__statusText`)
    pub status_text: String,

    /// Total response time in milliseconds (`__responseTime`)
    pub response_time_ms: u64,
}

/// Mapping from parameter name to string value for one test run.
///
/// Absent is a distinct state from present-but-empty: True Semantics and the
/// template pass-through rule both depend on the difference, which is why
/// lookups return `Option<String>` rather than a sentinel.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    values: HashMap<String, String>,
    run: RunInfo,
    response: Option<ResponseMeta>,
}

impl ParameterStore {
    /// Creates an empty store with fresh run metadata.
    pub fn new() -> Self {
        Self::with_run_info(RunInfo::new())
    }

    /// Creates an empty store for the given run.
    pub fn with_run_info(run: RunInfo) -> Self {
        Self {
            values: HashMap::new(),
            run,
            response: None,
        }
    }

    /// Creates a store seeded from validated default parameters. The seed
    /// values are copied; the source map stays immutable and can be shared
    /// across many runs.
    pub fn seeded(defaults: &HashMap<String, String>, run: RunInfo) -> Self {
        Self {
            values: defaults.clone(),
            run,
            response: None,
        }
    }

    /// Looks a parameter up by name. Built-ins are computed on access and
    /// take precedence over user values.
    pub fn get(&self, name: &str) -> Option<String> {
        match name {
            "__status" => self.response.as_ref().map(|r| r.status.to_string()),
            "__statusText" => self.response.as_ref().map(|r| r.status_text.clone()),
            "__responseTime" => self
                .response
                .as_ref()
                .map(|r| r.response_time_ms.to_string()),
            "__testRunId" => Some(self.run.test_run_id.clone()),
            "__testStartTime" => Some(self.run.test_start_time.to_string()),
            "__launchedBy" => self.run.launched_by.clone(),
            _ => self.values.get(name).cloned(),
        }
    }

    /// Writes a parameter value. Last write wins. This is the extraction
    /// write-back path, the sole mutator of a running store.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns true when the name resolves to a value.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Records the latest response meta, refreshing `__status`,
    /// `__statusText` and `__responseTime` for subsequent steps.
    pub fn record_response(&mut self, meta: ResponseMeta) {
        self.response = Some(meta);
    }

    /// Run metadata for this store.
    pub fn run_info(&self) -> &RunInfo {
        &self.run
    }

    /// Number of user-set parameters (built-ins excluded).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no user parameter has been set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the user-set parameters (built-ins excluded).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    /// The user-set parameters as a plain map, e.g. for seeding other runs.
    pub fn into_values(self) -> HashMap<String, String> {
        self.values
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
