//! Time functions: `__now`, `__now_iso`, `__date_iso`.

use super::truncated_int;
use crate::expression::error::EvalError;
use chrono::{Duration, SecondsFormat, Utc};

/// `__now`: current time as epoch milliseconds.
pub(super) fn now() -> Result<String, EvalError> {
    Ok(Utc::now().timestamp_millis().to_string())
}

/// `__now_iso`: current time as an RFC 3339 timestamp with milliseconds.
pub(super) fn now_iso() -> Result<String, EvalError> {
    Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// `__date_iso([day-offset])`: today's date as `YYYY-MM-DD`, shifted by an
/// optional whole-day offset.
pub(super) fn date_iso(args: &[String]) -> Result<String, EvalError> {
    let offset_days = match args.first() {
        Some(raw) => truncated_int("__date_iso", raw)?,
        None => 0,
    };
    let date = Utc::now() + Duration::days(offset_days);
    Ok(date.format("%Y-%m-%d").to_string())
}
