//! JSON output helpers.
//!
//! Every `--json` document is a single pretty-printed object on stdout.
//! Failures use the error object below so scripts can branch on `code`.

use anyhow::{Context, Result};
use serde::Serialize;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable code for a command error.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    use crate::domain::PocketError;
    match err.downcast_ref::<PocketError>() {
        Some(PocketError::Create { .. }) => "CREATE_FAILED",
        Some(PocketError::TransientRead { .. }) => "STATUS_UNAVAILABLE",
        Some(PocketError::Timeout { .. }) => "TIMEOUT",
        Some(PocketError::NotReady { .. }) => "NOT_READY",
        Some(PocketError::LogRetrieval { .. }) => "LOGS_UNAVAILABLE",
        Some(PocketError::NoTarget { .. }) => "NO_TARGET",
        Some(PocketError::Session { .. }) => "SESSION_FAILED",
        Some(PocketError::Interrupted) => "INTERRUPTED",
        Some(PocketError::ProbeFailed { .. }) => "PROBE_FAILED",
        None => "ERROR",
    }
}

/// Serialize `value` as pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}
