//! Container output retrieval.

use std::time::Duration;

use tracing::debug;

use crate::application::ports::WorkloadApi;
use crate::domain::{PocketError, ResourceHandle};

/// Fetch the main container's output with surrounding whitespace trimmed.
///
/// The read is abandoned once `budget` elapses; a finished pod whose log
/// stream never closes must not hold the caller.
///
/// # Errors
///
/// Returns [`PocketError::LogRetrieval`] if the output cannot be read
/// within `budget`.
pub async fn fetch(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
    budget: Duration,
) -> Result<String, PocketError> {
    let failed = |reason: String| PocketError::LogRetrieval {
        name: handle.name().to_string(),
        reason,
    };
    let raw = tokio::time::timeout(budget, api.pod_logs(handle.namespace(), handle.name()))
        .await
        .map_err(|_| failed(format!("timed out after {}s", budget.as_secs())))?
        .map_err(|e| failed(format!("{e:#}")))?;
    debug!(pod = %handle, bytes = raw.len(), "fetched pod output");
    Ok(raw.trim().to_string())
}
