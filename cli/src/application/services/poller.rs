//! Status polling with an overall deadline.
//!
//! The first read happens immediately. Each read is bounded by the time left
//! (never less than one interval), so a wait returns within `timeout +
//! interval` even when the API hangs.

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::ports::WorkloadApi;
use crate::application::services::lifecycle;
use crate::domain::{LifecyclePhase, PocketError, PollResult, ResourceHandle};

/// Cadence and budget of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Predicate for "ready to attach".
#[must_use]
pub fn is_running(phase: LifecyclePhase) -> bool {
    phase == LifecyclePhase::Running
}

/// Predicate for "run to completion".
#[must_use]
pub fn is_terminal(phase: LifecyclePhase) -> bool {
    phase.is_terminal()
}

/// Poll the pod behind `handle` until `predicate` holds for its phase.
///
/// Failed status reads count as an `Unknown` observation and polling
/// continues.
///
/// # Errors
///
/// - [`PocketError::Timeout`] once `options.timeout` has elapsed, carrying
///   the last observed phase.
/// - [`PocketError::Interrupted`] if `cancel` fires first.
pub async fn wait_until<P>(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
    predicate: P,
    options: PollOptions,
    cancel: &CancellationToken,
) -> Result<PollResult, PocketError>
where
    P: Fn(LifecyclePhase) -> bool,
{
    let started = Instant::now();
    let deadline = started + options.timeout;
    let mut last_phase = LifecyclePhase::Unknown;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let budget = deadline
            .saturating_duration_since(Instant::now())
            .max(options.interval);

        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PocketError::Interrupted),
            read = timeout(budget, lifecycle::get_status(api, handle)) => read,
        };

        match read {
            Ok(Ok(snapshot)) => {
                last_phase = snapshot.phase;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                debug!(pod = %handle, phase = %last_phase, attempts, elapsed_ms, "polled pod status");
                if predicate(snapshot.phase) {
                    return Ok(PollResult {
                        phase: snapshot.phase,
                        snapshot,
                    });
                }
            }
            Ok(Err(e)) => {
                last_phase = LifecyclePhase::Unknown;
                warn!(pod = %handle, error = %e, "status read failed; retrying");
            }
            Err(_) => {
                last_phase = LifecyclePhase::Unknown;
                warn!(pod = %handle, "status read timed out; retrying");
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(PocketError::Timeout {
                name: handle.name().to_string(),
                timeout: options.timeout,
                last_phase,
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PocketError::Interrupted),
            () = sleep(options.interval.min(remaining)) => {}
        }
    }
}

/// Wait for the pod to reach `Running`.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_until_running(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
    options: PollOptions,
    cancel: &CancellationToken,
) -> Result<PollResult, PocketError> {
    wait_until(api, handle, is_running, options, cancel).await
}

/// Wait for the pod to reach `Succeeded` or `Failed`.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_until_terminal(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
    options: PollOptions,
    cancel: &CancellationToken,
) -> Result<PollResult, PocketError> {
    wait_until(api, handle, is_terminal, options, cancel).await
}
