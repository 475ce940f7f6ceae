//! Application service: one-shot connection test.
//!
//! Creates a pod that runs the backend's client once, waits for it to
//! finish, reads its output and deletes it. The pod is deleted on every
//! path, including timeouts and interrupts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use pocket_common::ConnectionTarget;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::ports::{ProgressReporter, WorkloadApi};
use crate::application::services::cleanup::{CleanupGuard, ResourceRegistry};
use crate::application::services::poller::{self, PollOptions};
use crate::application::services::{lifecycle, logs};
use crate::domain::resource::generate_resource_name;
use crate::domain::{PocketError, ProbePlan, ProbeReport, ProbeVerdict, ResourceHandle};

/// Inputs of a connection test.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub target: ConnectionTarget,
    pub namespace: String,
    pub image: String,
    /// Budget for the probe pod to finish, and separately for reading its
    /// output afterwards.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub cleanup_timeout: Duration,
}

/// Result of a probe that ran to completion.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub verdict: ProbeVerdict,
    pub report: ProbeReport,
}

/// Run a connection test.
///
/// A probe that ran but failed is an `Ok` outcome with a failing verdict;
/// the caller decides how to surface it.
///
/// # Errors
///
/// Returns an error if the pod cannot be created, does not finish in
/// time, its output cannot be read, or `cancel` fires.
pub async fn run_probe<A>(
    api: Arc<A>,
    registry: Arc<ResourceRegistry>,
    request: &ProbeRequest,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ProbeOutcome>
where
    A: WorkloadApi + Send + Sync + 'static,
{
    let backend = request.target.backend();
    let plan = ProbePlan::new(&request.target, &request.image, request.timeout);
    let name = generate_resource_name(backend.as_str(), Utc::now());

    reporter.step(&format!(
        "Testing {} connection: {}",
        backend.display_name(),
        request.target.redacted()
    ));
    reporter.step(&format!("Creating test pod {}/{name}...", request.namespace));
    let handle = lifecycle::create(&*api, plan.pod_spec(&name, &request.namespace), &registry)
        .await?;
    let guard = CleanupGuard::arm(
        Arc::clone(&api),
        Arc::clone(&registry),
        handle,
        request.cleanup_timeout,
    );

    let result = await_outcome(&*api, guard.handle(), &plan, request, reporter, cancel).await;

    reporter.step(&format!("Cleaning up pod {}...", guard.handle().name()));
    match guard.release().await {
        Some(warning) => {
            warn!("{warning}");
            reporter.warn(&warning.to_string());
        }
        None => reporter.success("Test pod removed"),
    }
    result
}

async fn await_outcome(
    api: &impl WorkloadApi,
    handle: &ResourceHandle,
    plan: &ProbePlan,
    request: &ProbeRequest,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ProbeOutcome> {
    reporter.step("Waiting for connection test...");
    let options = PollOptions {
        interval: request.poll_interval,
        timeout: request.timeout,
    };
    let polled = poller::wait_until_terminal(api, handle, options, cancel).await?;

    let output = tokio::select! {
        () = cancel.cancelled() => return Err(PocketError::Interrupted.into()),
        output = logs::fetch(api, handle, request.timeout) => output?,
    };
    let verdict = ProbeVerdict::interpret(polled.phase, &output, plan.marker);

    Ok(ProbeOutcome {
        verdict,
        report: ProbeReport {
            backend: plan.backend,
            target: request.target.redacted(),
            pod: handle.name().to_string(),
            namespace: handle.namespace().to_string(),
            phase: polled.phase,
            success: verdict.is_success(),
            output,
        },
    })
}
