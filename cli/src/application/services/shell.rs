//! Application service: interactive client shell.
//!
//! Creates an idle pod carrying the backend's client, waits until it runs,
//! then attaches the local terminal to the client inside it. The pod is
//! deleted when the session ends, however it ends.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use pocket_common::ConnectionTarget;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::ports::{ExecChannel, ProgressReporter, TerminalControl, WorkloadApi};
use crate::application::services::cleanup::{CleanupGuard, ResourceRegistry};
use crate::application::services::lifecycle;
use crate::application::services::poller::{self, PollOptions};
use crate::application::services::session::{self, IoBindings};
use crate::domain::ShellPlan;
use crate::domain::resource::generate_resource_name;

/// Inputs of an interactive shell.
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub target: ConnectionTarget,
    pub namespace: String,
    pub image: String,
    /// Budget for the pod to reach `Running`.
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub cleanup_timeout: Duration,
}

/// Open an interactive client session against the request's target.
///
/// # Errors
///
/// Returns an error if the pod cannot be created, never becomes ready,
/// the session cannot be attached or fails, or `cancel` fires.
#[allow(clippy::too_many_arguments)]
pub async fn run_shell<A, T, R, W, E>(
    api: Arc<A>,
    registry: Arc<ResourceRegistry>,
    terminal: &T,
    io: IoBindings<R, W, E>,
    request: &ShellRequest,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<()>
where
    A: WorkloadApi + ExecChannel + Send + Sync + 'static,
    T: TerminalControl,
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
    E: AsyncWrite + Send + Unpin + 'static,
{
    let backend = request.target.backend();
    let plan = ShellPlan::new(&request.target, &request.image);
    let name = generate_resource_name(backend.as_str(), Utc::now());

    reporter.step(&format!(
        "Starting {} shell: {}",
        backend.display_name(),
        request.target.redacted()
    ));
    reporter.step(&format!("Creating pod {}/{name}...", request.namespace));
    let handle =
        lifecycle::create(&*api, plan.pod_spec(&name, &request.namespace), &registry).await?;
    let guard = CleanupGuard::arm(
        Arc::clone(&api),
        Arc::clone(&registry),
        handle,
        request.cleanup_timeout,
    );

    let result: Result<()> = async {
        reporter.step("Waiting for pod to be ready...");
        let options = PollOptions {
            interval: request.poll_interval,
            timeout: request.ready_timeout,
        };
        poller::wait_until_running(&*api, guard.handle(), options, cancel).await?;
        reporter.success(&format!("Connected! Type '{}' to exit.", backend.quit_hint()));
        session::attach(
            &*api,
            terminal,
            guard.handle(),
            &plan.exec_command,
            io,
            true,
            cancel,
        )
        .await?;
        Ok(())
    }
    .await;

    reporter.step(&format!("Cleaning up pod {}...", guard.handle().name()));
    match guard.release().await {
        Some(warning) => {
            warn!("{warning}");
            reporter.warn(&warning.to_string());
        }
        None => reporter.success("Pod removed"),
    }
    result
}
