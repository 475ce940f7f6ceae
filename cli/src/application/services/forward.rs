//! Application service: port-forward to an in-cluster database.
//!
//! Nothing is created in the cluster: the backend's service is resolved to
//! a pod, the pod is dialed, and a local listener tunnels to it until
//! interrupted.

use std::sync::Arc;

use anyhow::Result;
use pocket_common::Backend;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ProgressReporter, ServiceDiscovery, TunnelDialer};
use crate::application::services::tunnel::{self, TunnelSpec};

/// Inputs of a port-forward.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub backend: Backend,
    pub namespace: String,
    pub address: String,
    /// Defaults to the backend's standard port.
    pub local_port: Option<u16>,
}

/// Forward a local port to the backend until `cancel` fires.
///
/// # Errors
///
/// Returns an error if no target can be resolved, the pod cannot be
/// reached, or the local address cannot be bound. Nothing is announced in
/// those cases.
pub async fn run_forward<A>(
    api: Arc<A>,
    request: &ForwardRequest,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<()>
where
    A: ServiceDiscovery + TunnelDialer + Send + Sync + 'static,
{
    let backend = request.backend;
    reporter.step(&format!(
        "Looking for a {} service in namespace {}...",
        backend.display_name(),
        request.namespace
    ));
    let resolved = tunnel::resolve_target(&*api, &request.namespace, backend).await?;

    let remote_port = backend.default_port();
    let spec = TunnelSpec {
        address: request.address.clone(),
        local_port: request.local_port.unwrap_or(remote_port),
        target: resolved.pod.clone(),
        remote_port,
    };

    let (ready_tx, ready_rx) = oneshot::channel();
    let announce = async {
        if let Ok(local) = ready_rx.await {
            reporter.success(&format!(
                "Forwarding {local} -> {}/{}:{remote_port} (pod {})",
                request.namespace,
                resolved.service,
                resolved.pod.name()
            ));
            reporter.step("Press Ctrl+C to stop");
        }
    };
    let (forwarded, ()) = tokio::join!(tunnel::forward(api, spec, ready_tx, cancel), announce);
    forwarded?;
    reporter.success("Port-forward stopped");
    Ok(())
}
