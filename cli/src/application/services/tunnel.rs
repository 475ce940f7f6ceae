//! Port-forward target resolution and the local TCP listener.
//!
//! The target is dialed once before the listener binds, so an unreachable
//! pod fails the forward instead of being announced. That first upstream
//! serves the first accepted connection; later connections dial their own.
//! Connections are bridged concurrently until the listener is cancelled.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use pocket_common::Backend;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::{ServiceDiscovery, TunnelDialer, Upstream};
use crate::domain::{PocketError, ResourceHandle};

/// Pod backing a discovered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub service: String,
    pub pod: ResourceHandle,
}

/// Where to listen and what to reach.
#[derive(Debug, Clone)]
pub struct TunnelSpec {
    pub address: String,
    /// `0` asks the OS for a free port.
    pub local_port: u16,
    pub target: ResourceHandle,
    pub remote_port: u16,
}

/// Find the pod behind the first existing service among the backend's
/// conventional names.
///
/// # Errors
///
/// Returns [`PocketError::NoTarget`] if no candidate service exists, the
/// service has no selector, or no pod matches it.
pub async fn resolve_target(
    api: &impl ServiceDiscovery,
    namespace: &str,
    backend: Backend,
) -> Result<ResolvedTarget, PocketError> {
    let no_target = |reason: String| PocketError::NoTarget {
        backend: backend.to_string(),
        namespace: namespace.to_string(),
        reason,
    };

    let candidates = backend.service_candidates();
    let mut found: Option<(&str, BTreeMap<String, String>)> = None;
    for &name in candidates {
        match api.service_selector(namespace, name).await {
            Ok(Some(selector)) => {
                found = Some((name, selector));
                break;
            }
            Ok(None) => debug!(service = name, namespace, "service not found"),
            Err(e) => debug!(service = name, namespace, "service lookup failed: {e:#}"),
        }
    }

    let Some((service, selector)) = found else {
        return Err(no_target(format!(
            "no service found (tried: {})",
            candidates.join(", ")
        )));
    };
    if selector.is_empty() {
        return Err(no_target(format!("service {service} has no selector")));
    }

    let pod = api
        .first_pod_matching(namespace, &selector)
        .await
        .map_err(|e| no_target(format!("failed to list pods for service {service}: {e:#}")))?
        .ok_or_else(|| no_target(format!("no pods found for service {service}")))?;

    info!(service, pod = %pod, namespace, "resolved port-forward target");
    Ok(ResolvedTarget {
        service: service.to_string(),
        pod: ResourceHandle::existing(namespace, pod),
    })
}

/// Dial the target, then listen on `spec.address:spec.local_port` and
/// bridge every connection to it until `cancel` fires.
///
/// `ready` receives the bound address before the first accept. It is
/// dropped unsent when the target cannot be reached.
///
/// # Errors
///
/// Returns an error if the target cannot be dialed, the local address
/// cannot be bound, or `cancel` fires before the target answers.
/// Per-connection failures are logged and do not stop the listener.
pub async fn forward<D>(
    dialer: Arc<D>,
    spec: TunnelSpec,
    ready: oneshot::Sender<SocketAddr>,
    cancel: &CancellationToken,
) -> Result<()>
where
    D: TunnelDialer + Send + Sync + 'static,
{
    let target = &spec.target;
    let remote_port = spec.remote_port;
    let upstream = tokio::select! {
        () = cancel.cancelled() => return Err(PocketError::Interrupted.into()),
        upstream = dialer.dial(target, remote_port) => upstream
            .with_context(|| format!("failed to open tunnel to {target}:{remote_port}"))?,
    };
    debug!(%target, remote_port, "upstream established");

    let listener = TcpListener::bind((spec.address.as_str(), spec.local_port))
        .await
        .with_context(|| format!("failed to listen on {}:{}", spec.address, spec.local_port))?;
    let local = listener.local_addr().context("listener has no local address")?;
    let _ = ready.send(local);
    info!(%local, %target, remote_port, "forwarding");

    let mut dialed = Some(upstream);
    let bridges_cancel = cancel.child_token();
    let mut bridges = JoinSet::new();
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((conn, peer)) => {
                    debug!(%peer, reused = dialed.is_some(), "accepted connection");
                    bridges.spawn(bridge(
                        Arc::clone(&dialer),
                        dialed.take(),
                        target.clone(),
                        remote_port,
                        conn,
                        peer,
                        bridges_cancel.clone(),
                    ));
                }
                Err(e) => warn!("accept failed: {e}"),
            },
            Some(done) = bridges.join_next(), if !bridges.is_empty() => log_bridge(done),
        }
    }

    drop(listener);
    drop(dialed);
    bridges_cancel.cancel();
    while let Some(done) = bridges.join_next().await {
        log_bridge(done);
    }
    info!(%local, "listener closed");
    Ok(())
}

async fn bridge<D>(
    dialer: Arc<D>,
    dialed: Option<Upstream>,
    target: ResourceHandle,
    remote_port: u16,
    mut local: TcpStream,
    peer: SocketAddr,
    cancel: CancellationToken,
) -> Result<()>
where
    D: TunnelDialer,
{
    let Upstream { mut stream, finish } = match dialed {
        Some(upstream) => upstream,
        None => tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            upstream = dialer.dial(&target, remote_port) => upstream
                .with_context(|| format!("failed to open tunnel to {target}:{remote_port}"))?,
        },
    };

    let copied = tokio::select! {
        () = cancel.cancelled() => None,
        copied = tokio::io::copy_bidirectional(&mut local, &mut stream) => Some(copied),
    };
    drop(stream);

    match copied {
        None => {
            debug!(%peer, "connection closed by shutdown");
            Ok(())
        }
        Some(Ok((sent, received))) => {
            debug!(%peer, sent, received, "connection finished");
            finish.await
        }
        Some(Err(e)) => Err(e).with_context(|| format!("relay for {peer} failed")),
    }
}

fn log_bridge(done: Result<Result<()>, tokio::task::JoinError>) {
    match done {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("{e:#}"),
        Err(e) => warn!("connection task failed: {e}"),
    }
}
