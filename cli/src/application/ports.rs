//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.
//!
//! Cluster ports return `Send` futures so services can hand them to spawned
//! tasks (cleanup on drop, per-connection tunnel bridges). Implementations
//! may still be written with plain `async fn`.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::domain::{PocketConfig, RemoteExit, ResourceHandle, ResourceSpec, StatusSnapshot, TerminalSize};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// The object was already gone (or never created).
    NotFound,
}

/// Boxed read half handed across the port boundary.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed write half handed across the port boundary.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A bidirectional byte stream.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> DuplexStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// The remote end of an attached process.
///
/// Streams are `None` when the corresponding channel was not requested
/// (stderr is merged into stdout when a TTY is allocated).
pub struct RemoteProcess {
    pub stdin: Option<BoxedWriter>,
    pub stdout: Option<BoxedReader>,
    pub stderr: Option<BoxedReader>,
    /// Present when a TTY was allocated.
    pub resize: Option<mpsc::Sender<TerminalSize>>,
    /// Resolves once the remote process has exited or the connection dropped.
    pub exit: BoxFuture<'static, RemoteExit>,
}

/// One upstream stream to a remote container port.
pub struct Upstream {
    pub stream: Box<dyn DuplexStream>,
    /// Completes once the underlying upgraded connection has shut down.
    /// Awaited after the stream is dropped.
    pub finish: BoxFuture<'static, Result<()>>,
}

// ── Cluster Port Traits ───────────────────────────────────────────────────────

/// Pod CRUD and log retrieval.
pub trait WorkloadApi {
    /// Submit a pod built from `spec`, labelled as owned by this tool.
    fn create_pod(&self, spec: &ResourceSpec) -> impl Future<Output = Result<()>> + Send;

    /// Delete a pod. A missing pod is reported as [`Deletion::NotFound`], not an error.
    fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Deletion>> + Send;

    /// Read a pod's status. `Ok(None)` means the pod is not (yet) visible.
    fn pod_status(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<StatusSnapshot>>> + Send;

    /// Read the main container's accumulated output to completion.
    fn pod_logs(&self, namespace: &str, name: &str)
    -> impl Future<Output = Result<String>> + Send;
}

/// Service lookup used to resolve port-forward targets.
pub trait ServiceDiscovery {
    /// The label selector of a Service, or `None` if the Service does not exist.
    fn service_selector(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<BTreeMap<String, String>>>> + Send;

    /// Name of the first pod matching `selector`, if any.
    fn first_pod_matching(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Attach/exec channel into a running pod.
pub trait ExecChannel {
    /// Start `command` in the main container over an upgraded connection.
    fn exec(
        &self,
        handle: &ResourceHandle,
        command: &[String],
        tty: bool,
    ) -> impl Future<Output = Result<RemoteProcess>> + Send;
}

/// Raw TCP tunnel into a pod.
pub trait TunnelDialer {
    /// Open a stream to `remote_port` of `target`.
    fn dial(
        &self,
        target: &ResourceHandle,
        remote_port: u16,
    ) -> impl Future<Output = Result<Upstream>> + Send;
}

/// Composite trait: any type implementing all cluster ports is a `ClusterApi`.
pub trait ClusterApi: WorkloadApi + ServiceDiscovery + ExecChannel + TunnelDialer {}

/// Blanket implementation: any type implementing all four ports is a `ClusterApi`.
impl<T> ClusterApi for T where T: WorkloadApi + ServiceDiscovery + ExecChannel + TunnelDialer {}

// ── Terminal Port ─────────────────────────────────────────────────────────────

/// Control over the local controlling terminal.
pub trait TerminalControl {
    /// Whether stdin is attached to a terminal.
    fn is_terminal(&self) -> bool;
    /// Switch to raw mode: no line buffering, no signal translation.
    fn enable_raw(&self) -> Result<()>;
    /// Return to the mode that was active before `enable_raw`.
    fn disable_raw(&self) -> Result<()>;
    /// Current size, if it can be determined.
    fn size(&self) -> Option<TerminalSize>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading of the user configuration.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    fn load(&self) -> Result<PocketConfig>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
