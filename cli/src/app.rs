//! Application context: unified state passed to every command handler.
//!
//! `AppContext` gathers the output context, the loaded configuration, the
//! invocation's cancellation token and the registry of created pods. The
//! cluster client is built separately by [`AppContext::connect`] so commands
//! that never touch the cluster do not need credentials.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::services::cleanup::ResourceRegistry;
use crate::domain::PocketConfig;
use crate::infra::cluster::{ClusterOptions, KubeCluster};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Cluster selection flags.
#[derive(Default)]
pub struct ClusterFlags {
    pub namespace: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Which cluster and namespace to use.
    pub cluster: ClusterFlags,
    /// Budget for a connection test pod to finish.
    pub probe_timeout: Duration,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Loaded user configuration.
    pub config: PocketConfig,
    /// Cluster selection, flags merged over the config file.
    pub cluster: ClusterOptions,
    /// Budget for a connection test pod to finish.
    pub probe_timeout: Duration,
    /// Pods created during this invocation.
    pub registry: Arc<ResourceRegistry>,
    /// Cancelled on SIGINT/SIGTERM.
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and the loaded config.
    #[must_use]
    pub fn new(flags: AppFlags, config: PocketConfig) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON documents own stdout; progress lines would corrupt them.
        let quiet = flags.output.quiet || flags.output.json;

        let cluster = ClusterOptions {
            kubeconfig: flags.cluster.kubeconfig,
            context: flags.cluster.context,
            namespace: flags.cluster.namespace.or_else(|| config.namespace.clone()),
        };

        Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config,
            cluster,
            probe_timeout: flags.probe_timeout,
            registry: Arc::new(ResourceRegistry::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter bound to this context's output.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Build the cluster client for this invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable cluster configuration is found.
    pub async fn connect(&self) -> Result<Arc<KubeCluster>> {
        Ok(Arc::new(KubeCluster::connect(&self.cluster).await?))
    }

    /// Delete anything this invocation created and did not release.
    pub async fn sweep(&self, cluster: &KubeCluster) {
        for warning in self
            .registry
            .sweep(cluster, self.config.cleanup_timeout())
            .await
        {
            warn!("{warning}");
            self.output.warn(&warning.to_string());
        }
    }
}
