//! Ephemeral resource types: the spec submitted to the cluster, the handle
//! returned for it, and the lifecycle phases observed while polling.
//!
//! Pure data only; no I/O.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name this tool stamps on everything it creates.
pub const TOOL_NAME: &str = "kubectl-pocket";

/// Label key identifying the managing tool.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Label key marking a resource as disposable.
pub const TEMPORARY_LABEL: &str = "kubectl-pocket/temporary";

/// Name of the single container in every pod this tool creates.
pub const MAIN_CONTAINER: &str = "main";

/// Ownership labels applied to every created pod so orphans can be swept.
#[must_use]
pub fn ownership_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), TOOL_NAME.to_string()),
        (TEMPORARY_LABEL.to_string(), "true".to_string()),
    ])
}

/// Generate a pod name of the form `pocket-<kind>-<unix-seconds>`.
///
/// Names are time-derived; two invocations in the same second collide and
/// the second `create` is rejected by the API server.
#[must_use]
pub fn generate_resource_name(kind: &str, now: DateTime<Utc>) -> String {
    format!("pocket-{kind}-{}", now.timestamp())
}

/// Environment variable passed to the main container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Desired state of one ephemeral workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<EnvVar>,
    pub tty: bool,
    pub stdin: bool,
}

impl ResourceSpec {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            image: image.into(),
            command: Vec::new(),
            args: Vec::new(),
            env: Vec::new(),
            tty: false,
            stdin: false,
        }
    }

    #[must_use]
    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn env(mut self, env: Vec<EnvVar>) -> Self {
        self.env = env;
        self
    }

    /// Allocate a TTY and keep stdin open, for pods that will be attached to.
    #[must_use]
    pub fn interactive(mut self) -> Self {
        self.tty = true;
        self.stdin = true;
        self
    }
}

/// Identity of a pod this invocation works with.
///
/// Created pods carry the spec they were created from; pods discovered for
/// port-forwarding carry only their coordinates. Two handles are the same
/// pod when namespace and name match.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    spec: ResourceSpec,
    created_at: DateTime<Utc>,
}

impl ResourceHandle {
    /// Handle for a pod that was just created from `spec`.
    #[must_use]
    pub fn created(spec: ResourceSpec, created_at: DateTime<Utc>) -> Self {
        Self { spec, created_at }
    }

    /// Handle for a pod that already exists in the cluster.
    pub fn existing(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spec: ResourceSpec::new(name, namespace, String::new()),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.spec.namespace
    }

    #[must_use]
    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn wants_tty(&self) -> bool {
        self.spec.tty
    }

    #[must_use]
    pub fn wants_stdin(&self) -> bool {
        self.spec.stdin
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.spec.namespace == other.spec.namespace && self.spec.name == other.spec.name
    }
}

impl Eq for ResourceHandle {}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spec.namespace, self.spec.name)
    }
}

/// Pod lifecycle phase as reported in `status.phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LifecyclePhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl LifecyclePhase {
    /// Succeeded and Failed are final; nothing follows them.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecyclePhase::Succeeded | LifecyclePhase::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecyclePhase::Pending => "Pending",
            LifecyclePhase::Running => "Running",
            LifecyclePhase::Succeeded => "Succeeded",
            LifecyclePhase::Failed => "Failed",
            LifecyclePhase::Unknown => "Unknown",
        }
    }
}

impl From<&str> for LifecyclePhase {
    /// Unrecognized values map to [`LifecyclePhase::Unknown`].
    fn from(value: &str) -> Self {
        match value {
            "Pending" => LifecyclePhase::Pending,
            "Running" => LifecyclePhase::Running,
            "Succeeded" => LifecyclePhase::Succeeded,
            "Failed" => LifecyclePhase::Failed,
            _ => LifecyclePhase::Unknown,
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a pod's status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub phase: LifecyclePhase,
    pub reason: Option<String>,
    pub message: Option<String>,
    /// Exit code of the main container once it has terminated.
    pub exit_code: Option<i32>,
}

impl StatusSnapshot {
    #[must_use]
    pub fn with_phase(phase: LifecyclePhase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }
}

/// Outcome of a satisfied poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub phase: LifecyclePhase,
    pub snapshot: StatusSnapshot,
}
