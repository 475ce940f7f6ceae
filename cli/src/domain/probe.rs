//! Probe and shell plans per backend, and the verdict policy for probes.
//!
//! A probe pod runs the backend's client once against the target and exits.
//! Exit status alone is not trusted: `redis-cli` exits zero after printing
//! `NOAUTH`, so success also requires a backend-specific marker in the output.

use std::time::Duration;

use pocket_common::{Backend, ConnectionTarget};
use serde::Serialize;

use crate::domain::resource::{EnvVar, LifecyclePhase, ResourceSpec};

/// How long a shell pod stays alive when nobody deletes it.
pub const SHELL_POD_LIFETIME_SECS: u32 = 3600;

/// What to run inside a one-shot probe pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePlan {
    pub backend: Backend,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<EnvVar>,
    /// Text that must appear in the output for the probe to count as a success.
    pub marker: Option<&'static str>,
}

impl ProbePlan {
    /// Build the plan for `target`, running the client from `image`.
    ///
    /// `timeout` bounds the client's own connect attempt where the client
    /// supports it.
    #[must_use]
    pub fn new(target: &ConnectionTarget, image: &str, timeout: Duration) -> Self {
        let backend = target.backend();
        let (command, args, env, marker) = match target {
            ConnectionTarget::Redis(t) => (
                vec!["redis-cli".to_string()],
                vec![
                    "-h".to_string(),
                    t.host.clone(),
                    "-p".to_string(),
                    t.port.to_string(),
                    "PING".to_string(),
                ],
                redis_auth_env(&t.password),
                Some("PONG"),
            ),
            ConnectionTarget::Uri {
                backend: Backend::Postgres,
                uri,
            } => (
                vec!["psql".to_string()],
                vec![
                    uri.clone(),
                    "-c".to_string(),
                    "SELECT 1 as connection_test;".to_string(),
                ],
                vec![EnvVar::new(
                    "PGCONNECT_TIMEOUT",
                    timeout.as_secs().max(1).to_string(),
                )],
                Some("(1 row)"),
            ),
            ConnectionTarget::Uri { uri, .. } => (
                vec!["mongosh".to_string()],
                vec![
                    uri.clone(),
                    "--eval".to_string(),
                    "db.runCommand({ping: 1})".to_string(),
                    "--quiet".to_string(),
                ],
                Vec::new(),
                Some("ok: 1"),
            ),
        };
        Self {
            backend,
            image: image.to_string(),
            command,
            args,
            env,
            marker,
        }
    }

    /// Pod spec for running this plan as `name` in `namespace`.
    #[must_use]
    pub fn pod_spec(&self, name: &str, namespace: &str) -> ResourceSpec {
        ResourceSpec::new(name, namespace, &self.image)
            .command(self.command.clone())
            .args(self.args.clone())
            .env(self.env.clone())
    }
}

/// What to create and attach to for an interactive client shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellPlan {
    pub backend: Backend,
    pub image: String,
    pub env: Vec<EnvVar>,
    /// Command executed inside the idle pod once it is running.
    pub exec_command: Vec<String>,
}

impl ShellPlan {
    #[must_use]
    pub fn new(target: &ConnectionTarget, image: &str) -> Self {
        let backend = target.backend();
        let (exec_command, env) = match target {
            ConnectionTarget::Redis(t) => (
                vec![
                    "redis-cli".to_string(),
                    "-h".to_string(),
                    t.host.clone(),
                    "-p".to_string(),
                    t.port.to_string(),
                ],
                redis_auth_env(&t.password),
            ),
            ConnectionTarget::Uri {
                backend: Backend::Postgres,
                uri,
            } => (vec!["psql".to_string(), uri.clone()], Vec::new()),
            ConnectionTarget::Uri { uri, .. } => {
                (vec!["mongosh".to_string(), uri.clone()], Vec::new())
            }
        };
        Self {
            backend,
            image: image.to_string(),
            env,
            exec_command,
        }
    }

    /// Idle pod that keeps running until deleted, ready for `exec`.
    #[must_use]
    pub fn pod_spec(&self, name: &str, namespace: &str) -> ResourceSpec {
        ResourceSpec::new(name, namespace, &self.image)
            .command(["sleep".to_string(), SHELL_POD_LIFETIME_SECS.to_string()])
            .env(self.env.clone())
            .interactive()
    }
}

// `redis-cli` reads the password from REDISCLI_AUTH, which keeps it out of
// the pod's args and suppresses the "-a is insecure" banner.
fn redis_auth_env(password: &str) -> Vec<EnvVar> {
    if password.is_empty() {
        Vec::new()
    } else {
        vec![EnvVar::new("REDISCLI_AUTH", password)]
    }
}

/// Interpretation of a finished probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    Success,
    /// The pod did not reach `Succeeded`.
    PhaseFailed(LifecyclePhase),
    /// The pod succeeded but its output lacks the expected marker.
    MarkerMissing(&'static str),
}

impl ProbeVerdict {
    /// A probe succeeds only if the pod phase is `Succeeded` and, when a
    /// marker is given, the output contains it.
    #[must_use]
    pub fn interpret(phase: LifecyclePhase, output: &str, marker: Option<&'static str>) -> Self {
        if phase != LifecyclePhase::Succeeded {
            return ProbeVerdict::PhaseFailed(phase);
        }
        match marker {
            Some(m) if !output.contains(m) => ProbeVerdict::MarkerMissing(m),
            _ => ProbeVerdict::Success,
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == ProbeVerdict::Success
    }
}

/// Machine-readable probe result for `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub backend: Backend,
    pub target: String,
    pub pod: String,
    pub namespace: String,
    pub phase: LifecyclePhase,
    pub success: bool,
    pub output: String,
}
