//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application` or `tokio`. All error types implement
//! `thiserror::Error` and convert to `anyhow::Error` via the `?` operator.

use std::time::Duration;

use thiserror::Error;

use crate::domain::resource::LifecyclePhase;

// ── Workload errors ───────────────────────────────────────────────────────────

/// Errors raised while driving an ephemeral pod.
///
/// Every variant except `TransientRead` is fatal for the current operation.
/// `TransientRead` is absorbed by the poller and only seen by callers that
/// read status directly.
#[derive(Debug, Error)]
pub enum PocketError {
    #[error("failed to create pod {name}: {reason}")]
    Create { name: String, reason: String },

    #[error("failed to read status of pod {name}: {reason}")]
    TransientRead { name: String, reason: String },

    #[error(
        "timed out after {}s waiting for pod {name} (last phase: {last_phase})",
        .timeout.as_secs()
    )]
    Timeout {
        name: String,
        timeout: Duration,
        last_phase: LifecyclePhase,
    },

    #[error("pod {name} is not running (phase: {phase}); cannot attach")]
    NotReady { name: String, phase: LifecyclePhase },

    #[error("failed to retrieve logs of pod {name}: {reason}")]
    LogRetrieval { name: String, reason: String },

    #[error("no {backend} target in namespace {namespace}: {reason}")]
    NoTarget {
        backend: String,
        namespace: String,
        reason: String,
    },

    #[error("session ended with an error: {reason}")]
    Session { reason: String },

    #[error("interrupted")]
    Interrupted,

    #[error("{backend} connection test failed")]
    ProbeFailed { backend: String },
}

// ── Cleanup warnings ──────────────────────────────────────────────────────────

/// A failed deletion. Reported to the user, never returned as a command error.
#[derive(Debug, Error)]
#[error("failed to delete pod {namespace}/{name}: {reason}")]
pub struct CleanupWarning {
    pub namespace: String,
    pub name: String,
    pub reason: String,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
