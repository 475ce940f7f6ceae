//! Domain types and validators for pocket configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::time::Duration;

use anyhow::Result;
use pocket_common::Backend;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.pocket/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PocketConfig {
    /// Namespace used when `--namespace` is not given. Falls back to the
    /// kubeconfig context's namespace when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Polling and cleanup budgets.
    pub timeouts: TimeoutConfig,
    /// Client image overrides.
    pub images: ImageConfig,
}

/// Timing budgets, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Delay between status reads while waiting on a pod.
    pub poll_interval_secs: u64,
    /// How long a shell pod may take to reach `Running`.
    pub ready_secs: u64,
    /// Budget for deleting the pod once the operation is over.
    pub cleanup_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            ready_secs: 120,
            cleanup_secs: 10,
        }
    }
}

/// Per-backend client image overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mongo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<String>,
}

impl PocketConfig {
    /// Client image for `backend`, honoring overrides.
    #[must_use]
    pub fn image_for(&self, backend: Backend) -> &str {
        let custom = match backend {
            Backend::Redis => self.images.redis.as_deref(),
            Backend::Mongo => self.images.mongo.as_deref(),
            Backend::Postgres => self.images.postgres.as_deref(),
        };
        custom.unwrap_or_else(|| backend.default_image())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.timeouts.poll_interval_secs)
    }

    #[must_use]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.ready_secs)
    }

    #[must_use]
    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.cleanup_secs)
    }

    /// Reject budgets that would make polling or cleanup meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero or an image override is blank.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("timeouts.poll_interval_secs", self.timeouts.poll_interval_secs),
            ("timeouts.ready_secs", self.timeouts.ready_secs),
            ("timeouts.cleanup_secs", self.timeouts.cleanup_secs),
        ] {
            validate_positive(key, value)?;
        }
        for (key, value) in [
            ("images.redis", &self.images.redis),
            ("images.mongo", &self.images.mongo),
            ("images.postgres", &self.images.postgres),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: "\"\"".to_string(),
                    valid: "a non-empty image reference".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

fn validate_positive(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            valid: "an integer number of seconds greater than 0".to_string(),
        }
        .into());
    }
    Ok(())
}
