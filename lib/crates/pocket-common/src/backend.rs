//! Supported database backends and their static descriptors.

use serde::{Deserialize, Serialize};

/// A database backend that pocket knows how to probe, shell into and forward to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Backend {
    Redis,
    #[cfg_attr(feature = "clap", value(alias = "mongodb"))]
    Mongo,
    #[cfg_attr(feature = "clap", value(aliases = ["postgresql", "pg"]))]
    Postgres,
}

impl Backend {
    /// Every supported backend, in display order.
    pub const ALL: [Backend; 3] = [Backend::Redis, Backend::Mongo, Backend::Postgres];

    /// Short lowercase name, used in pod names and messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Redis => "redis",
            Backend::Mongo => "mongo",
            Backend::Postgres => "postgres",
        }
    }

    /// Human-facing product name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::Redis => "Redis",
            Backend::Mongo => "MongoDB",
            Backend::Postgres => "PostgreSQL",
        }
    }

    /// Port the backend listens on inside the cluster.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Backend::Redis => 6379,
            Backend::Mongo => 27017,
            Backend::Postgres => 5432,
        }
    }

    /// Container image carrying the backend's client tool.
    #[must_use]
    pub fn default_image(self) -> &'static str {
        match self {
            Backend::Redis => "redis:7-alpine",
            Backend::Mongo => "mongo:7",
            Backend::Postgres => "postgres:14-alpine",
        }
    }

    /// Service names tried, in order, when resolving a port-forward target.
    #[must_use]
    pub fn service_candidates(self) -> &'static [&'static str] {
        match self {
            Backend::Redis => &["redis", "redis-master", "redis-svc"],
            Backend::Mongo => &["mongo", "mongodb", "mongo-svc"],
            Backend::Postgres => &["postgres", "postgresql", "pg", "pg-svc"],
        }
    }

    /// What to type to leave the backend's interactive client.
    #[must_use]
    pub fn quit_hint(self) -> &'static str {
        match self {
            Backend::Redis => "quit",
            Backend::Mongo => "exit",
            Backend::Postgres => "\\q",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "mongo" | "mongodb" => Ok(Backend::Mongo),
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Returned when a backend name is not one of the supported databases.
#[derive(Debug, thiserror::Error)]
#[error("unsupported database: {0} (supported: redis, mongo, postgres)")]
pub struct UnknownBackend(pub String);
