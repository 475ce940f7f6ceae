//! Connection-string parsing for the supported backends.
//!
//! Redis targets are split into host, port and password because `redis-cli`
//! takes them as separate flags. Mongo and Postgres connection strings are
//! handed to `mongosh`/`psql` verbatim, so they are only validated for
//! emptiness and redacted for display.

use serde::Serialize;
use thiserror::Error;

use crate::backend::Backend;

const REDIS_SCHEME: &str = "redis://";

/// Errors produced while parsing a connection string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection string is empty")]
    Empty,

    #[error("connection string has no host: {0}")]
    MissingHost(String),

    #[error("invalid port '{port}' in connection string")]
    InvalidPort { port: String },
}

/// A Redis endpoint as understood by `redis-cli`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisTarget {
    pub host: String,
    pub port: u16,
    /// Empty when no password was given.
    #[serde(skip)]
    pub password: String,
}

/// A parsed connection target for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Redis(RedisTarget),
    /// Full URI passed through to the client tool untouched.
    Uri { backend: Backend, uri: String },
}

impl ConnectionTarget {
    /// Parse `conn` according to the rules of `backend`.
    pub fn parse(backend: Backend, conn: &str) -> Result<Self, ConnectionError> {
        let conn = conn.trim();
        if conn.is_empty() {
            return Err(ConnectionError::Empty);
        }
        match backend {
            Backend::Redis => parse_redis(conn).map(ConnectionTarget::Redis),
            Backend::Mongo | Backend::Postgres => Ok(ConnectionTarget::Uri {
                backend,
                uri: conn.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            ConnectionTarget::Redis(_) => Backend::Redis,
            ConnectionTarget::Uri { backend, .. } => *backend,
        }
    }

    /// Display form with any password masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            ConnectionTarget::Redis(t) => format!("{}:{}", t.host, t.port),
            ConnectionTarget::Uri { uri, .. } => redact(uri),
        }
    }
}

/// Parse the Redis connection forms `host`, `host:port`, `redis://host:port`,
/// `redis://:password@host` and `redis://:password@host:port`.
///
/// The port defaults to 6379 and the password to the empty string.
pub fn parse_redis(conn: &str) -> Result<RedisTarget, ConnectionError> {
    let mut rest = conn.trim();
    if rest.is_empty() {
        return Err(ConnectionError::Empty);
    }
    rest = rest.strip_prefix(REDIS_SCHEME).unwrap_or(rest);

    let mut password = String::new();
    if let Some((userinfo, host_part)) = rest.split_once('@') {
        // userinfo is `:password` or `user:password`; redis-cli only needs the password
        password = match userinfo.split_once(':') {
            Some((_, pw)) => pw.to_string(),
            None => userinfo.to_string(),
        };
        rest = host_part;
    }

    let (host, port) = match rest.split_once(':') {
        Some((host, port)) => {
            let port = port.trim_end_matches('/');
            let parsed = port.parse::<u16>().map_err(|_| ConnectionError::InvalidPort {
                port: port.to_string(),
            })?;
            (host, parsed)
        }
        None => (rest.trim_end_matches('/'), Backend::Redis.default_port()),
    };

    if host.is_empty() {
        return Err(ConnectionError::MissingHost(conn.to_string()));
    }

    Ok(RedisTarget {
        host: host.to_string(),
        port,
        password,
    })
}

/// Mask the password of a URI-style connection string.
///
/// Strings that are not URIs, or carry no password, are returned unchanged.
#[must_use]
pub fn redact(conn: &str) -> String {
    match url::Url::parse(conn) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("****")).is_ok() {
                parsed.to_string()
            } else {
                conn.to_string()
            }
        }
        _ => conn.to_string(),
    }
}
