//! Shared types for kubectl-pocket: backend descriptors and connection parsing.

pub mod backend;
pub mod connection;

pub use backend::{Backend, UnknownBackend};
pub use connection::{ConnectionError, ConnectionTarget, RedisTarget, parse_redis, redact};
