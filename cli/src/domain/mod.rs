//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod probe;
pub mod resource;
pub mod session;

pub use config::PocketConfig;
pub use error::{CleanupWarning, ConfigError, PocketError};
pub use probe::{ProbePlan, ProbeReport, ProbeVerdict, ShellPlan};
pub use resource::{
    EnvVar, LifecyclePhase, PollResult, ResourceHandle, ResourceSpec, StatusSnapshot,
};
pub use session::{RemoteExit, TerminalSize};
