//! Application services: use-case orchestration.
//!
//! The lower modules (`lifecycle`, `poller`, `logs`, `cleanup`, `session`,
//! `tunnel`) each own one concern of driving an ephemeral pod. `probe`,
//! `shell` and `forward` compose them into the three user-facing flows.
//! Services import only from `crate::domain` and `crate::application::ports`.

pub mod cleanup;
pub mod forward;
pub mod lifecycle;
pub mod logs;
pub mod poller;
pub mod probe;
pub mod session;
pub mod shell;
pub mod tunnel;
