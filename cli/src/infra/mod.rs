//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the cluster client, the
//! local terminal, the config file, and process signals.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod cluster;
pub mod signals;
pub mod terminal;
