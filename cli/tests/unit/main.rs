//! Unit tests for kubectl-pocket
//!
//! These tests drive the application services against in-memory fakes and
//! run fast without a cluster.

mod architecture;
mod config_store;
mod probe_service;
mod session_service;
