//! Command implementations

pub mod pf;
pub mod version;
