//! # Configuration Modules
//!
//! Tunables of the relay engine. Loading them from files, the environment or
//! the command line is left to the embedding binary.

/// Engine tunables with their defaults.
pub mod relay_config;

pub use relay_config::RelayConfig;
