//! # lib_esdata
//!
//! Turns a stream of flight plan and controller events into compact per-callsign
//! diffs and posts them to the esdata collector as one JSON document every few
//! seconds.
//!
//! The host (a radar client or the `server_esdata` replay binary) calls into a
//! [`Relay`]: one method per event callback, `on_timer` once a second and
//! `on_command` for operator commands.

// Declare the modules to re-export
pub mod commands;
pub mod configs;
pub mod core;
pub mod error;
pub mod model;
pub mod relay;
pub mod retrieve;

pub use commands::{COMMAND_PREFIX, Command};
pub use configs::RelayConfig;
pub use crate::core::poster::DispatchOutcome;
pub use error::RelayError;
pub use model::*;
pub use relay::{DispatchHandle, Relay};
pub use retrieve::Transport;
#[cfg(feature = "retrieve")]
pub use retrieve::HttpTransport;
