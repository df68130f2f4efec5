//! # Relay Errors
//!
//! A single error enum for every fallible step of the relay. None of these ever
//! reach the host thread: recorders log and skip, the poster logs and drops.

use thiserror::Error;

/// Errors produced while recording or posting diffs.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The host handed over an entity whose identifier fails validation.
    #[error("invalid entity identifier: {0:?}")]
    InvalidEntity(String),

    /// The drained snapshot could not be turned into a JSON document.
    #[error("failed to serialize diff snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Connecting to or talking with the collector failed.
    #[error("failed to send request: {0}")]
    Transport(String),

    /// The collector answered with a non-success status.
    #[error("collector responded with HTTP {0}")]
    HttpStatus(u16),

    /// Another send held the single-flight permit for the whole wait window.
    #[error("send already in progress")]
    Busy,

    /// The background send task died before reporting back.
    #[error("send task aborted: {0}")]
    Join(String),
}

#[cfg(feature = "retrieve")]
impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => RelayError::HttpStatus(status.as_u16()),
            None => RelayError::Transport(e.to_string()),
        }
    }
}
