//! # Poster
//!
//! Ships the diff buffer to the collector without ever blocking the caller.
//!
//! ## Core Functionality:
//!
//! - **Fire-and-forget**: `dispatch` spawns the whole send onto the stored
//!   runtime handle and returns immediately.
//!
//! - **Single flight**: a one-permit semaphore guards the send path. A dispatch
//!   waits at most `lock_timeout` for it; if another send still holds it, the
//!   dispatch is skipped and the buffer is left as it is for the next cycle.
//!
//! - **Swap under the permit**: only a dispatch holding the permit drains the
//!   buffer, so a skipped dispatch never takes data out.
//!
//! - **At-most-once**: a drained snapshot is sent once and then dropped,
//!   whatever the outcome. The last failure is kept for the status command and
//!   cleared by the next success.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::core::diff_buffer::{self, SharedDiffBuffer};
use crate::error::RelayError;
use crate::retrieve::Transport;

/// How a dispatch ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The snapshot reached the collector.
    Sent { entities: usize, bytes: usize },
    /// The buffer was empty by the time the permit was held.
    Empty,
}

/// # Poster
#[derive(Clone)]
pub struct Poster {
    transport: Arc<dyn Transport>,
    buffer: SharedDiffBuffer,
    in_flight: Arc<Semaphore>,
    lock_timeout: Duration,
    last_error: Arc<Mutex<Option<String>>>,
    runtime: Handle,
}

impl Poster {
    pub fn new(
        transport: Arc<dyn Transport>,
        buffer: SharedDiffBuffer,
        lock_timeout: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            transport,
            buffer,
            in_flight: Arc::new(Semaphore::new(1)),
            lock_timeout,
            last_error: Arc::new(Mutex::new(None)),
            runtime,
        }
    }

    /// Starts a send in the background. The handle may be dropped.
    pub fn dispatch(&self) -> JoinHandle<Result<DispatchOutcome, RelayError>> {
        let poster = self.clone();
        self.runtime.spawn(async move {
            let result = poster.send_once().await;
            match &result {
                Ok(DispatchOutcome::Sent { entities, bytes }) => {
                    log::debug!(
                        "Posted {} entities ({} bytes) to {}",
                        entities,
                        bytes,
                        poster.transport.endpoint()
                    );
                    poster.set_last_error(None);
                }
                Ok(DispatchOutcome::Empty) => {}
                Err(RelayError::Busy) => {
                    log::debug!("Send already in progress, skipping this cycle");
                }
                Err(e) => {
                    log::warn!("Failed to post diff to {}: {}", poster.transport.endpoint(), e);
                    poster.set_last_error(Some(e.to_string()));
                }
            }
            result
        })
    }

    /// Dispatches and waits for the outcome.
    pub async fn flush(&self) -> Result<DispatchOutcome, RelayError> {
        self.dispatch()
            .await
            .map_err(|e| RelayError::Join(e.to_string()))?
    }

    async fn send_once(&self) -> Result<DispatchOutcome, RelayError> {
        let acquire = tokio::time::timeout(self.lock_timeout, self.in_flight.acquire());
        let _permit = match acquire.await {
            Ok(Ok(permit)) => permit,
            _ => return Err(RelayError::Busy),
        };

        let snapshot = diff_buffer::lock(&self.buffer).drain();
        if snapshot.is_empty() {
            return Ok(DispatchOutcome::Empty);
        }

        let body = serde_json::to_vec(&snapshot)?;
        let outcome = DispatchOutcome::Sent {
            entities: snapshot.len(),
            bytes: body.len(),
        };
        self.transport.post_json(body).await?;
        Ok(outcome)
    }

    /// Whether a send currently holds the permit.
    pub fn is_busy(&self) -> bool {
        self.in_flight.available_permits() == 0
    }

    /// The most recent send failure, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }
}
