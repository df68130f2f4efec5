//! # Collector Transport
//!
//! The seam between the poster and the network. The poster only knows how to
//! hand a finished JSON body to a `Transport`; the HTTP details live in
//! `collector_http`, and tests plug in their own implementation.
//!
//! ## Contained Modules:
//!
//! - **`collector_http`**: `HttpTransport`, a `reqwest` client that POSTs the
//!   diff document to the collector endpoint.

#![forbid(unsafe_code)]

use futures_util::future::BoxFuture;

use crate::error::RelayError;

/// HTTP POST of the diff document to the collector.
#[cfg(feature = "retrieve")]
pub mod collector_http;

#[cfg(feature = "retrieve")]
pub use collector_http::HttpTransport;

/// Delivers one serialized diff document.
///
/// The returned future must be `'static` so the poster can drive it from a
/// spawned task; implementations clone what they need out of `self`.
pub trait Transport: Send + Sync {
    /// Sends `body` (a JSON object) and resolves once the collector answered.
    fn post_json(&self, body: Vec<u8>) -> BoxFuture<'static, Result<(), RelayError>>;

    /// Where the documents go, for log lines.
    fn endpoint(&self) -> &str;
}
