//! # Collector HTTP Client
//!
//! A thin `reqwest` wrapper that POSTs the diff document as
//! `application/json`. Failed documents are not retried.

use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;

use super::Transport;
use crate::configs::RelayConfig;
use crate::error::RelayError;

/// A reusable client bound to one collector URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    /// Returns `RelayError::Transport` if the TLS backend cannot be initialized.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Client for the endpoint and timeout named in `config`.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let user_agent = format!("esdata-relay/{}", config.plugin_version);
        Self::new(config.collector_url(), config.request_timeout(), &user_agent)
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, body: Vec<u8>) -> BoxFuture<'static, Result<(), RelayError>> {
        let request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        async move {
            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                let detail = response.text().await.unwrap_or_default();
                log::debug!("Collector rejected document ({}): {}", status, detail);
                Err(RelayError::HttpStatus(status.as_u16()))
            }
        }
        .boxed()
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
