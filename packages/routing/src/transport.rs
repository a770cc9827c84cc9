//! HTTP transport used by the routing client.
//!
//! The client only ever needs "GET this URL, give me status and body", so
//! the transport is a small trait. Production uses [`ReqwestTransport`];
//! tests script responses without touching the network.

use std::time::Duration;

use async_trait::async_trait;

use crate::RouteError;

/// Status code and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Issues a single GET request. Retrying is the caller's job.
#[async_trait]
pub trait RouteTransport: Send + Sync {
    /// Sends one GET request to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if no response could be obtained.
    async fn get(&self, url: &str) -> Result<TransportResponse, RouteError>;
}

/// [`RouteTransport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client with a per-attempt `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Http`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, RouteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ksi_map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RouteTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, RouteError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        log::debug!("GET {url} -> {status} ({} bytes)", body.len());

        Ok(TransportResponse { status, body })
    }
}
