//! HTTP transport shared by the registry client and the resolution checker.
//!
//! Everything that touches the network goes through [`HttpTransport`], so the
//! pagination and retry logic above it can be driven by an in-memory transport
//! in tests.

use crate::error::DoiCheckError;
use async_trait::async_trait;
use std::time::Duration;

/// Response to a GET whose body we need (registry listing pages).
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub status: u16,
    pub body: String,
}

/// Outcome of a redirect-following GET whose body we ignore (resolver probes).
#[derive(Debug, Clone)]
pub struct Probe {
    /// Final status after following redirects
    pub status: u16,
    /// URL of the final response
    pub final_url: String,
}

/// Minimal async HTTP client interface.
///
/// `Err` means no response was received (connection failure, timeout,
/// redirect loop). Any received status, including 4xx/5xx, is `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and read the body as text.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<TextResponse, DoiCheckError>;

    /// GET `url`, following redirects, without reading the body.
    async fn probe(&self, url: &str, timeout: Duration) -> Result<Probe, DoiCheckError>;
}

/// [`HttpTransport`] backed by a pooled `reqwest::Client`.
///
/// Redirects follow reqwest's default policy (at most 10 hops); exceeding it
/// is reported as a transport error.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport sending the given User-Agent.
    pub fn new(user_agent: &str) -> Result<Self, DoiCheckError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                DoiCheckError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self { http_client })
    }

    fn map_error(url: &str, timeout: Duration, err: reqwest::Error) -> DoiCheckError {
        if err.is_timeout() {
            DoiCheckError::timeout(format!("GET {}", url), timeout)
        } else {
            DoiCheckError::from(err)
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<TextResponse, DoiCheckError> {
        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_error(url, timeout, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(url, timeout, e))?;

        Ok(TextResponse { status, body })
    }

    async fn probe(&self, url: &str, timeout: Duration) -> Result<Probe, DoiCheckError> {
        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_error(url, timeout, e))?;

        Ok(Probe {
            status: response.status().as_u16(),
            final_url: response.url().to_string(),
        })
    }
}
