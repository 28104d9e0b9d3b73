//! Coverage retrieval

use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use super::AnalysisError;

/// Fetches a coverage payload by URL
#[async_trait]
pub trait CoverageFetcher: Send + Sync {
    /// Returns the full response body of a 2xx response
    async fn fetch(&self, url: &str) -> Result<Bytes, AnalysisError>;
}

/// `reqwest`-backed fetcher: a single GET, no retries
#[derive(Debug, Clone)]
pub struct HttpCoverageFetcher {
    client: reqwest::Client,
}

impl HttpCoverageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CoverageFetcher for HttpCoverageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, AnalysisError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "coverage response");
        if !status.is_success() {
            return Err(AnalysisError::Service { status: status.as_u16() });
        }

        response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))
    }
}
