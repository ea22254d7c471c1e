//! Transport for reading the station's status report.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::TransportError;

// ---

/// Anything that can hand back one raw report body.
#[async_trait]
pub trait ReportSource {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// Single plain HTTP GET per fetch. No retries, client default timeouts and
/// redirect policy.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReportSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        // ---
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Fetching report from: {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body = response.text().await.map_err(TransportError::Body)?;
        debug!("Report body ({} bytes): {:?}", body.len(), body);

        Ok(body)
    }
}
