//! HTTP transport with per-call-site timeout tiers.
//!
//! One client for page fetches (moderate timeout) and one for binary
//! downloads (long timeout - downloads may be large). Both follow redirects.
//! Timeouts surface as ordinary [`FetchError`]s, not a distinct type.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Connect timeout shared by both clients (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Total timeout for page fetches (30 seconds).
pub const PAGE_TIMEOUT_SECS: u64 = 30;

/// Total timeout for binary downloads (1 hour).
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

/// HTTP transport shared by the resolver and the downloader.
///
/// Created once and cloned freely; the underlying clients pool connections.
#[derive(Debug, Clone)]
pub struct Transport {
    page_client: Client,
    download_client: Client,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    /// Creates a transport with the default timeout tiers.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            page_client: build_client(PAGE_TIMEOUT_SECS)
                .expect("failed to build page HTTP client with static configuration"),
            download_client: build_client(DOWNLOAD_TIMEOUT_SECS)
                .expect("failed to build download HTTP client with static configuration"),
        }
    }

    /// Fetches one HTML page and returns its body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for invalid URLs, transport failures,
    /// timeouts, and non-2xx statuses.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = send_get(&self.page_client, url).await?;
        debug!(status = response.status().as_u16(), "page fetched");
        response
            .text()
            .await
            .map_err(|source| FetchError::network(url, source))
    }

    /// Issues the GET for a binary download and returns the streaming
    /// response after the header-time status check. The caller consumes the
    /// body chunk by chunk.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for invalid URLs, transport failures,
    /// timeouts, and non-2xx statuses at header time.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn start_download(&self, url: &str) -> Result<Response, FetchError> {
        send_get(&self.download_client, url).await
    }
}

async fn send_get(client: &Client, url: &str) -> Result<Response, FetchError> {
    Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

    let response = client.get(url).send().await.map_err(|source| {
        if source.is_timeout() {
            FetchError::timeout(url)
        } else {
            FetchError::network(url, source)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::status(url, status.as_u16()));
    }
    Ok(response)
}

fn build_client(total_timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(total_timeout_secs))
        .gzip(true)
        .build()
}
