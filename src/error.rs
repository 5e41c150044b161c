//! Crate-level error types shared across pipeline stages.
//!
//! Each stage reports its own structured error; [`PipelineError`] is the
//! umbrella the orchestrator hands back to callers. Nothing here is retried
//! automatically - retry policy across mirrors belongs to the caller.

use thiserror::Error;

/// Errors raised by the HTTP transport when fetching a page or starting
/// a download.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion. Timeouts are transport-level and
    /// surface as ordinary fetch failures, not a distinct taxonomy branch.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response status.
    #[error("HTTP Error {status} fetching {url}")]
    Status {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a non-2xx status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// Umbrella error for pipeline entry points.
///
/// A parse failure is distinct from a legitimately empty result set: empty
/// results are a success with zero entries, and only an unrecognized page
/// shape surfaces as [`ScrapeError`](crate::scrape::ScrapeError).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A page fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A result page had an unrecognized shape.
    #[error(transparent)]
    Scrape(#[from] crate::scrape::ScrapeError),

    /// Link resolution failed at a named stage.
    #[error(transparent)]
    Resolve(#[from] crate::resolver::ResolveError),

    /// The download failed or was cancelled.
    #[error(transparent)]
    Download(#[from] crate::download::DownloadError),
}

// No blanket `From<reqwest::Error>`: FetchError variants carry the request
// URL, which `reqwest::Error` alone does not provide. Callers go through the
// constructors.
