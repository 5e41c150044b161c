//! Error type for link resolution, carrying the stage that failed.

use thiserror::Error;

use crate::error::FetchError;

/// A resolution chain terminated early. Each variant names the stage so the
/// caller can distinguish fetch failures from structural parse failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The detail page fetch failed (fiction path only).
    #[error("fetch-detail failed for {url}: {source}")]
    FetchDetail {
        /// The detail page URL.
        url: String,
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// The detail page had no mirrors-list link.
    #[error("link-not-found: detail page {url} has no mirror list link")]
    LinkNotFound {
        /// The detail page URL.
        url: String,
    },

    /// The final download page fetch failed.
    #[error("fetch-final failed for {url}: {source}")]
    FetchFinal {
        /// The final page URL.
        url: String,
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// The final page yielded no download links. An empty candidate list is
    /// a failure here, never a success.
    #[error("parse-final: no download links found on {url}")]
    ParseFinal {
        /// The final page URL.
        url: String,
    },
}

impl ResolveError {
    /// Creates a fetch-detail stage error.
    pub fn fetch_detail(url: impl Into<String>, source: FetchError) -> Self {
        Self::FetchDetail {
            url: url.into(),
            source,
        }
    }

    /// Creates a link-not-found stage error.
    pub fn link_not_found(url: impl Into<String>) -> Self {
        Self::LinkNotFound { url: url.into() }
    }

    /// Creates a fetch-final stage error.
    pub fn fetch_final(url: impl Into<String>, source: FetchError) -> Self {
        Self::FetchFinal {
            url: url.into(),
            source,
        }
    }

    /// Creates a parse-final stage error.
    pub fn parse_final(url: impl Into<String>) -> Self {
        Self::ParseFinal { url: url.into() }
    }

    /// The name of the stage that failed.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FetchDetail { .. } => "fetch-detail",
            Self::LinkNotFound { .. } => "link-not-found",
            Self::FetchFinal { .. } => "fetch-final",
            Self::ParseFinal { .. } => "parse-final",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let fetch = FetchError::status("http://m/d", 500);
        assert_eq!(ResolveError::fetch_detail("http://m/d", fetch).stage(), "fetch-detail");
        assert_eq!(ResolveError::link_not_found("http://m/d").stage(), "link-not-found");
        let fetch = FetchError::status("http://m/f", 500);
        assert_eq!(ResolveError::fetch_final("http://m/f", fetch).stage(), "fetch-final");
        assert_eq!(ResolveError::parse_final("http://m/f").stage(), "parse-final");
    }

    #[test]
    fn test_display_includes_stage_and_url() {
        let msg = ResolveError::parse_final("http://final.example/x").to_string();
        assert!(msg.contains("parse-final"), "Expected stage in: {msg}");
        assert!(msg.contains("http://final.example/x"), "Expected URL in: {msg}");
    }
}
