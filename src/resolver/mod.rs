//! Link resolution: from one [`Entry`] to concrete binary download URLs.
//!
//! A strictly sequential chain per entry, one network fetch per stage, no
//! retries. Two paths selected by the entry's source kind:
//!
//! - fiction: `FetchDetail -> ParseDetailLink -> FetchFinal -> ParseFinalLinks`
//! - primary: `FetchFinal -> ParseFinalLinks` (the mirror already points at
//!   the final download page)
//!
//! Any fetch or parse failure terminates the chain and reports the stage
//! that failed via [`ResolveError`].

mod error;

pub use error::ResolveError;

use tracing::{debug, instrument};
use url::Url;

use crate::scrape::{Entry, SourceKind, find_fiction_detail_link, find_final_download_links};
use crate::transport::Transport;

/// Ordered, deduplicated candidate binary URLs, primary GET link first.
/// Guaranteed non-empty when produced by [`LinkResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLinks {
    urls: Vec<String>,
}

impl ResolvedLinks {
    /// The primary download URL, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    /// All candidate URLs in priority order.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// Resolves entries into download URLs over a shared transport.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    transport: Transport,
}

impl LinkResolver {
    /// Creates a resolver over the given transport.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Walks the entry's resolution chain to the final download page and
    /// extracts its candidate URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] naming the first stage that failed; nothing
    /// is retried.
    #[instrument(skip(self, entry), fields(entry_id = %entry.id, kind = %entry.source_kind))]
    pub async fn resolve(&self, entry: &Entry) -> Result<ResolvedLinks, ResolveError> {
        let final_page_url = match resolution_path(entry) {
            SourceKind::FictionCatalog => self.fiction_final_page_url(entry).await?,
            SourceKind::PrimaryCatalog => entry.mirror.clone(),
        };

        let html = self
            .transport
            .fetch_page(&final_page_url)
            .await
            .map_err(|source| ResolveError::fetch_final(&final_page_url, source))?;

        let urls = find_final_download_links(&html)
            .ok_or_else(|| ResolveError::parse_final(&final_page_url))?;
        debug!(candidates = urls.len(), "resolution complete");
        Ok(ResolvedLinks { urls })
    }

    /// Fiction pre-chain: fetch the detail page and pull the first link of
    /// its mirrors list.
    async fn fiction_final_page_url(&self, entry: &Entry) -> Result<String, ResolveError> {
        let html = self
            .transport
            .fetch_page(&entry.mirror)
            .await
            .map_err(|source| ResolveError::fetch_detail(&entry.mirror, source))?;

        let href = find_fiction_detail_link(&html)
            .ok_or_else(|| ResolveError::link_not_found(&entry.mirror))?;
        Ok(absolutize(&href, &entry.mirror))
    }
}

/// Selects the resolution path. The extracted source kind decides; a mirror
/// that points into the fiction section overrides a primary tag.
fn resolution_path(entry: &Entry) -> SourceKind {
    if entry.source_kind == SourceKind::FictionCatalog || entry.mirror.contains("/fiction/") {
        SourceKind::FictionCatalog
    } else {
        SourceKind::PrimaryCatalog
    }
}

/// Absolutizes a detail-page href against the page it was found on.
fn absolutize(href: &str, base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }
    Url::parse(base)
        .ok()
        .and_then(|parsed| parsed.join(href).ok())
        .map_or_else(|| href.to_string(), |joined| joined.to_string())
}
