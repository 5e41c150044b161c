//! Pipeline orchestration: search, resolve, download.
//!
//! This is the only component with a notion of in-progress work; it owns no
//! algorithmic complexity itself. No ordering guarantee exists between
//! separate entries fetched concurrently, and no per-target deduplication is
//! performed - callers serialize per target path themselves.

use std::path::Path;

use tracing::{info, instrument};
use url::Url;

use crate::config::Config;
use crate::download::{CancelFlag, DownloadTask, Downloader};
use crate::error::PipelineError;
use crate::resolver::{LinkResolver, ResolveError, ResolvedLinks};
use crate::scrape::{Entry, SourceKind, extract_entries};
use crate::transport::Transport;

/// The retrieval pipeline: catalog search to downloaded file.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    transport: Transport,
    resolver: LinkResolver,
    downloader: Downloader,
}

impl Pipeline {
    /// Creates a pipeline with a fresh transport.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Transport::new())
    }

    /// Creates a pipeline over an explicit transport.
    #[must_use]
    pub fn with_transport(config: Config, transport: Transport) -> Self {
        Self {
            resolver: LinkResolver::new(transport.clone()),
            downloader: Downloader::new(transport.clone()),
            transport,
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Searches the catalog and extracts the result entries.
    ///
    /// An explicitly empty result set returns `Ok` with zero entries; an
    /// unrecognized page shape is an error - the two are distinguishable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for fetch failures and unrecognized pages.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        kind: SourceKind,
        query: &str,
        page: u32,
    ) -> Result<Vec<Entry>, PipelineError> {
        let url = self.config.search_url(kind, query, page);
        let html = self.transport.fetch_page(&url).await?;
        let entries = extract_entries(&html, kind, self.config.mirror())?;
        info!(count = entries.len(), "search complete");
        Ok(entries)
    }

    /// Looks up entries by content hash against the primary catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for fetch failures and unrecognized pages.
    #[instrument(skip(self))]
    pub async fn search_by_hash(&self, hash: &str) -> Result<Vec<Entry>, PipelineError> {
        let url = self.config.hash_search_url(hash);
        let html = self.transport.fetch_page(&url).await?;
        let entries = extract_entries(&html, SourceKind::PrimaryCatalog, self.config.mirror())?;
        info!(count = entries.len(), "hash lookup complete");
        Ok(entries)
    }

    /// Resolves one entry into its candidate download URLs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] naming the resolution stage that failed.
    pub async fn resolve(&self, entry: &Entry) -> Result<ResolvedLinks, PipelineError> {
        Ok(self.resolver.resolve(entry).await?)
    }

    /// Resolves one entry and downloads its primary candidate into
    /// `output_dir`. The target filename is `<id>.<extension>`, falling back
    /// to the URL's last path segment when the entry has no extension.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when resolution fails at any stage or the
    /// download fails; failed downloads leave no file behind.
    #[instrument(skip(self, entry, on_progress, cancel), fields(entry_id = %entry.id))]
    pub async fn fetch_entry(
        &self,
        entry: &Entry,
        output_dir: &Path,
        on_progress: impl FnMut(u64, u64) + Send,
        cancel: &CancelFlag,
    ) -> Result<DownloadTask, PipelineError> {
        let links = self.resolver.resolve(entry).await?;
        let url = links
            .primary()
            .ok_or_else(|| ResolveError::parse_final(&entry.mirror))?;
        let target = output_dir.join(target_filename(entry, url));
        let task = self
            .downloader
            .download(url, &target, on_progress, cancel)
            .await?;
        Ok(task)
    }
}

/// Filename for the downloaded binary: `<id>.<extension>` when the entry
/// carries an extension, the URL's last path segment otherwise.
fn target_filename(entry: &Entry, url: &str) -> String {
    if !entry.extension.is_empty() {
        return format!("{}.{}", entry.id, entry.extension);
    }
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| format!("{}.bin", entry.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(id: &str, extension: &str) -> Entry {
        Entry {
            id: id.to_string(),
            authors: String::new(),
            title: "t".to_string(),
            publisher: String::new(),
            year: String::new(),
            pages: String::new(),
            language: String::new(),
            size: String::new(),
            extension: extension.to_string(),
            mirror: "http://m/x".to_string(),
            source_kind: SourceKind::PrimaryCatalog,
        }
    }

    #[test]
    fn test_target_filename_prefers_id_and_extension() {
        let name = target_filename(&entry("abc123", "epub"), "http://dl.example/get/file");
        assert_eq!(name, "abc123.epub");
    }

    #[test]
    fn test_target_filename_falls_back_to_url_segment() {
        let name = target_filename(&entry("abc123", ""), "http://dl.example/files/book.pdf");
        assert_eq!(name, "book.pdf");
    }

    #[test]
    fn test_target_filename_last_resort_uses_id() {
        let name = target_filename(&entry("abc123", ""), "http://dl.example/");
        assert_eq!(name, "abc123.bin");
    }
}
