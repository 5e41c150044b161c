//! Configuration: base mirror URL and search URL templates.
//!
//! Templates are opaque strings with `{mirror}`, `{query}`, and
//! `{pageNumber}` placeholder tokens; the pipeline only performs placeholder
//! substitution plus URL-escaping of the query term. Mirror selection and
//! staleness handling live outside this crate - callers thread the chosen
//! base mirror in explicitly.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::scrape::SourceKind;

/// Default base mirror.
pub const DEFAULT_MIRROR: &str = "https://libgen.is";

const DEFAULT_SEARCH_BY_QUERY: &str = "{mirror}/search.php?req={query}&res=25&page={pageNumber}";
const DEFAULT_SEARCH_BY_HASH: &str = "{mirror}/search.php?req={query}&column=md5";
const DEFAULT_FICTION_SEARCH: &str = "{mirror}/fiction/?q={query}&page={pageNumber}";

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {path}: {source}")]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema.
    #[error("could not parse config file {path}: {source}")]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Search configuration with template substitution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base mirror URL, substituted for `{mirror}`.
    mirror: String,
    /// Template for primary-catalog search by query.
    search_by_query: String,
    /// Template for primary-catalog search by content hash.
    search_by_hash: String,
    /// Template for fiction-catalog search by query.
    fiction_search: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror: DEFAULT_MIRROR.to_string(),
            search_by_query: DEFAULT_SEARCH_BY_QUERY.to_string(),
            search_by_hash: DEFAULT_SEARCH_BY_HASH.to_string(),
            fiction_search: DEFAULT_FICTION_SEARCH.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file. Missing fields fall back to
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults with an explicit base mirror.
    #[must_use]
    pub fn with_mirror(mirror: impl Into<String>) -> Self {
        Self {
            mirror: mirror.into(),
            ..Self::default()
        }
    }

    /// The configured base mirror URL.
    #[must_use]
    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    /// Builds the search URL for a query against the given catalog layout.
    /// `page` is 1-based.
    #[must_use]
    pub fn search_url(&self, kind: SourceKind, query: &str, page: u32) -> String {
        let template = match kind {
            SourceKind::PrimaryCatalog => &self.search_by_query,
            SourceKind::FictionCatalog => &self.fiction_search,
        };
        fill_template(template, &self.mirror, query, page)
    }

    /// Builds the search URL for a content-hash lookup (primary layout).
    #[must_use]
    pub fn hash_search_url(&self, hash: &str) -> String {
        fill_template(&self.search_by_hash, &self.mirror, hash, 1)
    }
}

/// Placeholder substitution. The query term is percent-escaped; the mirror
/// and page number are inserted as-is.
fn fill_template(template: &str, mirror: &str, query: &str, page: u32) -> String {
    template
        .replace("{mirror}", mirror.trim_end_matches('/'))
        .replace("{query}", &urlencoding::encode(query))
        .replace("{pageNumber}", &page.to_string())
}
