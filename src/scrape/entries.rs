//! Entry extraction from catalog result pages.
//!
//! Two structurally different layouts are supported, selected by
//! [`SourceKind`]. Extraction is lossy by design: rows that fall short of
//! the layout's minimum cell count or fail the admission rule (non-empty
//! id, title, and HTTP(S) mirror) are silently skipped.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use url::Url;

use super::dom;
use super::error::ScrapeError;

/// Which catalog layout a page (and the entries extracted from it) follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The main catalog: wide positional rows, numeric row ids.
    PrimaryCatalog,
    /// The fiction catalog: narrower rows, content-hash ids.
    FictionCatalog,
}

impl SourceKind {
    /// Short lowercase name used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryCatalog => "primary",
            Self::FictionCatalog => "fiction",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog search-result record.
///
/// Immutable value object created only by extraction; display fields may be
/// empty, but `id`, `title`, and `mirror` are guaranteed non-empty and
/// `mirror` starts with an HTTP(S) scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unique id within a result set: the row's catalog id for the primary
    /// layout, a lowercase 32-hex content hash for the fiction layout.
    pub id: String,
    /// Display author names.
    pub authors: String,
    /// Display title, with fiction series appended as `"Title (Series)"`.
    pub title: String,
    /// Publisher display text (primary layout only).
    pub publisher: String,
    /// Year display text.
    pub year: String,
    /// Page count display text.
    pub pages: String,
    /// Language display text.
    pub language: String,
    /// File size display text.
    pub size: String,
    /// Lowercase file extension.
    pub extension: String,
    /// Absolute URL of the entry's detail/download entry point.
    pub mirror: String,
    /// The layout this entry was extracted from; selects the resolution path.
    pub source_kind: SourceKind,
}

/// Results-container class marker for the primary layout.
const PRIMARY_TABLE_CLASS: &str = "c";
/// Results-container class marker for the fiction layout.
const FICTION_TABLE_CLASS: &str = "catalog";
/// Phrase the primary catalog renders for an empty result set.
const PRIMARY_EMPTY_MARKER: &str = "No files were found";
/// Phrase the fiction catalog renders for an empty result set.
const FICTION_EMPTY_MARKER: &str = "Nothing found";

/// Positional columns expected by the primary layout.
const PRIMARY_MIN_CELLS: usize = 10;
/// Columns expected by the fiction layout (authors, series, title, language,
/// file info).
const FICTION_MIN_CELLS: usize = 5;

static CONTENT_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"[0-9a-fA-F]{32}$"));

#[allow(clippy::expect_used)]
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex pattern must compile")
}

/// Extracts all admissible entries from one result page.
///
/// `base_mirror` supplies the scheme and host used to absolutize the fiction
/// layout's relative detail links; the primary layout ignores it.
///
/// # Errors
///
/// Returns [`ScrapeError`] when the page carries neither the layout's
/// results container nor its "no results" phrase. A page that explicitly
/// says it has no results yields `Ok` with an empty sequence.
pub fn extract_entries(
    html: &str,
    kind: SourceKind,
    base_mirror: &str,
) -> Result<Vec<Entry>, ScrapeError> {
    let class = match kind {
        SourceKind::PrimaryCatalog => PRIMARY_TABLE_CLASS,
        SourceKind::FictionCatalog => FICTION_TABLE_CLASS,
    };
    let Some(container) = dom::find_block_by_class(html, "table", class) else {
        if html.contains(empty_marker(kind)) {
            debug!(%kind, "page explicitly reports an empty result set");
            return Ok(Vec::new());
        }
        return Err(ScrapeError::unrecognized(kind));
    };

    let mut entries = Vec::new();
    for row in dom::child_blocks(container, "tr") {
        let cells = dom::child_blocks(row, "td");
        let min_cells = match kind {
            SourceKind::PrimaryCatalog => PRIMARY_MIN_CELLS,
            SourceKind::FictionCatalog => FICTION_MIN_CELLS,
        };
        if cells.len() < min_cells {
            trace!(cells = cells.len(), min_cells, "skipping short row");
            continue;
        }
        let entry = match kind {
            SourceKind::PrimaryCatalog => primary_entry(&cells),
            SourceKind::FictionCatalog => fiction_entry(&cells, base_mirror),
        };
        match entry {
            Some(entry) => entries.push(entry),
            None => trace!("skipping inadmissible row"),
        }
    }
    debug!(%kind, count = entries.len(), "extracted entries");
    Ok(entries)
}

fn empty_marker(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::PrimaryCatalog => PRIMARY_EMPTY_MARKER,
        SourceKind::FictionCatalog => FICTION_EMPTY_MARKER,
    }
}

/// Maps a primary-layout row onto an [`Entry`]. The 10 leading cells are
/// positional; the mirror is the first hyperlink of the mirror cell, taken
/// verbatim.
fn primary_entry(cells: &[&str]) -> Option<Entry> {
    let id = dom::strip_tags(cells[0]);
    let title = dom::first_link(cells[2])
        .map(|link| link.text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| dom::strip_tags(cells[2]));
    let mirror = dom::links(cells[9])
        .into_iter()
        .map(|link| link.href)
        .find(|href| !href.is_empty())
        .unwrap_or_default();

    admit(Entry {
        id,
        authors: dom::strip_tags(cells[1]),
        title,
        publisher: dom::strip_tags(cells[3]),
        year: dom::strip_tags(cells[4]),
        pages: dom::strip_tags(cells[5]),
        language: dom::strip_tags(cells[6]),
        size: dom::strip_tags(cells[7]),
        extension: dom::strip_tags(cells[8]),
        mirror,
        source_kind: SourceKind::PrimaryCatalog,
    })
}

/// Maps a fiction-layout row onto an [`Entry`]. The title cell's hyperlink
/// doubles as the detail link: its href is absolutized against the base
/// mirror, and its trailing 32-hex substring becomes the id.
fn fiction_entry(cells: &[&str], base_mirror: &str) -> Option<Entry> {
    let author_names: Vec<String> = dom::links(cells[0])
        .into_iter()
        .map(|link| link.text)
        .filter(|name| !name.is_empty())
        .collect();
    let authors = if author_names.is_empty() {
        dom::strip_tags(cells[0])
    } else {
        author_names.join(", ")
    };

    let series = dom::strip_tags(cells[1]);
    let title_link = dom::first_link(cells[2]);
    let mut title = title_link
        .as_ref()
        .map(|link| link.text.clone())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| dom::strip_tags(cells[2]));
    title = strip_edition_note(&title);
    if !series.is_empty() {
        title = format!("{title} ({series})");
    }

    let (extension, size) = split_file_info(&dom::strip_tags(cells[4]));

    let href = title_link.map(|link| link.href)?;
    let id = CONTENT_HASH_RE
        .find(trim_href_tail(&href))
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let mirror = join_mirror_path(base_mirror, &href).unwrap_or_default();

    admit(Entry {
        id,
        authors,
        title,
        publisher: String::new(),
        year: String::new(),
        pages: String::new(),
        language: dom::strip_tags(cells[3]),
        size,
        extension,
        mirror,
        source_kind: SourceKind::FictionCatalog,
    })
}

/// Admission rule: id, title, and an HTTP(S) mirror must all be present.
fn admit(entry: Entry) -> Option<Entry> {
    let ok = !entry.id.is_empty() && !entry.title.is_empty() && is_http_url(&entry.mirror);
    ok.then_some(entry)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Drops a trailing bracketed edition annotation: `"Title [ed. 2]"` -> `"Title"`.
fn strip_edition_note(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.ends_with(']') {
        if let Some(idx) = trimmed.rfind("[ed.") {
            return trimmed[..idx].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Splits a file-info cell like `"EPUB / 2 Mb"` into a lowercase extension
/// and a size, defaulting the size to `"0 Mb"` when no separator is present.
fn split_file_info(info: &str) -> (String, String) {
    let leading_token = |text: &str| {
        text.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    match info.split_once('/') {
        Some((extension, size)) => (leading_token(extension), size.trim().to_string()),
        None => (leading_token(info), "0 Mb".to_string()),
    }
}

/// Href with any query, fragment, and trailing slash removed, so the
/// content-hash match anchors at the real end of the path.
fn trim_href_tail(href: &str) -> &str {
    let path = href
        .split(['?', '#'])
        .next()
        .unwrap_or(href);
    path.trim_end_matches('/')
}

/// Absolutizes a detail href against the base mirror's scheme and host.
///
/// Hrefs without a leading slash are joined as `scheme://host/<href>`; that
/// shape has not been observed on live pages, so the join is a guess kept
/// isolated here.
fn join_mirror_path(base_mirror: &str, href: &str) -> Option<String> {
    if is_http_url(href) {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    let base = Url::parse(base_mirror).ok()?;
    let host = base.host_str()?;
    let authority = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let scheme = base.scheme();
    if let Some(rest) = href.strip_prefix('/') {
        Some(format!("{scheme}://{authority}/{rest}"))
    } else {
        Some(format!("{scheme}://{authority}/{href}"))
    }
}
