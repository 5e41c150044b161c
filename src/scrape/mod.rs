//! Structural extraction of records and links from catalog HTML pages.
//!
//! Pure functions, no network, no state. The parsing layer is explicitly a
//! best-effort structural scraper tolerant of a known, narrow set of page
//! shapes - not a general HTML engine. Unrecognized page shapes fail
//! explicitly; a page that says "no results" succeeds with zero entries.

pub mod dom;
mod entries;
mod error;
mod links;

pub use entries::{Entry, SourceKind, extract_entries};
pub use error::ScrapeError;
pub use links::{find_fiction_detail_link, find_final_download_links};
