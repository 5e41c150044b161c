//! Error type for structural extraction.

use thiserror::Error;

use super::SourceKind;

/// A result page whose shape is unrecognized.
///
/// This is distinct from a legitimately empty result set: a page carrying
/// the catalog's own "no results" phrase extracts successfully as zero
/// entries and never reaches this error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    /// Neither the results container nor the empty-result marker was found.
    #[error("unrecognized {kind} results page: no results container and no empty-result marker")]
    UnrecognizedPage {
        /// The layout the page was expected to follow.
        kind: SourceKind,
    },
}

impl ScrapeError {
    /// Creates an unrecognized-page error for the given layout.
    #[must_use]
    pub fn unrecognized(kind: SourceKind) -> Self {
        Self::UnrecognizedPage { kind }
    }
}
