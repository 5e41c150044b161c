//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::FetchError;

/// Errors that can occur during a streaming download. Every failure path
/// runs the same abort routine first: the partial file is removed before
/// the error is reported.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Transport failure or non-2xx status, at header time or mid-body.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Directory creation, file creation, or write failure.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Caller-initiated cancellation, observed at a chunk boundary.
    #[error("download cancelled: {url}")]
    Cancelled {
        /// The URL whose download was cancelled.
        url: String,
    },
}

impl DownloadError {
    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_reason_format() {
        let error = DownloadError::from(FetchError::status("http://dl.example/x", 404));
        let msg = error.to_string();
        assert!(msg.contains("HTTP Error 404"), "Expected status in: {msg}");
    }

    #[test]
    fn test_filesystem_error_display() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = DownloadError::filesystem(PathBuf::from("/tmp/x.bin"), source);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/x.bin"), "Expected path in: {msg}");
    }

    #[test]
    fn test_cancelled_display() {
        let msg = DownloadError::cancelled("http://dl.example/x").to_string();
        assert!(msg.contains("cancelled"), "Expected reason in: {msg}");
    }
}
