//! Per-transfer state record.
//!
//! One [`DownloadTask`] is owned exclusively by the download invocation that
//! created it; it is never shared across concurrent downloads. The abort
//! guard is an explicit one-shot flag so racing failure signals cannot run
//! cleanup twice.

use std::path::{Path, PathBuf};

/// Lifecycle of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Created, no network activity yet.
    Queued,
    /// Response headers received, body streaming.
    InProgress,
    /// Aborted; the target file has been removed.
    Failed,
    /// Complete; the target file exists and is closed.
    Done,
}

/// Transient state for one in-flight transfer.
#[derive(Debug)]
pub struct DownloadTask {
    url: String,
    target_path: PathBuf,
    total_bytes: u64,
    current_bytes: u64,
    status: TaskStatus,
    last_error: Option<String>,
    file_created: bool,
    aborted: bool,
}

impl DownloadTask {
    /// Creates a queued task for one URL/target pair.
    #[must_use]
    pub fn new(url: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            target_path: target_path.into(),
            total_bytes: 0,
            current_bytes: 0,
            status: TaskStatus::Queued,
            last_error: None,
            file_created: false,
            aborted: false,
        }
    }

    /// The download URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The target file path.
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Expected total bytes; 0 means the server sent no content length.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes written so far; monotonically non-decreasing.
    #[must_use]
    pub fn current_bytes(&self) -> u64 {
        self.current_bytes
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// The reason of the last abort, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether this invocation created the target file (and therefore owns
    /// its cleanup).
    #[must_use]
    pub fn file_created(&self) -> bool {
        self.file_created
    }

    /// Records that the target file was created by this invocation.
    pub(crate) fn note_file_created(&mut self) {
        self.file_created = true;
    }

    /// Marks the transfer in progress with the total from the response
    /// headers (0 when absent).
    pub(crate) fn begin(&mut self, total_bytes: u64) {
        self.status = TaskStatus::InProgress;
        self.total_bytes = total_bytes;
    }

    /// Accumulates one written chunk.
    pub(crate) fn add_chunk(&mut self, len: u64) {
        self.current_bytes += len;
    }

    /// Marks the transfer complete.
    pub(crate) fn finish(&mut self) {
        self.status = TaskStatus::Done;
    }

    /// One-shot abort guard: returns `true` the first time only, so cleanup
    /// runs at most once even when multiple failure signals race.
    pub(crate) fn mark_aborted(&mut self, reason: &str) -> bool {
        if self.aborted {
            return false;
        }
        self.aborted = true;
        self.status = TaskStatus::Failed;
        self.last_error = Some(reason.to_string());
        true
    }
}
