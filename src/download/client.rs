//! Streaming downloader: one chunked GET to a complete file on disk, or no
//! file at all.
//!
//! Order of operations is fixed: parent directory, exclusive file open,
//! then the network request. Progress callbacks are throttled, with one
//! unconditional initial call upon headers and one unconditional final call
//! upon completion. Every failure path funnels through a single idempotent
//! abort that removes the partial file.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Response;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::error::DownloadError;
use super::task::DownloadTask;
use crate::error::FetchError;
use crate::transport::Transport;

/// Minimum interval between throttled progress callbacks.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Cooperative cancellation flag, checked before each chunk write and before
/// each progress dispatch. Raising it never tears down the socket
/// preemptively; the in-flight body is simply abandoned at the next chunk
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unraised flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Streaming downloader over a shared transport.
#[derive(Debug, Clone)]
pub struct Downloader {
    transport: Transport,
}

impl Downloader {
    /// Creates a downloader over the given transport.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Downloads `url` to `target_path`.
    ///
    /// On success the returned task is `Done`, the file exists and is
    /// closed, and `on_progress` has been called one final time with the
    /// true byte count. On failure the partial file has been removed and
    /// exactly one error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for directory/file creation failures (no
    /// network request is issued in that case), non-2xx statuses, transport
    /// failures mid-body, write failures, and cancellation.
    #[instrument(skip(self, on_progress, cancel), fields(url = %url, target = %target_path.display()))]
    pub async fn download(
        &self,
        url: &str,
        target_path: &Path,
        mut on_progress: impl FnMut(u64, u64) + Send,
        cancel: &CancelFlag,
    ) -> Result<DownloadTask, DownloadError> {
        let mut task = DownloadTask::new(url, target_path);
        match self.run(&mut task, &mut on_progress, cancel).await {
            Ok(()) => {
                info!(bytes = task.current_bytes(), "download complete");
                Ok(task)
            }
            Err(error) => {
                abort(&mut task, &error).await;
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        task: &mut DownloadTask,
        on_progress: &mut (impl FnMut(u64, u64) + Send),
        cancel: &CancelFlag,
    ) -> Result<(), DownloadError> {
        // Parent directory first; a failure here is terminal and no network
        // request is issued.
        if let Some(parent) = task.target_path().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| DownloadError::filesystem(parent, source))?;
            }
        }

        // Exclusive create before the request goes out. An existing file is
        // a failure, and one this invocation must not delete.
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(task.target_path())
            .await
            .map_err(|source| DownloadError::filesystem(task.target_path(), source))?;
        task.note_file_created();
        let mut writer = BufWriter::new(file);

        let response = self.transport.start_download(task.url()).await?;
        let total = content_length(&response);
        task.begin(total);
        debug!(total_bytes = total, "response headers received");

        // Unconditional initial progress call upon headers.
        on_progress(task.current_bytes(), task.total_bytes());
        let mut last_emit = Instant::now();

        let url = task.url().to_string();
        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|source| FetchError::network(&url, source))?;
            if cancel.is_cancelled() {
                return Err(DownloadError::cancelled(&url));
            }
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| DownloadError::filesystem(task.target_path(), source))?;
            task.add_chunk(chunk.len() as u64);

            if !cancel.is_cancelled() && last_emit.elapsed() >= PROGRESS_INTERVAL {
                on_progress(task.current_bytes(), task.total_bytes());
                last_emit = Instant::now();
            }
        }

        writer
            .flush()
            .await
            .map_err(|source| DownloadError::filesystem(task.target_path(), source))?;

        if task.total_bytes() > 0 && task.current_bytes() != task.total_bytes() {
            warn!(
                expected = task.total_bytes(),
                actual = task.current_bytes(),
                "body length differs from content-length header"
            );
        }

        task.finish();
        // Unconditional final progress call with the true final count.
        on_progress(task.current_bytes(), task.total_bytes());
        Ok(())
    }
}

/// Single cleanup routine for every failure path. The one-shot guard on the
/// task makes repeated signals harmless; the partial file is only removed
/// when this invocation created it.
async fn abort(task: &mut DownloadTask, error: &DownloadError) {
    if !task.mark_aborted(&error.to_string()) {
        return;
    }
    debug!(reason = %error, "aborting download");
    if task.file_created() {
        // Best-effort removal; the file handle was dropped by the failed run.
        let _ = tokio::fs::remove_file(task.target_path()).await;
    }
}

fn content_length(response: &Response) -> u64 {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_sticky_and_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_download_invalid_url_fails_and_leaves_no_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("never-kept.bin");
        let downloader = Downloader::new(Transport::new());
        let result = tokio_test::block_on(downloader.download(
            "not-a-valid-url",
            &target,
            |_, _| {},
            &CancelFlag::new(),
        ));
        assert!(matches!(
            result,
            Err(DownloadError::Fetch(FetchError::InvalidUrl { .. }))
        ));
        assert!(!target.exists(), "failed download must leave no file");
    }

    #[tokio::test]
    async fn test_abort_skips_removal_for_files_it_did_not_create() {
        let dir = tempfile::TempDir::new().unwrap();
        let existing = dir.path().join("already-there.bin");
        std::fs::write(&existing, b"keep me").unwrap();

        let mut task = DownloadTask::new("http://dl.example/x", &existing);
        let error = DownloadError::filesystem(
            &existing,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists"),
        );
        abort(&mut task, &error).await;

        assert!(existing.exists(), "pre-existing file must survive abort");
        assert!(task.last_error().is_some());
    }

    #[tokio::test]
    async fn test_abort_twice_cleans_up_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("partial.bin");
        std::fs::write(&target, b"partial").unwrap();

        let mut task = DownloadTask::new("http://dl.example/x", &target);
        task.note_file_created();
        let first = DownloadError::filesystem(
            &target,
            std::io::Error::new(std::io::ErrorKind::WriteZero, "write"),
        );
        let second = DownloadError::cancelled("http://dl.example/x");
        abort(&mut task, &first).await;
        abort(&mut task, &second).await;

        assert!(!target.exists(), "partial file must be removed");
        // the first reason wins and stays
        assert!(task.last_error().unwrap().contains("filesystem error"));
    }
}
