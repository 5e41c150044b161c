//! Streaming download of one binary URL to disk.
//!
//! Guarantees either a complete file or no file: every failure path removes
//! the partial file before the error is reported, exactly once, guarded
//! against racing failure signals.

mod client;
mod error;
mod task;

pub use client::{CancelFlag, Downloader, PROGRESS_INTERVAL};
pub use error::DownloadError;
pub use task::{DownloadTask, TaskStatus};
