//! Bookdl Core Library
//!
//! This library resolves catalog search queries into downloaded files on
//! disk, against a library-catalog web service that exposes no formal API:
//! only server-rendered HTML pages whose structure must be scraped.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`scrape`] - Structural extraction of entries and links from result pages
//! - [`resolver`] - Multi-hop resolution of an entry into binary download URLs
//! - [`download`] - Streaming downloader with progress and cancellation
//! - [`pipeline`] - Orchestration of search, resolution, and download
//! - [`transport`] - HTTP transport with per-call-site timeout tiers
//! - [`config`] - Mirror and search-template configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod scrape;
pub mod transport;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use download::{CancelFlag, DownloadError, DownloadTask, Downloader, TaskStatus};
pub use error::{FetchError, PipelineError};
pub use pipeline::Pipeline;
pub use resolver::{LinkResolver, ResolveError, ResolvedLinks};
pub use scrape::{Entry, ScrapeError, SourceKind, extract_entries};
pub use transport::Transport;
