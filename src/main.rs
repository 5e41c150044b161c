//! CLI entry point for the bookdl tool.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use bookdl_core::{CancelFlag, Config, Entry, Pipeline, SourceKind, TaskStatus};

#[derive(Debug, Parser)]
#[command(name = "bookdl", about = "Search a book catalog and download entries")]
struct Cli {
    /// Path to a JSON config file (mirror and search templates).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the catalog and list matching entries.
    Search {
        /// The search query.
        query: String,
        /// Search the fiction catalog instead of the primary one.
        #[arg(long)]
        fiction: bool,
        /// Result page to fetch (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search, resolve, and download one entry.
    Get {
        /// The search query.
        query: String,
        /// Search the fiction catalog instead of the primary one.
        #[arg(long)]
        fiction: bool,
        /// Zero-based index into the search results.
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Directory to save the file into.
        #[arg(long, default_value = ".")]
        output: PathBuf,
        /// Result page to fetch (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    debug!(mirror = config.mirror(), "configuration resolved");

    let pipeline = Pipeline::new(config);

    match cli.command {
        Command::Search {
            query,
            fiction,
            page,
        } => {
            let entries = pipeline.search(kind_for(fiction), &query, page).await?;
            if entries.is_empty() {
                info!("no results");
                return Ok(());
            }
            for (index, entry) in entries.iter().enumerate() {
                print_entry(index, entry);
            }
        }
        Command::Get {
            query,
            fiction,
            index,
            output,
            page,
        } => {
            let entries = pipeline.search(kind_for(fiction), &query, page).await?;
            if entries.is_empty() {
                info!("no results");
                return Ok(());
            }
            let Some(entry) = entries.get(index) else {
                bail!("index {index} out of range: {} results", entries.len());
            };
            info!(title = %entry.title, id = %entry.id, "selected entry");

            let cancel = CancelFlag::new();
            let ctrlc_flag = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("cancellation requested");
                    ctrlc_flag.cancel();
                }
            });

            let bar = progress_bar();
            let task = pipeline
                .fetch_entry(
                    entry,
                    &output,
                    |current, total| {
                        if total > 0 {
                            bar.set_length(total);
                        }
                        bar.set_position(current);
                    },
                    &cancel,
                )
                .await?;
            bar.finish();

            debug_assert_eq!(task.status(), TaskStatus::Done);
            info!(
                path = %task.target_path().display(),
                bytes = task.current_bytes(),
                "download complete"
            );
        }
    }

    Ok(())
}

fn kind_for(fiction: bool) -> SourceKind {
    if fiction {
        SourceKind::FictionCatalog
    } else {
        SourceKind::PrimaryCatalog
    }
}

fn print_entry(index: usize, entry: &Entry) {
    println!(
        "[{index}] {} - {} ({}) [{} {}]",
        entry.authors, entry.title, entry.year, entry.extension, entry.size
    );
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
