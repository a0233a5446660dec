//! boxtrack - scan a folder of save dumps and reconcile entity metadata.
//!
//! This binary drives the `boxtrack-core` pipeline from the command line:
//! it discovers containers, prints the grouped review, applies the decisions
//! given on the command line or in a decisions file, and writes the metadata
//! back next to the saves.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "boxtrack")]
#[command(about = "Track entities across save file scans")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a folder and reconcile its metadata
    Scan {
        /// Root folder holding the record dumps
        folder: PathBuf,

        /// JSON file with confirmed evolutions and kept clone members
        #[arg(long, conflicts_with = "accept_all")]
        decisions: Option<PathBuf>,

        /// Confirm every evolution and keep every clone
        #[arg(long)]
        accept_all: bool,

        /// Print the review without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Per-entity storage directory (defaults to `entities/` next to the executable)
        #[arg(long)]
        storage_root: Option<PathBuf>,

        /// Do not touch per-entity storage directories
        #[arg(long, conflicts_with = "storage_root")]
        no_storage: bool,
    },

    /// Show the tags and comment of an identity
    Show { folder: PathBuf, identity: String },

    /// Edit the tags and comment of an identity
    Annotate {
        folder: PathBuf,
        identity: String,

        /// Comma-separated tags, replacing the current ones
        #[arg(long)]
        tags: Option<String>,

        /// Free-text comment, replacing the current one
        #[arg(long)]
        comment: Option<String>,
    },

    /// List identities whose tags or comment contain the query
    Search { folder: PathBuf, query: String },
}

/// Log directive used when `RUST_LOG` is not set.
fn default_log_directive(debug: bool) -> &'static str {
    if debug {
        "boxtrack=debug,boxtrack_core=debug,info"
    } else {
        "info"
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides --debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(args.debug)));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!("Arguments: {:?}", args);

    match args.command {
        Command::Scan {
            folder,
            decisions,
            accept_all,
            dry_run,
            storage_root,
            no_storage,
        } => commands::scan(commands::ScanOptions {
            folder,
            decisions,
            accept_all,
            dry_run,
            storage_root,
            no_storage,
        }),
        Command::Show { folder, identity } => commands::show(&folder, &identity),
        Command::Annotate {
            folder,
            identity,
            tags,
            comment,
        } => commands::annotate(&folder, &identity, tags.as_deref(), comment.as_deref()),
        Command::Search { folder, query } => commands::search(&folder, &query),
    }
}
