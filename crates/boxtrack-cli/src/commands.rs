//! Subcommand handlers.

use anyhow::{bail, Context, Result};
use boxtrack_core::{
    is_record_dump, EntityStorage, Identity, JsonDumpExtractor, ReconcileDecisions,
    ReconcileOutcome, ScanSession,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options collected from `boxtrack scan`.
#[derive(Debug)]
pub struct ScanOptions {
    pub folder: PathBuf,
    pub decisions: Option<PathBuf>,
    pub accept_all: bool,
    pub dry_run: bool,
    pub storage_root: Option<PathBuf>,
    pub no_storage: bool,
}

pub fn scan(options: ScanOptions) -> Result<()> {
    let mut session = ScanSession::open(&options.folder)
        .with_context(|| format!("Failed to open {}", options.folder.display()))?;

    let containers = session.discover(is_record_dump)?;
    info!("Found {} containers", containers.len());

    let report = session.scan(&JsonDumpExtractor, &containers);
    for failure in &report.failures {
        eprintln!("skipped {}: {}", failure.path.display(), failure.message);
    }

    print!("{}", session.review(&report.classification));

    if options.dry_run {
        info!("Dry run, metadata left untouched");
        return Ok(());
    }

    let decisions = if let Some(path) = &options.decisions {
        load_decisions(path)?
    } else if options.accept_all {
        ReconcileDecisions::accept_all(&report.classification)
    } else {
        ReconcileDecisions::none()
    };

    let storage = if options.no_storage {
        None
    } else if let Some(root) = options.storage_root {
        Some(EntityStorage::new(root))
    } else {
        match EntityStorage::beside_executable() {
            Ok(storage) => Some(storage),
            Err(e) => {
                warn!("Entity storage unavailable: {}", e);
                None
            }
        }
    };

    let outcome = session.reconcile(&report.classification, &decisions, storage.as_ref())?;
    print_outcome(&outcome);
    Ok(())
}

fn load_decisions(path: &Path) -> Result<ReconcileDecisions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read decisions file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid decisions file {}", path.display()))
}

fn print_outcome(outcome: &ReconcileOutcome) {
    for candidate in &outcome.migrated {
        println!("migrated {} -> {}", candidate.from, candidate.to);
    }
    for id in &outcome.removed {
        println!("marked removed: {}", id);
    }
    for id in &outcome.restored {
        println!("restored: {}", id);
    }
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    if !outcome.highlighted.is_empty() {
        println!("\nNeeds attention:");
        for id in &outcome.highlighted {
            println!("  {}", id);
        }
    }
}

pub fn show(folder: &Path, identity: &str) -> Result<()> {
    let session = ScanSession::open(folder)?;
    let Some(meta) = session.store().get(identity) else {
        bail!("No metadata for {}", identity);
    };
    println!("{}", identity);
    println!("  tags:    {}", meta.tags_text());
    println!("  comment: {}", meta.comment);
    Ok(())
}

pub fn annotate(
    folder: &Path,
    identity: &str,
    tags: Option<&str>,
    comment: Option<&str>,
) -> Result<()> {
    if tags.is_none() && comment.is_none() {
        bail!("Nothing to change: pass --tags and/or --comment");
    }

    let mut session = ScanSession::open(folder)?;
    let id = Identity::new(identity);
    let meta = session.store_mut().get_or_create(&id);
    if let Some(tags) = tags {
        meta.set_tags_from_text(tags);
    }
    if let Some(comment) = comment {
        meta.comment = comment.to_string();
    }
    session.save()?;
    info!("Updated {}", id);
    Ok(())
}

pub fn search(folder: &Path, query: &str) -> Result<()> {
    let session = ScanSession::open(folder)?;
    let matches = session.store().search(query);
    if matches.is_empty() {
        println!("No matches.");
    }
    for id in matches {
        println!("{}", id);
    }
    Ok(())
}
