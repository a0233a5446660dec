//! One scan-and-reconcile session over a root folder.

use crate::entity::{discover_containers, extract_all, ContainerFailure, EntityExtractor};
use crate::error::{BoxtrackError, Result};
use crate::identity::Identity;
use crate::metadata::MetadataStore;
use crate::reconcile::{apply, ReconcileDecisions, ReconcileOutcome, ReviewSummary};
use crate::scan::{classify, ScanClassification};
use crate::storage::EntityStorage;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of scanning a set of containers.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub classification: ScanClassification,
    /// Containers skipped because extraction failed.
    pub failures: Vec<ContainerFailure>,
    /// Number of entity records extracted.
    pub record_count: usize,
}

/// Owns the metadata store of one root folder for the length of a session.
///
/// The store is loaded once in [`open`](Self::open) and every pipeline stage
/// works against it; [`reconcile`](Self::reconcile) and [`save`](Self::save)
/// write it back.
#[derive(Debug)]
pub struct ScanSession {
    folder: PathBuf,
    store: MetadataStore,
}

impl ScanSession {
    /// Open `folder` and load its metadata (an unreadable file yields an
    /// empty store).
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(BoxtrackError::NotADirectory(folder));
        }
        let store = MetadataStore::load(&folder);
        info!(
            "Opened {} with {} known identities",
            folder.display(),
            store.len()
        );
        Ok(Self { folder, store })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MetadataStore {
        &mut self.store
    }

    /// Identities currently held by the store.
    pub fn known_identities(&self) -> BTreeSet<Identity> {
        self.store.identities().cloned().collect()
    }

    /// List the containers under the session folder accepted by `accept`.
    pub fn discover<F>(&self, accept: F) -> Result<Vec<PathBuf>>
    where
        F: Fn(&Path) -> bool,
    {
        discover_containers(&self.folder, accept)
    }

    /// Extract every container and classify the result against the store.
    pub fn scan<E, P>(&self, extractor: &E, containers: &[P]) -> ScanReport
    where
        E: EntityExtractor + ?Sized,
        P: AsRef<Path>,
    {
        let extraction = extract_all(extractor, containers);
        let classification = classify(&self.known_identities(), &extraction.records);
        ScanReport {
            classification,
            failures: extraction.failures,
            record_count: extraction.records.len(),
        }
    }

    /// Grouped lists for the decision step.
    pub fn review(&self, classification: &ScanClassification) -> ReviewSummary {
        ReviewSummary::build(classification, &self.store)
    }

    /// Apply `decisions` and persist the store.
    ///
    /// Storage problems end up in [`ReconcileOutcome::warnings`]; only a
    /// failure to write the metadata file is returned as an error.
    pub fn reconcile(
        &mut self,
        classification: &ScanClassification,
        decisions: &ReconcileDecisions,
        storage: Option<&EntityStorage>,
    ) -> Result<ReconcileOutcome> {
        let outcome = apply(&mut self.store, classification, decisions, storage);
        self.save()?;
        Ok(outcome)
    }

    /// Write the store back to the session folder.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.folder)
    }
}
