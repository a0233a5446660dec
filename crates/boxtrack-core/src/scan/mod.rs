//! Scan classification.
//!
//! # Pipeline
//!
//! 1. **Diff**: derive an identity for every scanned record and partition
//!    known/scanned identities into added, removed and unchanged, with clone
//!    groups as an overlay
//! 2. **Correlate**: pair removed and added identities sharing a lineage key
//!    into evolution candidates
//!
//! Neither step touches the metadata store; both are pure functions of their
//! inputs.

mod correlate;
mod diff;
mod types;

pub use correlate::correlate;
pub use diff::diff;
pub use types::{CloneGroup, Correlation, EvolutionCandidate, ScanClassification, ScanDiff};

use crate::entity::EntityRecord;
use crate::identity::Identity;
use std::collections::BTreeSet;
use tracing::info;

/// Diff `scanned` against `known` and correlate evolutions.
pub fn classify(known: &BTreeSet<Identity>, scanned: &[EntityRecord]) -> ScanClassification {
    let ScanDiff {
        added,
        removed,
        unchanged,
        retained_clones,
        clone_groups,
        observed,
    } = diff(known, scanned);

    let correlation = correlate(&added, &removed);

    info!(
        "Scan classified: {} added, {} removed, {} unchanged, {} evolutions, {} clone groups",
        correlation.added.len(),
        correlation.removed.len(),
        unchanged.len(),
        correlation.evolutions.len(),
        clone_groups.len()
    );

    ScanClassification {
        unchanged,
        added: correlation.added,
        removed: correlation.removed,
        retained_clones,
        clone_groups,
        evolutions: correlation.evolutions,
        observed,
    }
}
