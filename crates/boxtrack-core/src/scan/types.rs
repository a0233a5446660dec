//! Result types of a scan.

use crate::entity::EntityRecord;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Two or more records of one scan deriving the same identity.
///
/// Either a real in-game duplicate or the same container scanned twice
/// through different file entries; the caller decides which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneGroup {
    pub identity: Identity,
    /// Records in scan order. Decisions refer to them by zero-based index.
    pub members: Vec<EntityRecord>,
}

impl CloneGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A removed identity and an added identity sharing a lineage key.
///
/// Candidates are never applied without confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvolutionCandidate {
    pub from: Identity,
    pub to: Identity,
}

impl EvolutionCandidate {
    pub fn new(from: impl Into<Identity>, to: impl Into<Identity>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Known identities against one scan, before evolution correlation.
#[derive(Debug, Clone, Default)]
pub struct ScanDiff {
    /// Scanned but not known, in first-seen order.
    pub added: Vec<Identity>,
    /// Known but not scanned, in identity order.
    pub removed: Vec<Identity>,
    /// Known and scanned, in first-seen order.
    pub unchanged: Vec<Identity>,
    /// Known clone-resolution identities (`X(2)`, `X(cloned-unresolved)`)
    /// still backed by enough scanned copies of their base `X`. Neither
    /// removed nor unchanged.
    pub retained_clones: Vec<Identity>,
    /// Identities seen more than once in this scan.
    pub clone_groups: Vec<CloneGroup>,
    /// First record seen for every scanned identity.
    pub observed: BTreeMap<Identity, EntityRecord>,
}

/// Added and removed lists after evolution candidates were pulled out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub evolutions: Vec<EvolutionCandidate>,
    pub added: Vec<Identity>,
    pub removed: Vec<Identity>,
}

/// Full classification of one scan, ready for the decision step.
#[derive(Debug, Clone, Default)]
pub struct ScanClassification {
    pub unchanged: Vec<Identity>,
    pub added: Vec<Identity>,
    pub removed: Vec<Identity>,
    pub retained_clones: Vec<Identity>,
    pub clone_groups: Vec<CloneGroup>,
    pub evolutions: Vec<EvolutionCandidate>,
    pub observed: BTreeMap<Identity, EntityRecord>,
}

impl ScanClassification {
    /// Whether the scan needs no decision and changes nothing.
    pub fn is_quiet(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.clone_groups.is_empty()
            && self.evolutions.is_empty()
    }

    /// Record first observed for `identity` in this scan.
    pub fn record(&self, identity: &Identity) -> Option<&EntityRecord> {
        self.observed.get(identity)
    }

    pub fn clone_group(&self, identity: &Identity) -> Option<&CloneGroup> {
        self.clone_groups.iter().find(|g| &g.identity == identity)
    }
}
