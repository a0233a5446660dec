//! User decisions collected before reconciliation.

use crate::identity::Identity;
use crate::scan::{EvolutionCandidate, ScanClassification};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable snapshot of what the user confirmed.
///
/// Anything not listed is treated as declined: an unconfirmed evolution falls
/// back to a plain removal plus a plain addition, and a clone group without
/// kept members resolves to a single unresolved placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileDecisions {
    #[serde(default)]
    pub confirmed_evolutions: BTreeSet<EvolutionCandidate>,
    /// Zero-based member indices kept, per clone group identity.
    #[serde(default)]
    pub kept_clones: BTreeMap<Identity, BTreeSet<usize>>,
}

impl ReconcileDecisions {
    /// Decline everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Confirm every evolution candidate and keep every clone member.
    pub fn accept_all(classification: &ScanClassification) -> Self {
        Self {
            confirmed_evolutions: classification.evolutions.iter().cloned().collect(),
            kept_clones: classification
                .clone_groups
                .iter()
                .map(|g| (g.identity.clone(), (0..g.len()).collect()))
                .collect(),
        }
    }

    pub fn confirm_evolution(mut self, from: impl Into<Identity>, to: impl Into<Identity>) -> Self {
        self.confirmed_evolutions
            .insert(EvolutionCandidate::new(from, to));
        self
    }

    pub fn keep_clone_members(
        mut self,
        identity: impl Into<Identity>,
        members: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.kept_clones
            .entry(identity.into())
            .or_default()
            .extend(members);
        self
    }

    pub fn is_confirmed(&self, candidate: &EvolutionCandidate) -> bool {
        self.confirmed_evolutions.contains(candidate)
    }

    pub fn kept_members(&self, identity: &Identity) -> Option<&BTreeSet<usize>> {
        self.kept_clones.get(identity)
    }
}
