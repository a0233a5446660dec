//! Evolution correlation.
//!
//! An entity that transforms keeps its lineage key and gets a new stage
//! marker, so a scan sees its old identity disappear and a new one appear.
//! This pass pairs them up as candidates for the decision step.
//!
//! Tie-break: added identities are visited in scan order, and each one takes
//! the first unused removed identity (in identity order) with the same lineage
//! key and a different stage marker. A removed identity is paired at most
//! once. With several transformed copies of one lineage the pairing is
//! deterministic but not necessarily the "true" one.

use super::types::{Correlation, EvolutionCandidate};
use crate::identity::Identity;
use std::collections::HashMap;
use tracing::debug;

/// Pull evolution candidates out of `added` and `removed`.
///
/// Identities with an empty lineage key (including malformed identities
/// without a separator) never correlate.
pub fn correlate(added: &[Identity], removed: &[Identity]) -> Correlation {
    let mut by_lineage: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, identity) in removed.iter().enumerate() {
        let lineage = identity.lineage_key();
        if !lineage.is_empty() {
            by_lineage.entry(lineage).or_default().push(index);
        }
    }

    let mut paired = vec![false; removed.len()];
    let mut result = Correlation::default();

    for identity in added {
        let lineage = identity.lineage_key();
        let stage = identity.stage_marker();

        let matched = if lineage.is_empty() {
            None
        } else {
            by_lineage.get(lineage).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .find(|&i| !paired[i] && removed[i].stage_marker() != stage)
            })
        };

        match matched {
            Some(index) => {
                paired[index] = true;
                debug!("Evolution candidate: {} -> {}", removed[index], identity);
                result
                    .evolutions
                    .push(EvolutionCandidate::new(removed[index].clone(), identity.clone()));
            }
            None => result.added.push(identity.clone()),
        }
    }

    result.removed = removed
        .iter()
        .zip(&paired)
        .filter(|(_, was_paired)| !**was_paired)
        .map(|(identity, _)| identity.clone())
        .collect();

    result
}
