//! Applies user decisions to the metadata store.
//!
//! # Phases
//!
//! 1. **Evolutions**: confirmed candidates move their record (and storage
//!    directory) to the new identity; declined ones fall back to a plain
//!    removal and a plain addition
//! 2. **Additions**: new identities get an empty record so the next scan
//!    knows them
//! 3. **Removals**: every removed identity gets the removal sentinel tag
//! 4. **Clones**: each clone group materializes one identity per kept member,
//!    or a single unresolved placeholder when none is kept
//! 5. **Restores**: identities seen again lose a stale removal sentinel
//!
//! Storage failures are collected as warnings and never stop the batch. The
//! store is only mutated in memory; the caller persists it.

use crate::config::{CloneConfig, TagConfig};
use crate::entity::EntityRecord;
use crate::identity::Identity;
use crate::metadata::MetadataStore;
use crate::reconcile::decisions::ReconcileDecisions;
use crate::scan::{CloneGroup, EvolutionCandidate, ScanClassification};
use crate::storage::EntityStorage;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// How one clone group was materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneResolution {
    pub group: Identity,
    /// Resulting identities: the original first, then suffixed variants, or
    /// only the unresolved placeholder.
    pub identities: Vec<Identity>,
    /// Kept member indices, ascending.
    pub kept: Vec<usize>,
    /// Every record of the group, kept or not.
    pub members: Vec<EntityRecord>,
}

impl CloneResolution {
    pub fn is_unresolved(&self) -> bool {
        self.kept.is_empty()
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Identities worth highlighting this session: additions, confirmed
    /// evolutions, clone resolutions and removals. Never plain unchanged ones.
    pub highlighted: BTreeSet<Identity>,
    pub migrated: Vec<EvolutionCandidate>,
    pub declined: Vec<EvolutionCandidate>,
    /// Identities carrying the removal sentinel after this pass.
    pub removed: Vec<Identity>,
    /// Unchanged identities whose stale removal sentinel was cleared.
    pub restored: Vec<Identity>,
    pub clone_resolutions: Vec<CloneResolution>,
    /// Non-fatal problems (storage moves, invalid decisions).
    pub warnings: Vec<String>,
}

/// Apply `decisions` for `classification` to `store`.
///
/// `storage`, when given, has its per-identity directories moved and copied
/// alongside the metadata records.
pub fn apply(
    store: &mut MetadataStore,
    classification: &ScanClassification,
    decisions: &ReconcileDecisions,
    storage: Option<&EntityStorage>,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    // Phase 1: EVOLUTIONS
    for candidate in &classification.evolutions {
        if decisions.is_confirmed(candidate) {
            migrate(store, candidate, storage, &mut outcome);
        } else {
            debug!("Evolution declined: {} -> {}", candidate.from, candidate.to);
            outcome.declined.push(candidate.clone());
        }
    }

    // Phase 2: ADDITIONS
    let added = classification
        .added
        .iter()
        .chain(outcome.declined.iter().map(|c| &c.to));
    for identity in added {
        store.get_or_create(identity);
        outcome.highlighted.insert(identity.clone());
    }

    // Phase 3: REMOVALS
    let removed: Vec<Identity> = classification
        .removed
        .iter()
        .chain(outcome.declined.iter().map(|c| &c.from))
        .cloned()
        .collect();
    for identity in removed {
        if store.add_tag(&identity, TagConfig::REMOVED_SENTINEL) {
            debug!("Tagged {} as {}", identity, TagConfig::REMOVED_SENTINEL);
        }
        outcome.highlighted.insert(identity.clone());
        outcome.removed.push(identity);
    }

    // Phase 4: CLONES
    for group in &classification.clone_groups {
        let resolution = resolve_clone_group(store, group, decisions, storage, &mut outcome);
        outcome
            .highlighted
            .extend(resolution.identities.iter().cloned());
        outcome.clone_resolutions.push(resolution);
    }

    // Phase 5: RESTORES
    for identity in classification
        .unchanged
        .iter()
        .chain(&classification.retained_clones)
    {
        let restored = store
            .get(identity.as_str())
            .map(|meta| meta.has_tag(TagConfig::REMOVED_SENTINEL))
            .unwrap_or(false);
        if restored {
            store.get_or_create(identity).remove_tag(TagConfig::REMOVED_SENTINEL);
            outcome.restored.push(identity.clone());
        }
    }

    info!(
        "Reconciled: {} highlighted, {} migrated, {} declined, {} removed, {} clone groups, {} warnings",
        outcome.highlighted.len(),
        outcome.migrated.len(),
        outcome.declined.len(),
        outcome.removed.len(),
        outcome.clone_resolutions.len(),
        outcome.warnings.len()
    );
    outcome
}

fn migrate(
    store: &mut MetadataStore,
    candidate: &EvolutionCandidate,
    storage: Option<&EntityStorage>,
    outcome: &mut ReconcileOutcome,
) {
    if !store.rename(&candidate.from, &candidate.to) {
        store.get_or_create(&candidate.to);
    }

    if let Some(storage) = storage {
        if let Err(e) = storage.relocate(&candidate.from, &candidate.to) {
            let msg = format!(
                "Could not move storage {} -> {}: {}",
                candidate.from, candidate.to, e
            );
            warn!("{}", msg);
            outcome.warnings.push(msg);
        }
    }

    debug!("Evolution applied: {} -> {}", candidate.from, candidate.to);
    outcome.highlighted.insert(candidate.to.clone());
    outcome.migrated.push(candidate.clone());
}

fn resolve_clone_group(
    store: &mut MetadataStore,
    group: &CloneGroup,
    decisions: &ReconcileDecisions,
    storage: Option<&EntityStorage>,
    outcome: &mut ReconcileOutcome,
) -> CloneResolution {
    let mut kept = Vec::new();
    for &index in decisions.kept_members(&group.identity).into_iter().flatten() {
        if index < group.len() {
            kept.push(index);
        } else {
            let msg = format!(
                "Ignoring kept member {} of clone group {} ({} members)",
                index,
                group.identity,
                group.len()
            );
            warn!("{}", msg);
            outcome.warnings.push(msg);
        }
    }

    let identities = if kept.is_empty() {
        vec![group.identity.unresolved_clone()]
    } else {
        store.get_or_create(&group.identity);
        std::iter::once(group.identity.clone())
            .chain(
                (1..kept.len())
                    .map(|n| group.identity.with_clone_index(CloneConfig::FIRST_SUFFIX_INDEX + n - 1)),
            )
            .collect()
    };

    for identity in identities.iter().filter(|id| **id != group.identity) {
        store.duplicate(&group.identity, identity);
        if let Some(storage) = storage {
            if let Err(e) = storage.duplicate(&group.identity, identity) {
                let msg = format!(
                    "Could not copy storage {} -> {}: {}",
                    group.identity, identity, e
                );
                warn!("{}", msg);
                outcome.warnings.push(msg);
            }
        }
    }

    debug!(
        "Clone group {}: kept {} of {}",
        group.identity,
        kept.len(),
        group.len()
    );
    CloneResolution {
        group: group.identity.clone(),
        identities,
        kept,
        members: group.members.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Position;
    use tempfile::TempDir;

    fn id(s: &str) -> Identity {
        Identity::from(s)
    }

    fn clone_group(identity: &str, size: u16) -> CloneGroup {
        CloneGroup {
            identity: id(identity),
            members: (0..size)
                .map(|slot| EntityRecord::new(4, Position::boxed(0, slot)))
                .collect(),
        }
    }

    fn evolution_classification() -> ScanClassification {
        ScanClassification {
            evolutions: vec![EvolutionCandidate::new("0025-A", "0026-A")],
            ..Default::default()
        }
    }

    fn store_with_record(identity: &str) -> MetadataStore {
        let mut store = MetadataStore::new();
        let meta = store.get_or_create(&id(identity));
        meta.set_tags_from_text("Shiny, Event");
        meta.comment = "from Ana".into();
        store
    }

    #[test]
    fn test_confirmed_evolution_migrates_metadata() {
        let mut store = store_with_record("0025-A");
        let before = store.get("0025-A").cloned().unwrap();
        let decisions = ReconcileDecisions::none().confirm_evolution("0025-A", "0026-A");

        let outcome = apply(&mut store, &evolution_classification(), &decisions, None);

        assert_eq!(store.get("0026-A"), Some(&before));
        assert!(store.get("0025-A").is_none());
        assert!(store.get_or_create(&id("0025-A")).is_empty());
        assert_eq!(outcome.migrated.len(), 1);
        assert_eq!(outcome.highlighted, BTreeSet::from([id("0026-A")]));
    }

    #[test]
    fn test_declined_evolution_falls_back_to_add_and_remove() {
        let mut store = store_with_record("0025-A");
        let outcome = apply(
            &mut store,
            &evolution_classification(),
            &ReconcileDecisions::none(),
            None,
        );

        assert_eq!(outcome.declined.len(), 1);
        assert!(store.get("0025-A").unwrap().has_tag(TagConfig::REMOVED_SENTINEL));
        assert!(store.get("0026-A").unwrap().is_empty());
        assert_eq!(
            outcome.highlighted,
            BTreeSet::from([id("0025-A"), id("0026-A")])
        );
    }

    #[test]
    fn test_sentinel_is_idempotent() {
        let mut store = MetadataStore::new();
        let classification = ScanClassification {
            removed: vec![id("0001-A")],
            ..Default::default()
        };

        apply(&mut store, &classification, &ReconcileDecisions::none(), None);
        apply(&mut store, &classification, &ReconcileDecisions::none(), None);

        let tags = &store.get("0001-A").unwrap().tags;
        assert_eq!(
            tags.iter().filter(|t| *t == TagConfig::REMOVED_SENTINEL).count(),
            1
        );
    }

    #[test]
    fn test_clone_resolution_coverage() {
        let classification = ScanClassification {
            added: vec![id("0004-X")],
            clone_groups: vec![clone_group("0004-X", 3)],
            ..Default::default()
        };

        let mut store = MetadataStore::new();
        let keep_two = ReconcileDecisions::none().keep_clone_members("0004-X", [0, 2]);
        let outcome = apply(&mut store, &classification, &keep_two, None);
        let resolution = &outcome.clone_resolutions[0];
        assert_eq!(resolution.identities, vec![id("0004-X"), id("0004-X(2)")]);
        assert!(store.contains("0004-X") && store.contains("0004-X(2)"));

        let mut store = MetadataStore::new();
        let outcome = apply(&mut store, &classification, &ReconcileDecisions::none(), None);
        let resolution = &outcome.clone_resolutions[0];
        assert_eq!(resolution.identities, vec![id("0004-X(cloned-unresolved)")]);
        assert!(resolution.is_unresolved());
        assert_eq!(resolution.members.len(), 3);
    }

    #[test]
    fn test_keep_single_clone_member() {
        let classification = ScanClassification {
            added: vec![id("0004-XYZ")],
            clone_groups: vec![clone_group("0004-XYZ", 2)],
            ..Default::default()
        };
        let mut store = MetadataStore::new();
        let decisions = ReconcileDecisions::none().keep_clone_members("0004-XYZ", [0]);

        let outcome = apply(&mut store, &classification, &decisions, None);
        assert_eq!(outcome.highlighted, BTreeSet::from([id("0004-XYZ")]));
    }

    #[test]
    fn test_suffixed_clones_copy_base_metadata() {
        let classification = ScanClassification {
            unchanged: vec![id("0004-X")],
            clone_groups: vec![clone_group("0004-X", 3)],
            ..Default::default()
        };
        let mut store = store_with_record("0004-X");
        let decisions = ReconcileDecisions::none().keep_clone_members("0004-X", [0, 1, 2]);

        apply(&mut store, &classification, &decisions, None);
        assert_eq!(store.get("0004-X(3)"), store.get("0004-X"));
        assert_eq!(store.get("0004-X(2)").unwrap().comment, "from Ana");
    }

    #[test]
    fn test_out_of_range_clone_member_is_warned() {
        let classification = ScanClassification {
            clone_groups: vec![clone_group("0004-X", 2)],
            ..Default::default()
        };
        let mut store = MetadataStore::new();
        let decisions = ReconcileDecisions::none().keep_clone_members("0004-X", [5]);

        let outcome = apply(&mut store, &classification, &decisions, None);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.clone_resolutions[0].is_unresolved());
    }

    #[test]
    fn test_unchanged_is_not_highlighted_and_sentinel_is_cleared() {
        let mut store = MetadataStore::new();
        store.add_tag(&id("0001-A"), TagConfig::REMOVED_SENTINEL);
        store.add_tag(&id("0001-A"), "Keep");
        let classification = ScanClassification {
            unchanged: vec![id("0001-A")],
            ..Default::default()
        };

        let outcome = apply(&mut store, &classification, &ReconcileDecisions::none(), None);
        assert!(outcome.highlighted.is_empty());
        assert_eq!(outcome.restored, vec![id("0001-A")]);
        let meta = store.get("0001-A").unwrap();
        assert!(!meta.has_tag(TagConfig::REMOVED_SENTINEL));
        assert!(meta.has_tag("Keep"));
    }

    #[test]
    fn test_storage_is_moved_and_failures_are_warnings() {
        let temp = TempDir::new().unwrap();
        let storage = EntityStorage::new(temp.path());
        std::fs::write(storage.ensure(&id("0025-A")).unwrap().join("x"), "1").unwrap();
        storage.ensure(&id("0002-B")).unwrap();
        storage.ensure(&id("0003-B")).unwrap();

        let classification = ScanClassification {
            evolutions: vec![
                EvolutionCandidate::new("0025-A", "0026-A"),
                EvolutionCandidate::new("0002-B", "0003-B"),
            ],
            ..Default::default()
        };
        let mut store = MetadataStore::new();
        let decisions = ReconcileDecisions::accept_all(&classification);

        let outcome = apply(&mut store, &classification, &decisions, Some(&storage));
        assert!(storage.dir_for(&id("0026-A")).join("x").exists());
        assert_eq!(outcome.migrated.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(store.contains("0003-B"));
    }
}
