//! Snapshot differencing.
//!
//! Groups the records of a fresh scan by identity and partitions the union of
//! known and scanned identities into added, removed and unchanged.

use super::types::{CloneGroup, ScanDiff};
use crate::entity::EntityRecord;
use crate::identity::{derive_identity, Identity};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Compare `known` identities with the records of a scan.
///
/// A cloned identity that is also new appears once in `added` and once in
/// `clone_groups`; resolving the clone is a later refinement.
///
/// A known clone variant stays out of `removed` only while the scan still
/// holds enough copies of its base: `X(n)` needs `n` copies, the
/// `X(cloned-unresolved)` placeholder needs two. A clone group whose
/// variants `X(2)..X(len)` are all known was resolved before and is not
/// reported again.
pub fn diff(known: &BTreeSet<Identity>, scanned: &[EntityRecord]) -> ScanDiff {
    let mut order: Vec<Identity> = Vec::new();
    let mut groups: HashMap<Identity, Vec<EntityRecord>> = HashMap::new();

    for record in scanned {
        match groups.entry(derive_identity(record)) {
            Entry::Occupied(mut entry) => entry.get_mut().push(record.clone()),
            Entry::Vacant(entry) => {
                order.push(entry.key().clone());
                entry.insert(vec![record.clone()]);
            }
        }
    }

    let mut result = ScanDiff::default();
    let mut copies: HashMap<Identity, usize> = HashMap::new();

    for identity in &order {
        if known.contains(identity) {
            result.unchanged.push(identity.clone());
        } else {
            result.added.push(identity.clone());
        }

        let members = groups.remove(identity).unwrap_or_default();
        copies.insert(identity.clone(), members.len());
        if let Some(first) = members.first() {
            result.observed.insert(identity.clone(), first.clone());
        }
        if members.len() > 1 {
            if is_resolved(known, identity, members.len()) {
                debug!("Clone group {} already resolved", identity);
            } else {
                result.clone_groups.push(CloneGroup {
                    identity: identity.clone(),
                    members,
                });
            }
        }
    }

    for identity in known {
        if result.observed.contains_key(identity) {
            continue;
        }
        let backed = identity
            .clone_base()
            .map(|base| {
                let seen = copies.get(&base).copied().unwrap_or(0);
                seen >= identity.clone_index().unwrap_or(2)
            })
            .unwrap_or(false);
        if backed {
            result.retained_clones.push(identity.clone());
        } else {
            result.removed.push(identity.clone());
        }
    }

    debug!(
        "Diff: {} added, {} removed, {} unchanged, {} clone groups",
        result.added.len(),
        result.removed.len(),
        result.unchanged.len(),
        result.clone_groups.len()
    );
    result
}

/// Whether every suffixed variant of a clone group of `len` copies is known.
fn is_resolved(known: &BTreeSet<Identity>, identity: &Identity, len: usize) -> bool {
    (2..=len).all(|n| known.contains(&identity.with_clone_index(n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Position;

    fn record(species: u16, personality: u32, position: Position) -> EntityRecord {
        EntityRecord::new(species, position)
            .with_personality(personality)
            .with_trainer(1, 2, "Ash")
    }

    fn known(ids: &[&Identity]) -> BTreeSet<Identity> {
        ids.iter().map(|id| (*id).clone()).collect()
    }

    #[test]
    fn test_partition_completeness() {
        let a = record(1, 100, Position::roster(0));
        let b = record(4, 200, Position::boxed(0, 0));
        let c = record(7, 300, Position::boxed(0, 1));
        let (ia, ib, ic) = (derive_identity(&a), derive_identity(&b), derive_identity(&c));
        let gone = Identity::from("0150-999");

        let known_ids = known(&[&ia, &ib, &gone]);
        let result = diff(&known_ids, &[a, b, c]);

        assert_eq!(result.unchanged, vec![ia.clone(), ib.clone()]);
        assert_eq!(result.added, vec![ic.clone()]);
        assert_eq!(result.removed, vec![gone.clone()]);
        assert!(result.clone_groups.is_empty());

        let union: BTreeSet<Identity> = result
            .unchanged
            .iter()
            .chain(&result.added)
            .chain(&result.removed)
            .cloned()
            .collect();
        let expected: BTreeSet<Identity> = [ia, ib, ic, gone].into_iter().collect();
        assert_eq!(union, expected);
        assert_eq!(
            result.unchanged.len() + result.added.len() + result.removed.len(),
            expected.len()
        );
    }

    #[test]
    fn test_relocated_entity_is_unchanged() {
        let before = record(25, 42, Position::boxed(0, 0));
        let after = record(25, 42, Position::boxed(9, 12));
        let known_ids = known(&[&derive_identity(&before)]);

        let result = diff(&known_ids, &[after]);
        assert_eq!(result.unchanged.len(), 1);
        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_clone_group_reported_once_in_added() {
        let a = record(4, 7, Position::boxed(0, 0)).with_container("one.sav");
        let b = record(4, 7, Position::boxed(3, 5)).with_container("two.sav");
        let id = derive_identity(&a);

        let result = diff(&BTreeSet::new(), &[a.clone(), b.clone()]);
        assert_eq!(result.added, vec![id.clone()]);
        assert_eq!(result.clone_groups.len(), 1);
        assert_eq!(result.clone_groups[0].identity, id);
        assert_eq!(result.clone_groups[0].members, vec![a.clone(), b]);
        assert_eq!(result.observed.get(&id), Some(&a));
    }

    #[test]
    fn test_known_clone_variants_are_retained_while_copies_remain() {
        let a = record(4, 7, Position::boxed(0, 0));
        let b = record(4, 7, Position::boxed(0, 1));
        let base = derive_identity(&a);
        let second = base.with_clone_index(2);
        let placeholder = base.unresolved_clone();

        let known_ids = known(&[&base, &second, &placeholder]);
        let result = diff(&known_ids, &[a, b]);

        assert_eq!(result.unchanged, vec![base]);
        assert_eq!(result.retained_clones, vec![second, placeholder]);
        assert!(result.removed.is_empty());
        assert!(result.clone_groups.is_empty());
    }

    #[test]
    fn test_clone_variant_without_copy_is_removed() {
        let a = record(4, 7, Position::boxed(0, 0));
        let base = derive_identity(&a);
        let second = base.with_clone_index(2);
        let placeholder = base.unresolved_clone();
        let stranger = Identity::from("0009-1").unresolved_clone();

        let known_ids = known(&[&base, &second, &placeholder, &stranger]);
        let result = diff(&known_ids, &[a]);

        assert_eq!(result.unchanged, vec![base.clone()]);
        assert!(result.retained_clones.is_empty());
        let removed: BTreeSet<Identity> = result.removed.iter().cloned().collect();
        assert_eq!(removed, BTreeSet::from([second, placeholder, stranger]));

        let union: BTreeSet<Identity> = result
            .unchanged
            .iter()
            .chain(&result.added)
            .chain(&result.removed)
            .cloned()
            .collect();
        assert_eq!(union, known_ids);
    }

    #[test]
    fn test_partially_resolved_clone_group_is_reported() {
        let records: Vec<EntityRecord> = (0..3)
            .map(|slot| record(4, 7, Position::boxed(1, slot)))
            .collect();
        let base = derive_identity(&records[0]);
        let known_ids = known(&[&base, &base.with_clone_index(2)]);

        let result = diff(&known_ids, &records);
        assert_eq!(result.clone_groups.len(), 1);
        assert_eq!(result.clone_groups[0].len(), 3);
        assert_eq!(result.retained_clones, vec![base.with_clone_index(2)]);
    }

    #[test]
    fn test_empty_scan_removes_everything() {
        let known_ids = known(&[&Identity::from("0001-A"), &Identity::from("0002-B")]);
        let result = diff(&known_ids, &[]);
        assert_eq!(result.removed.len(), 2);
        assert!(result.added.is_empty());
        assert!(result.observed.is_empty());
    }
}
