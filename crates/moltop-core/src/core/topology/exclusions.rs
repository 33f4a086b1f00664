use crate::core::models::ids::BeadId;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Per-bead sets of beads excluded from nonbonded interaction because of
/// bonded connectivity.
///
/// The list is derived data: it is always rebuilt in full from the current
/// bonded interactions (see
/// [`Topology::rebuild_exclusions`](crate::core::models::system::Topology::rebuild_exclusions))
/// and never patched incrementally. Storage is symmetric; excluding (a, b)
/// records the pair on both beads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    excluded: BTreeMap<BeadId, BTreeSet<BeadId>>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every exclusion.
    pub fn clear(&mut self) {
        self.excluded.clear();
    }

    /// Excludes the unordered pair (a, b). Self-pairs are ignored.
    pub fn exclude_pair(&mut self, a: BeadId, b: BeadId) {
        if a == b {
            return;
        }
        self.excluded.entry(a).or_default().insert(b);
        self.excluded.entry(b).or_default().insert(a);
    }

    /// Excludes every pair among `beads`.
    pub fn exclude_all(&mut self, beads: &[BeadId]) {
        for (&a, &b) in beads.iter().tuple_combinations() {
            self.exclude_pair(a, b);
        }
    }

    /// Removes the exclusion of the unordered pair (a, b), if present.
    pub fn remove_pair(&mut self, a: BeadId, b: BeadId) {
        if let Some(set) = self.excluded.get_mut(&a) {
            set.remove(&b);
            if set.is_empty() {
                self.excluded.remove(&a);
            }
        }
        if let Some(set) = self.excluded.get_mut(&b) {
            set.remove(&a);
            if set.is_empty() {
                self.excluded.remove(&b);
            }
        }
    }

    /// Returns whether the unordered pair (a, b) is excluded.
    pub fn is_excluded(&self, a: BeadId, b: BeadId) -> bool {
        self.excluded.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// Iterates over the beads excluded for `bead`; empty for unknown beads.
    pub fn exclusions_of(&self, bead: BeadId) -> impl Iterator<Item = BeadId> + '_ {
        self.excluded
            .get(&bead)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Iterates over all beads that have exclusions, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BeadId, &BTreeSet<BeadId>)> {
        self.excluded.iter().map(|(bead, set)| (*bead, set))
    }

    /// Returns the number of beads with at least one exclusion.
    pub fn bead_count(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(n: usize) -> BeadId {
        BeadId::new(n)
    }

    #[test]
    fn exclusions_are_symmetric() {
        let mut list = ExclusionList::new();
        list.exclude_pair(b(0), b(1));
        assert!(list.is_excluded(b(0), b(1)));
        assert!(list.is_excluded(b(1), b(0)));
        assert!(!list.is_excluded(b(0), b(2)));
    }

    #[test]
    fn self_pairs_are_ignored() {
        let mut list = ExclusionList::new();
        list.exclude_pair(b(3), b(3));
        assert!(list.is_empty());
    }

    #[test]
    fn exclude_all_covers_every_pair() {
        let mut list = ExclusionList::new();
        list.exclude_all(&[b(0), b(1), b(2)]);
        assert!(list.is_excluded(b(0), b(1)));
        assert!(list.is_excluded(b(0), b(2)));
        assert!(list.is_excluded(b(1), b(2)));
        assert_eq!(list.exclusions_of(b(1)).count(), 2);
    }

    #[test]
    fn remove_pair_clears_both_directions() {
        let mut list = ExclusionList::new();
        list.exclude_all(&[b(0), b(1), b(2)]);
        list.remove_pair(b(1), b(0));
        assert!(!list.is_excluded(b(0), b(1)));
        assert!(list.is_excluded(b(0), b(2)));
        assert!(list.is_excluded(b(1), b(2)));
    }

    #[test]
    fn unknown_beads_have_no_exclusions() {
        let list = ExclusionList::new();
        assert_eq!(list.exclusions_of(b(9)).count(), 0);
        assert!(!list.is_excluded(b(9), b(10)));
    }
}
