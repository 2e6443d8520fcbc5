//! Worker group membership and the optional active sub-group.

use smallvec::SmallVec;

use crate::id::Rank;

/// Rank list sized for typical sessions without heap allocation.
pub type RankList = SmallVec<[Rank; 8]>;

/// The worker ranks of a session, plus an optional active sub-group.
///
/// A sub-group is a subset of worker ranks cooperating on a specialized
/// computation (e.g. an adaptive-resolution region). While a sub-group is
/// active, ranks outside it do not participate in replicated-object
/// construction or mutation: [`participates`](WorkerGroup::participates)
/// returns `false` for them and dispatched operations skip them as a
/// deliberate no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerGroup {
    workers: RankList,
    subgroup: Option<RankList>,
}

impl WorkerGroup {
    /// A group of `worker_count` ranks numbered `1..=worker_count`,
    /// with no sub-group.
    pub fn new(worker_count: usize) -> Self {
        Self {
            workers: (1..=worker_count as u32).map(Rank).collect(),
            subgroup: None,
        }
    }

    /// A group with an active sub-group restricted to `members`.
    ///
    /// Membership is not validated here; [`SessionConfig::validate`] owns
    /// the range checks so an invalid sub-group is rejected before any
    /// thread is spawned.
    ///
    /// [`SessionConfig::validate`]: https://docs.rs/kinet-engine
    pub fn with_subgroup(worker_count: usize, members: impl IntoIterator<Item = Rank>) -> Self {
        Self {
            workers: (1..=worker_count as u32).map(Rank).collect(),
            subgroup: Some(members.into_iter().collect()),
        }
    }

    /// The worker ranks, in rank order.
    pub fn workers(&self) -> &[Rank] {
        &self.workers
    }

    /// Number of worker ranks.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether a sub-group is active.
    pub fn subgroup_active(&self) -> bool {
        self.subgroup.is_some()
    }

    /// The active sub-group members, if any.
    pub fn subgroup_members(&self) -> Option<&[Rank]> {
        self.subgroup.as_deref()
    }

    /// Whether `rank` participates in replicated-object operations.
    ///
    /// With no active sub-group every worker participates; with an active
    /// sub-group only its members do. The controller never holds replicas
    /// and is not part of any group.
    pub fn participates(&self, rank: Rank) -> bool {
        match &self.subgroup {
            None => self.workers.contains(&rank),
            Some(members) => members.contains(&rank),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_workers_participate_without_subgroup() {
        let group = WorkerGroup::new(3);
        assert_eq!(group.worker_count(), 3);
        assert!(!group.subgroup_active());
        for rank in 1..=3 {
            assert!(group.participates(Rank(rank)));
        }
        assert!(!group.participates(Rank::CONTROLLER));
        assert!(!group.participates(Rank(4)));
    }

    #[test]
    fn active_subgroup_excludes_nonmembers() {
        let group = WorkerGroup::with_subgroup(3, [Rank(1), Rank(3)]);
        assert!(group.subgroup_active());
        assert!(group.participates(Rank(1)));
        assert!(!group.participates(Rank(2)));
        assert!(group.participates(Rank(3)));
        assert_eq!(group.subgroup_members(), Some(&[Rank(1), Rank(3)][..]));
    }

    #[test]
    fn workers_are_rank_ordered() {
        let group = WorkerGroup::new(4);
        let ranks: Vec<u32> = group.workers().iter().map(|r| r.0).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    proptest::proptest! {
        /// Sub-group participation is exactly membership, and never
        /// exceeds the plain worker-group rule.
        #[test]
        fn participation_matches_membership(
            worker_count in 1usize..16,
            members in proptest::collection::btree_set(1u32..16, 1..8),
            probe in 0u32..20,
        ) {
            let members: Vec<Rank> = members
                .into_iter()
                .filter(|&m| m as usize <= worker_count)
                .map(Rank)
                .collect();
            proptest::prop_assume!(!members.is_empty());

            let plain = WorkerGroup::new(worker_count);
            let restricted =
                WorkerGroup::with_subgroup(worker_count, members.iter().copied());

            let rank = Rank(probe);
            proptest::prop_assert_eq!(
                restricted.participates(rank),
                members.contains(&rank)
            );
            if restricted.participates(rank) {
                proptest::prop_assert!(plain.participates(rank));
            }
        }
    }
}
