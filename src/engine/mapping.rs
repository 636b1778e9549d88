//! Candidate pairs collected across phases and their global conflict resolution.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

use crate::program::{EntityRef, Program};

/// A candidate pair with its vote count and best confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// Entity of the old program
    pub from: EntityRef,
    /// Entity of the new program
    pub to: EntityRef,
    /// Number of votes across all phases
    pub score: u32,
    /// Best classifier confidence seen for the pair
    pub weight: u32,
}

impl Mapping {
    /// A pair without votes.
    #[must_use]
    pub fn new(from: EntityRef, to: EntityRef) -> Self {
        Mapping {
            from,
            to,
            score: 0,
            weight: 0,
        }
    }

    /// Record a confidence; the stored weight never decreases.
    pub fn raise_weight(&mut self, weight: u32) {
        self.weight = self.weight.max(weight);
    }

    /// Add the votes of `other` and keep the higher weight.
    pub fn merge(&mut self, other: &Mapping) {
        self.score = self.score.saturating_add(other.score);
        self.raise_weight(other.weight);
    }
}

/// Votes for candidate pairs, keyed by the old entity.
///
/// Phases add votes with [`NodeMappings::map`]; [`NodeMappings::reduce`] then keeps the
/// strongest pairs such that no entity appears twice on either side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMappings {
    mappings: BTreeMap<EntityRef, BTreeMap<EntityRef, Mapping>>,
}

impl NodeMappings {
    /// No candidates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, from: EntityRef, to: EntityRef) -> &mut Mapping {
        self.mappings
            .entry(from)
            .or_default()
            .entry(to)
            .or_insert_with(|| Mapping::new(from, to))
    }

    /// Add one vote for `from` -> `to` and return the pair for further updates.
    pub fn map(&mut self, from: EntityRef, to: EntityRef) -> &mut Mapping {
        let mapping = self.entry(from, to);
        mapping.score = mapping.score.saturating_add(1);
        mapping
    }

    /// The pair `from` -> `to`, if it has been proposed.
    #[must_use]
    pub fn get(&self, from: EntityRef, to: EntityRef) -> Option<&Mapping> {
        self.mappings.get(&from)?.get(&to)
    }

    /// Fold every pair of `other` into this table.
    ///
    /// Scores add up; weights keep their maximum, so merging never lowers a weight.
    pub fn merge(&mut self, other: &NodeMappings) {
        for mapping in other.iter() {
            self.entry(mapping.from, mapping.to).merge(mapping);
        }
    }

    /// Resolve conflicts so that every entity keeps at most one partner.
    ///
    /// Pairs are accepted greedily by descending score, then descending weight, then the
    /// descending id strings of the old and the new entity. A pair is skipped when either of
    /// its entities has already been claimed by an earlier pair.
    pub fn reduce(&mut self, old: &Program, new: &Program) {
        let mut sorted: Vec<(Mapping, String, String)> = self
            .iter()
            .map(|m| (*m, old.id_string(m.from), new.id_string(m.to)))
            .collect();
        sorted.sort_by(|(a, a_from, a_to), (b, b_from, b_to)| {
            b.score
                .cmp(&a.score)
                .then(b.weight.cmp(&a.weight))
                .then_with(|| b_from.cmp(a_from))
                .then_with(|| b_to.cmp(a_to))
                .then_with(|| tie_break(a, b))
        });

        let mut claimed_from = BTreeSet::new();
        let mut claimed_to = BTreeSet::new();
        let mut reduced = NodeMappings::new();
        for (mapping, _, _) in sorted {
            if claimed_from.contains(&mapping.from) || claimed_to.contains(&mapping.to) {
                continue;
            }
            claimed_from.insert(mapping.from);
            claimed_to.insert(mapping.to);
            *reduced.entry(mapping.from, mapping.to) = mapping;
        }
        *self = reduced;
    }

    /// The strongest candidate for `from`.
    #[must_use]
    pub fn best(&self, from: EntityRef) -> Option<EntityRef> {
        self.mappings
            .get(&from)?
            .values()
            .max_by(|a, b| {
                a.score
                    .cmp(&b.score)
                    .then(a.weight.cmp(&b.weight))
                    .then(b.to.cmp(&a.to))
            })
            .map(|m| m.to)
    }

    /// Candidates proposed for `from`.
    pub fn candidates(&self, from: EntityRef) -> impl Iterator<Item = &Mapping> {
        self.mappings.get(&from).into_iter().flat_map(BTreeMap::values)
    }

    /// Every pair, ordered by old then new entity.
    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.values().flat_map(BTreeMap::values)
    }

    /// The best candidate of every old entity.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<EntityRef, EntityRef> {
        self.mappings
            .keys()
            .filter_map(|&from| Some((from, self.best(from)?)))
            .collect()
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` without pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.values().all(BTreeMap::is_empty)
    }
}

fn tie_break(a: &Mapping, b: &Mapping) -> Ordering {
    a.from.cmp(&b.from).then(a.to.cmp(&b.to))
}
