//! Phase orchestration.
//!
//! [`Mapper::run`] matches two programs in a fixed sequence of phases:
//!
//! 1. **Static methods**, ranked at every classifier [`Level`] until a round accepts nothing
//! 2. **Instance methods**, likewise
//! 3. Global reduction
//! 4. **Classes**, whose features now see the matched methods
//! 5. **Fields**
//! 6. Global reduction
//! 7. **Reference propagation** from every accepted class and method pair
//! 8. Final reduction
//!
//! Each accepted pair is recorded both in the confirmed [`Matches`] that later rounds consult and
//! as a vote in the running [`NodeMappings`]. After every reduction the confirmed matches are
//! rebuilt from the reduced table, so later phases work against a consistent injective relation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use remapper::prelude::*;
//!
//! let config = MapperConfig::default();
//! let old = Program::from_path("old.jar", &config.ignore_patterns)?;
//! let new = Program::from_path("new.jar", &config.ignore_patterns)?;
//!
//! let result = Mapper::run(&old, &new, &config, &Classifiers::new());
//! let (classes, methods, fields) = result.counts();
//! println!("{classes} classes, {methods} methods, {fields} fields");
//! # Ok::<(), remapper::Error>(())
//! ```

mod config;
mod propagate;

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

pub use config::MapperConfig;

use crate::{
    classifier::{Classifier, Classifiers, Level},
    engine::{rank, Matches, NodeMappings},
    program::{ClassId, EntityRef, FieldId, MethodId, Program},
    similarity::MatchContext,
};

/// The outcome of a [`Mapper`] run.
#[derive(Debug, Clone)]
pub struct MatchResult {
    matches: Matches,
    mappings: NodeMappings,
    rounds: usize,
    elapsed: Duration,
}

impl MatchResult {
    /// Matched class pairs `(old, new)`, ordered by old id.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, ClassId)> + '_ {
        self.matches.classes()
    }

    /// Matched method pairs `(old, new)`, ordered by old id.
    pub fn methods(&self) -> impl Iterator<Item = (MethodId, MethodId)> + '_ {
        self.matches.methods()
    }

    /// Matched field pairs `(old, new)`, ordered by old id.
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, FieldId)> + '_ {
        self.matches.fields()
    }

    /// Every match keyed by the new-program entity.
    #[must_use]
    pub fn new_to_old(&self) -> BTreeMap<EntityRef, EntityRef> {
        self.old_to_new().into_iter().map(|(old, new)| (new, old)).collect()
    }

    /// Every match keyed by the old-program entity.
    #[must_use]
    pub fn old_to_new(&self) -> BTreeMap<EntityRef, EntityRef> {
        self.classes()
            .map(|(a, b)| (a.into(), b.into()))
            .chain(self.methods().map(|(a, b)| (a.into(), b.into())))
            .chain(self.fields().map(|(a, b)| (a.into(), b.into())))
            .collect()
    }

    /// Number of matched class, method and field pairs.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        self.matches.counts()
    }

    /// The reduced vote table, with scores and weights of every surviving pair.
    #[must_use]
    pub fn mappings(&self) -> &NodeMappings {
        &self.mappings
    }

    /// The confirmed matches.
    #[must_use]
    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    /// Number of scoring rounds run over all phases and levels.
    #[must_use]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Wall-clock time of the run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Runs the matching phases over two programs.
///
/// The mapper is the single writer of the confirmed matches: candidate pairs are scored in
/// parallel, and the results are applied on the calling thread between rounds.
pub struct Mapper<'a> {
    old: &'a Program,
    new: &'a Program,
    config: &'a MapperConfig,
    classifiers: &'a Classifiers,
    matches: Matches,
    mappings: NodeMappings,
    rounds: usize,
}

impl<'a> Mapper<'a> {
    /// Match `old` against `new`.
    ///
    /// Never fails: pairs that stay ambiguous are left unmatched.
    #[must_use]
    pub fn run(
        old: &'a Program,
        new: &'a Program,
        config: &'a MapperConfig,
        classifiers: &'a Classifiers,
    ) -> MatchResult {
        let mapper = Mapper {
            old,
            new,
            config,
            classifiers,
            matches: Matches::new(),
            mappings: NodeMappings::new(),
            rounds: 0,
        };
        mapper.execute()
    }

    fn execute(mut self) -> MatchResult {
        let start = Instant::now();
        let classifiers = self.classifiers;

        self.match_phase(
            "static methods",
            &classifiers.static_methods,
            methods_where(self.old, true),
            methods_where(self.new, true),
            |ctx, a, b| ctx.methods_compatible(a, b),
        );
        self.match_phase(
            "instance methods",
            &classifiers.instance_methods,
            methods_where(self.old, false),
            methods_where(self.new, false),
            |ctx, a, b| ctx.methods_compatible(a, b),
        );
        self.reduce();

        let classes = |program: &Program| -> Vec<ClassId> {
            program.active_classes().map(|c| c.id).collect()
        };
        self.match_phase(
            "classes",
            &classifiers.classes,
            classes(self.old),
            classes(self.new),
            |ctx, a, b| ctx.classes_compatible(a, b),
        );
        let fields = |program: &Program| -> Vec<FieldId> {
            program.active_fields().map(|f| f.id).collect()
        };
        self.match_phase(
            "fields",
            &classifiers.fields,
            fields(self.old),
            fields(self.new),
            |ctx, a, b| ctx.fields_compatible(a, b),
        );
        self.reduce();

        if self.config.propagate {
            let votes = {
                let ctx = MatchContext::new(self.old, self.new, &self.matches);
                propagate::propagate(&ctx, &self.mappings.as_map())
            };
            log::info!("Reference propagation proposed {} pairs", votes.len());
            self.mappings.merge(&votes);
            self.reduce();
        }

        let (classes, methods, fields) = self.matches.counts();
        log::info!("Matched {classes} classes, {methods} methods and {fields} fields");

        MatchResult {
            matches: self.matches,
            mappings: self.mappings,
            rounds: self.rounds,
            elapsed: start.elapsed(),
        }
    }

    /// Rank the unmatched candidates level by level, each level until a round accepts nothing.
    fn match_phase<T, F>(
        &mut self,
        phase: &str,
        classifier: &Classifier<T>,
        old: Vec<T>,
        new: Vec<T>,
        compatible: F,
    ) where
        T: Copy + Send + Sync + Into<EntityRef>,
        F: Fn(&MatchContext<'_>, T, T) -> bool + Sync,
    {
        log::info!("Matching {phase}: {} old, {} new candidates", old.len(), new.len());
        let options = self.config.rank_options();

        for level in Level::ALL {
            for round in 1..=self.config.max_rounds_per_level {
                let from: Vec<T> = old
                    .iter()
                    .copied()
                    .filter(|&a| !self.matches.has_old(a.into()))
                    .collect();
                let to: Vec<T> = new
                    .iter()
                    .copied()
                    .filter(|&b| !self.matches.has_new(b.into()))
                    .collect();
                if from.is_empty() || to.is_empty() {
                    break;
                }

                let ranked = {
                    let ctx = MatchContext::new(self.old, self.new, &self.matches);
                    rank(&ctx, classifier, level, &from, &to, |a, b| compatible(&ctx, a, b), options)
                };
                self.rounds += 1;

                let mut accepted = 0;
                for pair in &ranked {
                    let (from, to) = (pair.from.into(), pair.to.into());
                    if self.matches.set(from, to) {
                        accepted += 1;
                    }
                    self.mappings.map(from, to).raise_weight(pair.weight);
                }
                log::info!("Matched {accepted} {phase} ({level} level, round {round})");

                if accepted == 0 {
                    break;
                }
            }
        }
    }

    /// Reduce the vote table and rebuild the confirmed matches from it.
    fn reduce(&mut self) {
        self.mappings.reduce(self.old, self.new);
        self.matches.clear();
        for mapping in self.mappings.iter() {
            self.matches.set(mapping.from, mapping.to);
        }
        log::debug!("Reduced to {} pairs", self.mappings.len());
    }
}

fn methods_where(program: &Program, is_static: bool) -> Vec<MethodId> {
    program
        .active_methods()
        .filter(|m| m.is_static() == is_static)
        .map(|m| m.id)
        .collect()
}
