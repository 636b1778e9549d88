//! Weighted feature tables that score candidate pairs.
//!
//! A [`Classifier`] is an ordered list of [`Feature`]s. Each feature maps a pair of entities,
//! one from each program, to a similarity in `[0, 1]` and carries a weight and a [`Level`].
//! The raw score of a pair at a level is the weighted sum over every feature enabled at that
//! level; [`Classifier::weight`] scales it to a 0-100 confidence so that scores of different
//! entity kinds and levels stay comparable.
//!
//! Levels are cumulative: [`Level::Secondary`] runs every [`Level::Initial`] feature plus the
//! expensive ones, such as instruction edit distance, that only pay off once most entities are
//! matched.
//!
//! # Examples
//!
//! ```rust
//! use remapper::classifier::{Classifiers, Level};
//!
//! let classifiers = Classifiers::new();
//! assert!(classifiers.classes.total_weight(Level::Initial) > 0);
//! assert!(
//!     classifiers.static_methods.total_weight(Level::Secondary)
//!         > classifiers.static_methods.total_weight(Level::Initial)
//! );
//! ```

mod class;
mod field;
mod method;

use std::fmt;

use crate::{
    program::{ClassId, FieldId, MethodId},
    similarity::MatchContext,
};

/// Refinement level of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Cheap, highly discriminating features
    Initial,
    /// Expensive features for the remainder left after the initial level
    Secondary,
}

impl Level {
    /// Every level in the order the pipeline runs them.
    pub const ALL: [Level; 2] = [Level::Initial, Level::Secondary];
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Initial => write!(f, "initial"),
            Level::Secondary => write!(f, "secondary"),
        }
    }
}

/// Scores one aspect of a pair: `a` from the old program, `b` from the new one.
pub type FeatureFn<T> = fn(&MatchContext<'_>, T, T) -> f64;

/// A named, weighted feature.
#[derive(Clone, Copy)]
pub struct Feature<T> {
    /// Short identifier used in logs
    pub name: &'static str,
    /// Contribution of a perfect score
    pub weight: u32,
    /// First level the feature runs at
    pub level: Level,
    /// The scoring function
    pub score: FeatureFn<T>,
}

impl<T> Feature<T> {
    /// An [`Level::Initial`] feature.
    pub const fn initial(name: &'static str, weight: u32, score: FeatureFn<T>) -> Self {
        Feature {
            name,
            weight,
            level: Level::Initial,
            score,
        }
    }

    /// A [`Level::Secondary`] feature.
    pub const fn secondary(name: &'static str, weight: u32, score: FeatureFn<T>) -> Self {
        Feature {
            name,
            weight,
            level: Level::Secondary,
            score,
        }
    }
}

impl<T> fmt::Debug for Feature<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// The feature table of one entity kind.
#[derive(Debug, Clone)]
pub struct Classifier<T> {
    features: Vec<Feature<T>>,
}

impl<T: Copy> Classifier<T> {
    /// A classifier over `features`, evaluated in order.
    #[must_use]
    pub fn new(features: Vec<Feature<T>>) -> Self {
        Classifier { features }
    }

    /// All features, whatever their level.
    #[must_use]
    pub fn features(&self) -> &[Feature<T>] {
        &self.features
    }

    /// Features enabled at `level`.
    pub fn active(&self, level: Level) -> impl Iterator<Item = &Feature<T>> {
        self.features.iter().filter(move |f| f.level <= level)
    }

    /// Sum of the weights enabled at `level`.
    #[must_use]
    pub fn total_weight(&self, level: Level) -> u32 {
        self.active(level).map(|f| f.weight).sum()
    }

    /// Weighted sum of the features enabled at `level`.
    pub fn score(&self, ctx: &MatchContext<'_>, level: Level, a: T, b: T) -> f64 {
        self.active(level)
            .map(|f| (f.score)(ctx, a, b) * f64::from(f.weight))
            .sum()
    }

    /// Confidence in `0..=100` for the pair at `level`.
    pub fn weight(&self, ctx: &MatchContext<'_>, level: Level, a: T, b: T) -> u32 {
        to_confidence(self.score(ctx, level, a, b), self.total_weight(level))
    }
}

/// Scale a raw score against the maximum reachable one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_confidence(raw: f64, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (raw / f64::from(total) * 100.0).round().clamp(0.0, 100.0) as u32
}

/// The classifier registry, built once and passed to every phase.
#[derive(Debug, Clone)]
pub struct Classifiers {
    /// Class features
    pub classes: Classifier<ClassId>,
    /// Static method features
    pub static_methods: Classifier<MethodId>,
    /// Instance method features
    pub instance_methods: Classifier<MethodId>,
    /// Field features
    pub fields: Classifier<FieldId>,
}

impl Classifiers {
    /// The standard feature tables.
    #[must_use]
    pub fn new() -> Self {
        Classifiers {
            classes: class::classifier(),
            static_methods: method::static_classifier(),
            instance_methods: method::instance_classifier(),
            fields: field::classifier(),
        }
    }
}

impl Default for Classifiers {
    fn default() -> Self {
        Self::new()
    }
}

/// 1 for `true`, 0 for `false`.
pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// `1 - popcount(a ^ b) / bits` over the bits of `mask`.
pub(crate) fn compare_flags(a: u32, b: u32, mask: u32) -> f64 {
    let bits = mask.count_ones();
    if bits == 0 {
        return 1.0;
    }
    1.0 - f64::from(((a ^ b) & mask).count_ones()) / f64::from(bits)
}
