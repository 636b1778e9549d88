//! Configuration for the mapping pipeline.

use crate::engine::RankOptions;

/// Configuration for [`crate::pipeline::Mapper`].
///
/// Controls which classes take part in matching, how long each classifier level may iterate,
/// when two scores count as a tie, and whether scoring runs in parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    /// Classes whose name contains any of these patterns are ignored
    /// (default: `bouncycastle`, `json`).
    pub ignore_patterns: Vec<String>,

    /// Maximum rounds per classifier level before moving on (default: 64).
    ///
    /// A level normally stops earlier, as soon as a round accepts no new match.
    pub max_rounds_per_level: usize,

    /// Scores closer than this are a tie and produce no match (default: 1e-6).
    pub tie_epsilon: f64,

    /// Propagate matches to neighboring entities (default: true).
    pub propagate: bool,

    /// Score candidates on the rayon thread pool (default: true).
    ///
    /// Sequential scoring gives the same result.
    pub parallel: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: vec!["bouncycastle".to_string(), "json".to_string()],
            max_rounds_per_level: 64,
            tie_epsilon: 1e-6,
            propagate: true,
            parallel: true,
        }
    }
}

impl MapperConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ignore patterns.
    ///
    /// # Arguments
    ///
    /// * `patterns` - Substrings of class names to exclude from matching.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the round limit per classifier level.
    ///
    /// # Arguments
    ///
    /// * `max` - The maximum number of rounds.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_max_rounds_per_level(mut self, max: usize) -> Self {
        self.max_rounds_per_level = max;
        self
    }

    /// Sets the tie tolerance.
    #[must_use]
    pub fn with_tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = epsilon;
        self
    }

    /// Enables or disables reference propagation.
    #[must_use]
    pub fn with_propagation(mut self, enable: bool) -> Self {
        self.propagate = enable;
        self
    }

    /// Enables or disables parallel scoring.
    #[must_use]
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    pub(crate) fn rank_options(&self) -> RankOptions {
        RankOptions {
            tie_epsilon: self.tie_epsilon,
            parallel: self.parallel,
        }
    }
}
