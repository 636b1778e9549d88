//! One scoring round: compatible pairs, classifier scores, optimal assignment.

use rayon::prelude::*;

use crate::{
    classifier::{to_confidence, Classifier, Level},
    engine::assign::{max_weight_matching, Edge},
    similarity::MatchContext,
};

/// A pair accepted by one [`rank`] round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMatch<T> {
    /// Entity of the old program
    pub from: T,
    /// Entity of the new program
    pub to: T,
    /// Raw weighted feature sum
    pub score: f64,
    /// Score scaled to `0..=100`
    pub weight: u32,
}

/// Options of a [`rank`] round.
#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    /// Scores closer than this are a tie
    pub tie_epsilon: f64,
    /// Score candidate pairs on the rayon pool
    pub parallel: bool,
}

impl Default for RankOptions {
    fn default() -> Self {
        RankOptions {
            tie_epsilon: 1e-6,
            parallel: true,
        }
    }
}

/// Score every compatible pair of `from` x `to` at `level` and return an optimal one-to-one
/// selection.
///
/// Pairs rejected by `compatible` are never scored and never returned. An assigned pair is
/// dropped when another candidate of the same old entity, or another claimant of the same new
/// entity, scores within `tie_epsilon` of it: such ties are left for a later round with more
/// context. Results are ordered by the position of `from`.
pub fn rank<T, F>(
    ctx: &MatchContext<'_>,
    classifier: &Classifier<T>,
    level: Level,
    from: &[T],
    to: &[T],
    compatible: F,
    options: RankOptions,
) -> Vec<RankedMatch<T>>
where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> bool + Sync,
{
    let score_row = |(row, &a): (usize, &T)| -> Vec<Edge> {
        to.iter()
            .enumerate()
            .filter(|&(_, &b)| compatible(a, b))
            .map(|(col, &b)| Edge {
                row,
                col,
                weight: classifier.score(ctx, level, a, b),
            })
            .collect()
    };
    let rows: Vec<Vec<Edge>> = if options.parallel {
        from.par_iter().enumerate().map(score_row).collect()
    } else {
        from.iter().enumerate().map(score_row).collect()
    };
    let edges: Vec<Edge> = rows.into_iter().flatten().collect();

    let total = classifier.total_weight(level);
    let matched: Vec<RankedMatch<T>> = max_weight_matching(from.len(), to.len(), &edges)
        .into_iter()
        .map(|i| &edges[i])
        .filter(|chosen| !is_tied(&edges, chosen, options.tie_epsilon))
        .map(|chosen| RankedMatch {
            from: from[chosen.row],
            to: to[chosen.col],
            score: chosen.weight,
            weight: to_confidence(chosen.weight, total),
        })
        .collect();

    log::debug!(
        "{} round: {} candidate pairs, {} accepted",
        level,
        edges.len(),
        matched.len()
    );
    matched
}

fn is_tied(edges: &[Edge], chosen: &Edge, epsilon: f64) -> bool {
    edges.iter().any(|other| {
        let rival = (other.row == chosen.row) != (other.col == chosen.col);
        rival && (other.weight - chosen.weight).abs() <= epsilon
    })
}
