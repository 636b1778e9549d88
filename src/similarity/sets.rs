//! Count, set and range similarity.

use std::collections::BTreeSet;

/// Similarity of two counts: `1 - |a - b| / max(a, b)`, and 1 when both are equal.
#[must_use]
pub fn compare_counts(a: usize, b: usize) -> f64 {
    if a == b {
        return 1.0;
    }
    1.0 - a.abs_diff(b) as f64 / a.max(b) as f64
}

/// Shared elements over distinct elements of both sets; 1 when both are empty.
#[must_use]
pub fn compare_sets<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let matched = a.intersection(b).count();
    let total = a.len() + b.len() - matched;
    if total == 0 {
        1.0
    } else {
        matched as f64 / total as f64
    }
}

/// Overlap of two inclusive line ranges, counted in lines, over their combined extent.
///
/// Two absent ranges compare as equal; one absent range compares as disjoint.
#[must_use]
pub fn compare_ranges(a: Option<(u16, u16)>, b: Option<(u16, u16)>) -> f64 {
    match (a, b) {
        (None, None) => 1.0,
        (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => {
            let len = |lo: u16, hi: u16| f64::from(hi.saturating_sub(lo)) + 1.0;
            let overlap = if a_lo.max(b_lo) <= a_hi.min(b_hi) {
                len(a_lo.max(b_lo), a_hi.min(b_hi))
            } else {
                0.0
            };
            overlap / (len(a_lo, a_hi) + len(b_lo, b_hi) - overlap)
        }
        _ => 0.0,
    }
}

/// Similarity of two sets of entities that may already carry confirmed matches.
///
/// Elements are first paired off exactly: identical elements when `same_space` says both
/// sets draw from one id space, and elements of `a` whose confirmed match (`match_of`) lies
/// in `b`. An element of `a` whose match is elsewhere counts as a miss. Every element left on
/// either side that has no `compatible` partner on the other side counts as another miss.
/// The result is `(total - misses) / total` with `total = |a| + |b|`; 1 when both sets are
/// empty and 0 when exactly one is.
pub fn compare_node_sets<T, A, B>(
    a: A,
    b: B,
    same_space: bool,
    match_of: impl Fn(T) -> Option<T>,
    compatible: impl Fn(T, T) -> bool,
) -> f64
where
    T: Copy + PartialEq,
    A: IntoIterator<Item = T>,
    B: IntoIterator<Item = T>,
{
    let mut set_a = distinct(a);
    let mut set_b = distinct(b);
    if set_a.is_empty() || set_b.is_empty() {
        return if set_a.is_empty() && set_b.is_empty() {
            1.0
        } else {
            0.0
        };
    }

    let total = set_a.len() + set_b.len();
    let mut misses = 0;

    set_a.retain(|&node| {
        if same_space {
            if let Some(pos) = set_b.iter().position(|&other| other == node) {
                set_b.swap_remove(pos);
                return false;
            }
        }
        match match_of(node) {
            Some(counterpart) => {
                match set_b.iter().position(|&other| other == counterpart) {
                    Some(pos) => {
                        set_b.swap_remove(pos);
                    }
                    None => misses += 1,
                }
                false
            }
            None => true,
        }
    });

    set_a.retain(|&node| {
        let found = set_b.iter().any(|&other| compatible(node, other));
        if !found {
            misses += 1;
        }
        found
    });

    for &node in &set_b {
        if !set_a.iter().any(|&other| compatible(other, node)) {
            misses += 1;
        }
    }

    (total - misses) as f64 / total as f64
}

fn distinct<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
