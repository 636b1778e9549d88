//! Maximum-weight bipartite matching.
//!
//! The candidate graph of one round is split into connected components, and each component
//! is solved exactly with the Hungarian method on a dense cost matrix. Pairs that are not
//! edges of the graph are present in the matrix with zero gain and are dropped from the
//! result, so a vertex without an acceptable counterpart stays unmatched.

use std::collections::BTreeMap;

/// A weighted edge between `row` (left vertex) and `col` (right vertex).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Left vertex
    pub row: usize,
    /// Right vertex
    pub col: usize,
    /// Gain of matching the two, expected to be non-negative
    pub weight: f64,
}

/// Indices into `edges` of a matching with maximum total weight.
///
/// Every row and every column appears in at most one chosen edge. When an edge is given twice
/// the heavier copy is used. The result is sorted and deterministic for a given input.
///
/// # Examples
///
/// ```rust
/// use remapper::engine::{max_weight_matching, Edge};
///
/// let edges = [
///     Edge { row: 0, col: 0, weight: 10.0 },
///     Edge { row: 0, col: 1, weight: 9.0 },
///     Edge { row: 1, col: 0, weight: 9.5 },
/// ];
/// // 0-1 and 1-0 beat the greedy choice of 0-0
/// assert_eq!(max_weight_matching(2, 2, &edges), vec![1, 2]);
/// ```
#[must_use]
pub fn max_weight_matching(rows: usize, cols: usize, edges: &[Edge]) -> Vec<usize> {
    let mut components = DisjointSets::new(rows + cols);
    for edge in edges {
        if edge.row < rows && edge.col < cols {
            components.union(edge.row, rows + edge.col);
        }
    }

    // heaviest edge per pair, grouped by component root
    let mut grouped: BTreeMap<usize, BTreeMap<(usize, usize), usize>> = BTreeMap::new();
    for (index, edge) in edges.iter().enumerate() {
        if edge.row >= rows || edge.col >= cols || !edge.weight.is_finite() {
            continue;
        }
        let root = components.find(edge.row);
        let slot = grouped
            .entry(root)
            .or_default()
            .entry((edge.row, edge.col))
            .or_insert(index);
        if edges[*slot].weight < edge.weight {
            *slot = index;
        }
    }

    let mut chosen = Vec::new();
    for pairs in grouped.values() {
        solve_component(pairs, edges, &mut chosen);
    }
    chosen.sort_unstable();
    chosen
}

fn solve_component(
    pairs: &BTreeMap<(usize, usize), usize>,
    edges: &[Edge],
    chosen: &mut Vec<usize>,
) {
    let mut row_ids: Vec<usize> = pairs.keys().map(|&(r, _)| r).collect();
    let mut col_ids: Vec<usize> = pairs.keys().map(|&(_, c)| c).collect();
    row_ids.dedup();
    col_ids.sort_unstable();
    col_ids.dedup();

    if pairs.len() == 1 {
        chosen.extend(pairs.values().copied());
        return;
    }

    let local_row: BTreeMap<usize, usize> = row_ids.iter().enumerate().map(|(i, &r)| (r, i)).collect();
    let local_col: BTreeMap<usize, usize> = col_ids.iter().enumerate().map(|(i, &c)| (c, i)).collect();

    // the solver needs no more rows than columns
    let transposed = row_ids.len() > col_ids.len();
    let (n, m) = if transposed {
        (col_ids.len(), row_ids.len())
    } else {
        (row_ids.len(), col_ids.len())
    };

    let mut cost = vec![vec![0.0; m]; n];
    let mut edge_at = vec![vec![None; m]; n];
    for (&(r, c), &index) in pairs {
        let (mut i, mut j) = (local_row[&r], local_col[&c]);
        if transposed {
            std::mem::swap(&mut i, &mut j);
        }
        cost[i][j] = -edges[index].weight;
        edge_at[i][j] = Some(index);
    }

    for (i, j) in hungarian(&cost, m).into_iter().enumerate() {
        if let Some(index) = edge_at[i][j] {
            chosen.push(index);
        }
    }
}

/// Minimum-cost assignment of every row of an `n x m` matrix (`n <= m`) to a distinct column.
///
/// Shortest augmenting paths with row and column potentials, O(n^2 m).
fn hungarian(cost: &[Vec<f64>], m: usize) -> Vec<usize> {
    let n = cost.len();
    // 1-based; column 0 is the virtual start
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        owner[0] = row;
        let mut col0 = 0;
        let mut min_to = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[col0] = true;
            let i0 = owner[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < min_to[j] {
                    min_to[j] = reduced;
                    way[j] = col0;
                }
                if min_to[j] < delta {
                    delta = min_to[j];
                    col1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_to[j] -= delta;
                }
            }
            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }
        loop {
            let col1 = way[col0];
            owner[col0] = owner[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for j in 1..=m {
        if owner[j] != 0 {
            assignment[owner[j] - 1] = j - 1;
        }
    }
    assignment
}

/// Union-find over vertex indices with path halving.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(size: usize) -> Self {
        DisjointSets {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // smaller root wins, keeping roots independent of edge order
            let (keep, merged) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merged] = keep;
        }
    }
}
