//! Laws of the similarity primitives and the resolution steps.

#[allow(dead_code)]
#[path = "../src/test/builder.rs"]
mod builder;

use std::collections::BTreeSet;

use builder::{ClassBuilder, Op};
use proptest::prelude::*;
use remapper::{
    engine::{max_weight_matching, Edge, NodeMappings},
    program::{EntityRef, Program},
    similarity::{compare_counts, compare_lists, compare_sets},
};

const METHODS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

fn methods_program(class: &str) -> Program {
    let mut builder = ClassBuilder::new(class);
    for (i, name) in METHODS.into_iter().enumerate() {
        builder = builder.method(0x0009, name, "()V", |m| {
            m.code(&[Op::Iconst(i as i32), Op::Pop, Op::Return])
        });
    }
    Program::from_classes([builder.build()], &[]).unwrap()
}

fn method_ref(program: &Program, index: usize) -> EntityRef {
    EntityRef::from(program.methods()[index].id)
}

fn votes() -> impl Strategy<Value = Vec<(usize, usize, u32)>> {
    prop::collection::vec((0..METHODS.len(), 0..METHODS.len(), 0u32..=100), 0..24)
}

fn table(old: &Program, new: &Program, votes: &[(usize, usize, u32)]) -> NodeMappings {
    let mut mappings = NodeMappings::new();
    for &(from, to, weight) in votes {
        mappings
            .map(method_ref(old, from), method_ref(new, to))
            .raise_weight(weight);
    }
    mappings
}

/// Best total over every one-to-one subset of `edges`.
fn brute_force(edges: &[Edge], used_rows: &mut Vec<usize>, used_cols: &mut Vec<usize>, start: usize) -> f64 {
    let mut best = 0.0f64;
    for i in start..edges.len() {
        let edge = edges[i];
        if used_rows.contains(&edge.row) || used_cols.contains(&edge.col) {
            continue;
        }
        used_rows.push(edge.row);
        used_cols.push(edge.col);
        best = best.max(edge.weight + brute_force(edges, used_rows, used_cols, i + 1));
        used_rows.pop();
        used_cols.pop();
    }
    best
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counts_are_bounded_and_symmetric(a in 0usize..1000, b in 0usize..1000) {
        let score = compare_counts(a, b);
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(score, compare_counts(b, a));
        prop_assert_eq!(compare_counts(a, a), 1.0);
    }

    #[test]
    fn sets_are_bounded_and_symmetric(
        a in prop::collection::btree_set(0u8..16, 0..10),
        b in prop::collection::btree_set(0u8..16, 0..10),
    ) {
        let score = compare_sets(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(score, compare_sets(&b, &a));
        prop_assert_eq!(compare_sets(&a, &a), 1.0);
        if a.is_disjoint(&b) && !(a.is_empty() && b.is_empty()) {
            prop_assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn lists_are_bounded_and_symmetric(
        a in prop::collection::vec(0u8..4, 0..12),
        b in prop::collection::vec(0u8..4, 0..12),
    ) {
        let cost = |x: &u8, y: &u8| if x == y { 0 } else { 2 };
        let score = compare_lists(&a, &b, cost);
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert!((score - compare_lists(&b, &a, cost)).abs() < 1e-12);
        prop_assert_eq!(compare_lists(&a, &a, cost), 1.0);
    }

    #[test]
    fn merge_adds_scores_and_keeps_weights(left in votes(), right in votes()) {
        let old = methods_program("ab");
        let new = methods_program("cd");
        let a = table(&old, &new, &left);
        let b = table(&old, &new, &right);
        let mut merged = a.clone();
        merged.merge(&b);

        for mapping in merged.iter() {
            let before = [a.get(mapping.from, mapping.to), b.get(mapping.from, mapping.to)];
            let score: u32 = before.iter().flatten().map(|m| m.score).sum();
            let weight = before.iter().flatten().map(|m| m.weight).max().unwrap_or(0);
            prop_assert_eq!(mapping.score, score);
            prop_assert_eq!(mapping.weight, weight);
        }
        for mapping in a.iter().chain(b.iter()) {
            prop_assert!(merged.get(mapping.from, mapping.to).is_some());
        }
    }

    #[test]
    fn reduce_is_injective_and_keeps_the_strongest(votes in votes()) {
        let old = methods_program("ab");
        let new = methods_program("cd");
        let mut mappings = table(&old, &new, &votes);
        let strongest = mappings.iter().map(|m| (m.score, m.weight)).max();
        let before = mappings.clone();
        mappings.reduce(&old, &new);

        let mut from = BTreeSet::new();
        let mut to = BTreeSet::new();
        for mapping in mappings.iter() {
            prop_assert!(from.insert(mapping.from));
            prop_assert!(to.insert(mapping.to));
            prop_assert_eq!(before.get(mapping.from, mapping.to), Some(mapping));
        }
        prop_assert_eq!(mappings.iter().map(|m| (m.score, m.weight)).max(), strongest);

        // a second pass changes nothing
        let once = mappings.clone();
        mappings.reduce(&old, &new);
        prop_assert_eq!(mappings, once);
    }

    #[test]
    fn assignment_is_optimal(
        weights in prop::collection::vec((0usize..4, 0usize..4, 1u32..100), 0..12),
    ) {
        let edges: Vec<Edge> = weights
            .iter()
            .map(|&(row, col, weight)| Edge { row, col, weight: f64::from(weight) })
            .collect();
        let chosen = max_weight_matching(4, 4, &edges);

        let mut rows = BTreeSet::new();
        let mut cols = BTreeSet::new();
        for &i in &chosen {
            prop_assert!(rows.insert(edges[i].row));
            prop_assert!(cols.insert(edges[i].col));
        }
        let total: f64 = chosen.iter().map(|&i| edges[i].weight).sum();
        let best = brute_force(&edges, &mut Vec::new(), &mut Vec::new(), 0);
        prop_assert!((total - best).abs() < 1e-9, "got {total}, best {best}");
    }
}
