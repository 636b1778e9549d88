//! Edit distance over sequences and position similarity.

use crate::{
    program::{BodyInsn, BodyOperand, MethodId},
    similarity::MatchContext,
};

/// Cost of replacing, inserting or deleting one element.
const MISMATCH: u32 = 2;

/// Similarity of two sequences from their Levenshtein distance.
///
/// `cost(x, y)` must return 0 for equivalent elements and 2 otherwise; insertions and deletions
/// cost 2. The result is `1 - distance / (2 * max(len))`: 1 for two empty sequences and 0 when
/// exactly one is empty.
pub fn compare_lists<T>(a: &[T], b: &[T], cost: impl Fn(&T, &T) -> u32) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }
    if a.len() == b.len() && a.iter().zip(b).all(|(x, y)| cost(x, y) == 0) {
        return 1.0;
    }

    let distance = levenshtein(a, b, &cost);
    let max = a.len().max(b.len()) as f64;
    (1.0 - f64::from(distance) / (f64::from(MISMATCH) * max)).clamp(0.0, 1.0)
}

fn levenshtein<T>(a: &[T], b: &[T], cost: &impl Fn(&T, &T) -> u32) -> u32 {
    // two rows over b
    let mut prev: Vec<u32> = (0..=b.len()).map(|j| to_u32(j) * MISMATCH).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        curr[0] = to_u32(i + 1) * MISMATCH;
        for (j, y) in b.iter().enumerate() {
            let substitute = prev[j] + cost(x, y);
            let delete = prev[j + 1] + MISMATCH;
            let insert = curr[j] + MISMATCH;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX / 4)
}

/// Instruction similarity of two method bodies, `a` from the old program and `b` from the new.
pub fn compare_instructions(ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
    compare_lists(&ctx.old.method(a).body, &ctx.new.method(b).body, |x, y| {
        instruction_cost(ctx, x, y)
    })
}

fn instruction_cost(ctx: &MatchContext<'_>, a: &BodyInsn, b: &BodyInsn) -> u32 {
    if a.opcode != b.opcode {
        return MISMATCH;
    }
    let equivalent = match (a.operand, b.operand) {
        (BodyOperand::Int(x), BodyOperand::Int(y)) => x == y,
        (BodyOperand::Var(x), BodyOperand::Var(y)) => x == y,
        (BodyOperand::Class(x), BodyOperand::Class(y)) => {
            resolved(x, y, |x, y| ctx.classes_compatible(x, y))
        }
        (BodyOperand::Field(x), BodyOperand::Field(y)) => {
            resolved(x, y, |x, y| ctx.fields_compatible(x, y))
        }
        (BodyOperand::Method(x), BodyOperand::Method(y)) => {
            resolved(x, y, |x, y| ctx.methods_compatible(x, y))
        }
        _ => true,
    };
    if equivalent {
        0
    } else {
        MISMATCH
    }
}

/// Both unresolved is equivalent, one unresolved is not.
fn resolved<T>(a: Option<T>, b: Option<T>, compatible: impl Fn(T, T) -> bool) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => compatible(x, y),
        _ => false,
    }
}

/// Similarity of two positions within their sibling lists of `a_siblings` and `b_siblings`.
///
/// Equal positions in equally long lists score 1. When a position is missing the result is 1
/// if both are missing and 0 otherwise. Else the relative positions `p / (n - 1)` are compared,
/// with a single sibling sitting at 0.5.
#[must_use]
pub fn compare_positions(
    a: Option<usize>,
    a_siblings: usize,
    b: Option<usize>,
    b_siblings: usize,
) -> f64 {
    let (a, b) = match (a, b) {
        (None, None) => return 1.0,
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    if a == b && a_siblings == b_siblings {
        return 1.0;
    }

    let relative = |pos: usize, siblings: usize| {
        if siblings <= 1 {
            0.5
        } else {
            pos as f64 / (siblings - 1) as f64
        }
    };
    (1.0 - (relative(a, a_siblings) - relative(b, b_siblings)).abs()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(a: &char, b: &char) -> u32 {
        if a == b {
            0
        } else {
            2
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn list_edges() {
        assert_eq!(compare_lists(&chars(""), &chars(""), exact), 1.0);
        assert_eq!(compare_lists(&chars("a"), &chars(""), exact), 0.0);
        assert_eq!(compare_lists(&chars("abc"), &chars("abc"), exact), 1.0);
        assert_eq!(compare_lists(&chars("abc"), &chars("xyz"), exact), 0.0);
    }

    #[test]
    fn list_distance() {
        // one substitution: distance 2 over 2 * 4
        assert_eq!(compare_lists(&chars("abcd"), &chars("abxd"), exact), 0.75);
        // one insertion: distance 2 over 2 * 4
        assert_eq!(compare_lists(&chars("abc"), &chars("abcd"), exact), 0.75);
        // kitten/sitting: three edits over 2 * 7
        let score = compare_lists(&chars("kitten"), &chars("sitting"), exact);
        assert!((score - (1.0 - 6.0 / 14.0)).abs() < 1e-12);
    }

    #[test]
    fn list_symmetry() {
        let a = chars("abcabba");
        let b = chars("cbabac");
        assert_eq!(compare_lists(&a, &b, exact), compare_lists(&b, &a, exact));
    }

    #[test]
    fn positions() {
        assert_eq!(compare_positions(None, 0, None, 3), 1.0);
        assert_eq!(compare_positions(Some(0), 1, None, 3), 0.0);
        assert_eq!(compare_positions(Some(2), 5, Some(2), 5), 1.0);
        assert_eq!(compare_positions(Some(0), 1, Some(1), 3), 1.0);
        assert_eq!(compare_positions(Some(0), 5, Some(4), 5), 0.0);
        assert_eq!(compare_positions(Some(1), 3, Some(2), 5), 1.0);
        assert_eq!(compare_positions(Some(0), 3, Some(1), 3), 0.5);
    }
}
