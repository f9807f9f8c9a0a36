// ABOUTME: Disambiguation between successful matches:
// ABOUTME: a lexicographic comparator over `(inheritanceCosts, intCosts, -|inferred|)`.

use std::cmp::Ordering;

/// Outcome of comparing two successful matches' cost vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    FirstWins,
    SecondWins,
    NobodyWins,
}

/// The three components `cmpMatches` orders on: accumulated inheritance-walk depth,
/// accumulated implicit-widening count, and the number of inferred type variables
/// (more inferred type variables is a *worse* — i.e. less specific — match, hence the
/// negation in the glossary's `-|inferred|`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostVector {
    pub inheritance_costs: i32,
    pub int_costs: i32,
    pub inferred_count: usize,
}

impl CostVector {
    fn key(&self) -> (i32, i32, i32) {
        (self.inheritance_costs, self.int_costs, -(self.inferred_count as i32))
    }
}

/// Compare two cost vectors lexicographically. `cmp_matches(a, a) = NobodyWins`.
pub fn cmp_matches(a: &CostVector, b: &CostVector) -> Comparison {
    match a.key().cmp(&b.key()) {
        Ordering::Less => Comparison::FirstWins,
        Ordering::Greater => Comparison::SecondWins,
        Ordering::Equal => Comparison::NobodyWins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_int_cost_wins_when_inheritance_ties() {
        let a = CostVector { inheritance_costs: 0, int_costs: 0, inferred_count: 0 };
        let b = CostVector { inheritance_costs: 0, int_costs: 1, inferred_count: 0 };
        assert_eq!(cmp_matches(&a, &b), Comparison::FirstWins);
    }

    #[test]
    fn zero_inheritance_cost_beats_nonzero() {
        let derived = CostVector { inheritance_costs: 0, int_costs: 0, inferred_count: 0 };
        let base = CostVector { inheritance_costs: 3, int_costs: 0, inferred_count: 0 };
        assert_eq!(cmp_matches(&derived, &base), Comparison::FirstWins);
    }

    #[test]
    fn identical_vectors_yield_nobody_wins() {
        let a = CostVector { inheritance_costs: 1, int_costs: 1, inferred_count: 1 };
        assert_eq!(cmp_matches(&a, &a), Comparison::NobodyWins);
    }
}
