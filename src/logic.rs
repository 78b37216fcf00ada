use std::ops::Index;

use itertools::Itertools;
use varisat::{Lit, Var};

pub(crate) fn exactly_one(lits: &[Lit]) -> Vec<Vec<Lit>> {
    let mut clauses = Vec::with_capacity(lits.len() * (lits.len() + 1) / 2 + 1);

    // no two are true; (!A + !B) * (!A + !C) * ...
    clauses.extend(lits.iter()
        .combinations(2)
        .map(|pair| vec![!**pair.index(0), !**pair.index(1)])
    );
    // at least one is true; A + B + C + ...
    clauses.push(lits.to_vec());

    clauses
}

/// Clauses stating that at most `k` of `lits` are true.
///
/// Uses the sequential counter of Sinz (2005), allocating `(n - 1) * k` auxiliary variables through `fresh`,
/// except in the cases expressible without any.
pub(crate) fn at_most(lits: &[Lit], k: usize, fresh: &mut impl FnMut() -> Var) -> Vec<Vec<Lit>> {
    let n = lits.len();

    if k >= n {
        return Vec::new();
    }
    if k == 0 {
        return lits.iter().map(|lit| vec![!*lit]).collect_vec();
    }
    if k == n - 1 {
        // not all of them; !A + !B + !C + ...
        return vec![lits.iter().map(|lit| !*lit).collect_vec()];
    }

    // counter[i][j] holds when at least j + 1 of the first i + 1 literals are true
    let counter = (0..n - 1)
        .map(|_| (0..k).map(|_| fresh()).collect_vec())
        .collect_vec();

    let mut clauses = Vec::with_capacity(2 * n * k + n);

    clauses.push(vec![!lits[0], counter[0][0].positive()]);
    clauses.extend((1..k).map(|j| vec![counter[0][j].negative()]));

    for i in 1..n - 1 {
        clauses.push(vec![!lits[i], counter[i][0].positive()]);
        clauses.push(vec![counter[i - 1][0].negative(), counter[i][0].positive()]);
        for j in 1..k {
            clauses.push(vec![!lits[i], counter[i - 1][j - 1].negative(), counter[i][j].positive()]);
            clauses.push(vec![counter[i - 1][j].negative(), counter[i][j].positive()]);
        }
        // overflow
        clauses.push(vec![!lits[i], counter[i - 1][k - 1].negative()]);
    }

    clauses.push(vec![!lits[n - 1], counter[n - 2][k - 1].negative()]);

    clauses
}

/// Clauses stating that at least `k` of `lits` are true, i.e. at most `n - k` are false.
pub(crate) fn at_least(lits: &[Lit], k: usize, fresh: &mut impl FnMut() -> Var) -> Vec<Vec<Lit>> {
    if k > lits.len() {
        return contradiction(fresh);
    }

    let negated = lits.iter().map(|lit| !*lit).collect_vec();
    at_most(&negated, lits.len() - k, fresh)
}

/// An unsatisfiable pair of unit clauses over a fresh variable.
pub(crate) fn contradiction(fresh: &mut impl FnMut() -> Var) -> Vec<Vec<Lit>> {
    let var = fresh();
    vec![vec![var.positive()], vec![var.negative()]]
}
