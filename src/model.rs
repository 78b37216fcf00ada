use std::fmt::{Display, Formatter};

use itertools::Itertools;
use ndarray::Array2;
use strum::VariantArray;
use varisat::{Lit, Var};

use crate::cell::Shade;
use crate::grid::Grid;
use crate::location::Location;
use crate::logic::{at_least, at_most, exactly_one};

/// The binary decision variables of a board: one indicator per (cell, shade).
///
/// Rows are cells in row-major order, columns are [`Shade`]s.
#[derive(Clone, Debug)]
pub struct ShadeVars {
    grid: Grid,
    vars: Array2<Var>,
}

impl ShadeVars {
    /// Allocate indicators `0..2 * area` for every cell of `grid`.
    pub fn new(grid: Grid) -> Self {
        let columns = Shade::VARIANTS.len();
        let vars = Array2::from_shape_fn((grid.area(), columns), |(cell, shade)| Var::from_index(cell * columns + shade));

        Self { grid, vars }
    }

    /// The grid the table covers.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Number of variables in the table; auxiliary variables are allocated after these.
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// The indicator of `location` taking `shade`.
    #[inline]
    pub fn var(&self, location: Location, shade: Shade) -> Var {
        self.vars[[location.row_major(self.grid.size()), shade.index()]]
    }

    /// Literal true when `location` is black.
    #[inline]
    pub fn black(&self, location: Location) -> Lit {
        self.var(location, Shade::Black).positive()
    }

    /// Literal true when `location` is white.
    #[inline]
    pub fn white(&self, location: Location) -> Lit {
        self.var(location, Shade::White).positive()
    }
}

/// How the sum of a [`LinearConstraint`] relates to its bound.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    /// `sum <= bound`
    AtMost,
    /// `sum >= bound`
    AtLeast,
    /// `sum == bound`
    Exactly,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Relation::AtMost => "<=",
            Relation::AtLeast => ">=",
            Relation::Exactly => "==",
        })
    }
}

/// A linear constraint over 0/1 literals with unit coefficients: `sum(terms) <relation> bound`.
///
/// An optional guard makes it an indicator constraint which binds only when the guard literal is true.
/// This is the same thing as the big-M form `sum(terms) <= M * (1 - x)` with `M` large enough to switch the constraint off.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinearConstraint {
    terms: Vec<Lit>,
    relation: Relation,
    bound: usize,
    guard: Option<Lit>,
}

impl LinearConstraint {
    /// An unguarded constraint `sum(terms) <relation> bound`.
    pub fn new(terms: Vec<Lit>, relation: Relation, bound: usize) -> Self {
        Self { terms, relation, bound, guard: None }
    }

    /// `sum(terms) <= bound`
    pub fn at_most(terms: Vec<Lit>, bound: usize) -> Self {
        Self::new(terms, Relation::AtMost, bound)
    }

    /// `sum(terms) >= bound`
    pub fn at_least(terms: Vec<Lit>, bound: usize) -> Self {
        Self::new(terms, Relation::AtLeast, bound)
    }

    /// `sum(terms) == bound`
    pub fn exactly(terms: Vec<Lit>, bound: usize) -> Self {
        Self::new(terms, Relation::Exactly, bound)
    }

    /// Only enforce this constraint when `guard` is true.
    pub fn only_if(mut self, guard: Lit) -> Self {
        self.guard = Some(guard);
        self
    }

    /// The summed literals.
    pub fn terms(&self) -> &[Lit] {
        &self.terms
    }

    /// How the sum compares to [`Self::bound`].
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// The literal which switches this constraint on, if any.
    pub fn guard(&self) -> Option<Lit> {
        self.guard
    }

    /// Evaluate against a complete assignment, `value(var)` giving each variable's truth.
    pub fn is_satisfied_by(&self, value: impl Fn(Var) -> bool) -> bool {
        let holds = |lit: &Lit| value(lit.var()) == lit.is_positive();

        if let Some(guard) = self.guard {
            if !holds(&guard) {
                return true;
            }
        }

        let sum = self.terms.iter().filter(|lit| holds(lit)).count();
        match self.relation {
            Relation::AtMost => sum <= self.bound,
            Relation::AtLeast => sum >= self.bound,
            Relation::Exactly => sum == self.bound,
        }
    }

    /// Translate into CNF, allocating any auxiliary variables through `fresh`.
    pub(crate) fn to_clauses(&self, fresh: &mut impl FnMut() -> Var) -> Vec<Vec<Lit>> {
        let mut clauses = match self.relation {
            Relation::AtMost => at_most(&self.terms, self.bound, fresh),
            Relation::AtLeast => at_least(&self.terms, self.bound, fresh),
            Relation::Exactly if self.bound == 1 && (1..=4).contains(&self.terms.len()) => exactly_one(&self.terms),
            Relation::Exactly => {
                let mut both = at_most(&self.terms, self.bound, fresh);
                both.extend(at_least(&self.terms, self.bound, fresh));
                both
            }
        };

        if let Some(guard) = self.guard {
            // guard => clause, i.e. !guard + clause
            clauses.iter_mut().for_each(|clause| clause.push(!guard));
        }

        clauses
    }
}

impl Display for LinearConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(guard) = self.guard {
            write!(f, "{:?} => ", guard)?;
        }
        write!(f, "sum({}) {} {}", self.terms.iter().map(|lit| format!("{:?}", lit)).join(" + "), self.relation, self.bound)
    }
}
