use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use ndarray::Array2;
use varisat::{CnfFormula, Lit, Solver, Var};

use crate::cell::Shade;
use crate::error::{HeyawakeError, Result};
use crate::location::Location;
use crate::model::{LinearConstraint, ShadeVars};

/// Cooperative cancellation shared between the search and whoever wants it stopped.
///
/// Cloning shares the flag. It is read afresh on every candidate.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Ask every holder of this flag to stop.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether anyone has raised the flag yet.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs for one solve.
#[derive(Clone, Debug, Default)]
pub struct SolveOptions {
    /// Give up once this much time has passed. Checked between candidates, since a single SAT call cannot be interrupted.
    pub time_limit: Option<Duration>,
}

/// How a search ended. Only a broken backend is an error; everything here is a normal outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolveStatus {
    /// A candidate was found and the handler had nothing left to cut.
    Optimal,
    /// No assignment satisfies the model together with the cuts added so far.
    Infeasible,
    /// [`SolveOptions::time_limit`] passed before a candidate was accepted.
    TimeLimit,
    /// The handler asked for termination, e.g. because the user stopped the solve.
    Stopped,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::TimeLimit => "time limit reached",
            SolveStatus::Stopped => "stopped by user",
        })
    }
}

/// What a [`CandidateHandler`] sees of one integer-feasible assignment, and how it answers.
pub struct CallbackContext<'a> {
    values: &'a [bool],
    lazy: Vec<LinearConstraint>,
    terminate: bool,
}

impl<'a> CallbackContext<'a> {
    pub(crate) fn new(values: &'a [bool]) -> Self {
        Self { values, lazy: Vec::new(), terminate: false }
    }

    /// Value of `var` in the current candidate.
    ///
    /// # Panics
    /// If `var` was never allocated by the solver.
    #[inline]
    pub fn value(&self, var: Var) -> bool {
        self.values[var.index()]
    }

    /// Register a constraint which stays in force for the rest of the search.
    pub fn add_lazy(&mut self, constraint: LinearConstraint) {
        self.lazy.push(constraint);
    }

    /// Ask the solver to stop once the handler returns.
    pub fn terminate(&mut self) {
        self.terminate = true;
    }

    /// Constraints registered so far by the handler.
    pub fn lazy_constraints(&self) -> &[LinearConstraint] {
        &self.lazy
    }

    /// Whether the handler asked to terminate.
    pub fn is_terminating(&self) -> bool {
        self.terminate
    }
}

/// Receives every new integer-feasible assignment before the search resumes.
pub trait CandidateHandler {
    /// Inspect the candidate in `context`; add lazy constraints to reject it, or add none to accept it.
    fn on_candidate(&mut self, context: &mut CallbackContext<'_>);
}

/// The result of [`LazySolver::search`].
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// How the search ended.
    pub status: SolveStatus,
    /// Wall-clock time spent in [`LazySolver::search`].
    pub elapsed: Duration,
    /// Values of every variable in the accepted candidate, present only when `status` is [`SolveStatus::Optimal`].
    pub values: Option<Vec<bool>>,
    /// Lazy constraints added by the handler.
    pub lazy_constraints: usize,
    /// Candidates handed to the handler.
    pub candidates: usize,
}

/// 0/1 solver with lazy constraints, on top of `varisat`'s incremental interface.
///
/// Every constraint is translated to CNF as it is added. A search repeatedly asks the SAT engine for a model, hands it to a
/// [`CandidateHandler`], and adds whatever constraints the handler returns; clauses are never removed, so a lazy constraint
/// holds for the remainder of the search.
pub struct LazySolver<'a> {
    solver: Solver<'a>,
    // decision variables are 0..num_vars, auxiliary ones follow
    num_vars: usize,
    next_var: usize,
}

impl<'a> LazySolver<'a> {
    /// A solver over binary variables `0..num_vars`.
    pub fn new(num_vars: usize) -> Self {
        Self {
            solver: Solver::new(),
            num_vars,
            next_var: num_vars,
        }
    }

    /// Translate `constraint` to CNF and add it for good.
    pub fn add_constraint(&mut self, constraint: &LinearConstraint) {
        let mut next_var = self.next_var;
        let clauses = constraint.to_clauses(&mut || {
            let var = Var::from_index(next_var);
            next_var += 1;
            var
        });
        self.next_var = next_var;

        self.solver.add_formula(&CnfFormula::from(clauses));
    }

    /// Total variables allocated so far, including auxiliary ones.
    pub fn allocated_vars(&self) -> usize {
        self.next_var
    }

    fn values_of(&self, model: &[Lit]) -> Vec<bool> {
        let mut values = vec![false; self.next_var];
        for lit in model {
            if let Some(value) = values.get_mut(lit.var().index()) {
                *value = lit.is_positive();
            }
        }
        values
    }

    /// Search until a candidate is accepted by `handler`, the model becomes infeasible, the time limit passes, or `handler`
    /// asks to terminate.
    pub fn search(&mut self, handler: &mut impl CandidateHandler, options: &SolveOptions) -> Result<SearchOutcome> {
        let start = Instant::now();
        let mut candidates = 0;
        let mut lazy_constraints = 0;

        let finish = |status: SolveStatus, values: Option<Vec<bool>>, candidates: usize, lazy_constraints: usize| SearchOutcome {
            status,
            elapsed: start.elapsed(),
            values,
            lazy_constraints,
            candidates,
        };

        loop {
            if options.time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                info!("time limit reached after {} candidates", candidates);
                return Ok(finish(SolveStatus::TimeLimit, None, candidates, lazy_constraints));
            }

            let satisfiable = self.solver.solve()
                .map_err(|e| HeyawakeError::Backend(format!("{:?}", e)))?;
            if !satisfiable {
                info!("model infeasible after {} candidates", candidates);
                return Ok(finish(SolveStatus::Infeasible, None, candidates, lazy_constraints));
            }

            let model = self.solver.model()
                .ok_or_else(|| HeyawakeError::Backend("satisfiable but no model available".to_string()))?;
            let values = self.values_of(&model);
            candidates += 1;

            let mut context = CallbackContext::new(&values);
            handler.on_candidate(&mut context);
            let CallbackContext { lazy, terminate, .. } = context;

            debug!("candidate {} produced {} lazy constraint(s)", candidates, lazy.len());
            for constraint in &lazy {
                self.add_constraint(constraint);
            }
            lazy_constraints += lazy.len();

            if terminate {
                info!("search terminated by handler after {} candidates", candidates);
                return Ok(finish(SolveStatus::Stopped, None, candidates, lazy_constraints));
            }

            if lazy.is_empty() {
                let mut values = values;
                values.truncate(self.num_vars);
                return Ok(finish(SolveStatus::Optimal, Some(values), candidates, lazy_constraints));
            }
        }
    }
}

/// A finished colouring.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Solution {
    pub(crate) shades: Array2<Shade>,
}

impl Solution {
    pub(crate) fn from_values(vars: &ShadeVars, values: &[bool]) -> Self {
        let side = vars.grid().size().get();
        Self {
            shades: Array2::from_shape_fn((side, side), |index| {
                match values[vars.var(Location::from(index), Shade::Black).index()] {
                    true => Shade::Black,
                    false => Shade::White,
                }
            }),
        }
    }

    /// Build a solution directly from rows of `#` (black) and `.` (white), top row first.
    ///
    /// Returns `None` if the rows are not square or contain other characters.
    pub fn parse(rows: &[&str]) -> Option<Self> {
        let side = rows.len();
        let mut shades = Array2::from_elem((side, side), Shade::White);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != side {
                return None;
            }
            for (x, c) in row.chars().enumerate() {
                shades[[y, x]] = match c {
                    '#' => Shade::Black,
                    '.' => Shade::White,
                    _ => return None,
                };
            }
        }
        Some(Self { shades })
    }

    /// Shade of `location`.
    ///
    /// # Panics
    /// If `location` is outside the colouring.
    pub fn shade(&self, location: Location) -> Shade {
        self.shades[location.as_index()]
    }

    /// Black cells in row-major order.
    pub fn black_cells(&self) -> Vec<Location> {
        self.shades.indexed_iter()
            .filter(|(_, shade)| **shade == Shade::Black)
            .map(|(index, _)| Location::from(index))
            .collect()
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.shades.rows() {
            for shade in row {
                write!(f, "{}", shade)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Everything a caller learns from [`Board::solve`](crate::Board::solve).
#[derive(Clone, Debug)]
pub struct SolveReport {
    /// How the solve ended.
    pub status: SolveStatus,
    /// Time from the first SAT call to the end of the search.
    pub elapsed: Duration,
    /// Walls and loops cut off before the search settled.
    pub lazy_constraints: usize,
    /// Colourings the SAT engine proposed.
    pub candidates: usize,
    /// The accepted colouring, present only when `status` is [`SolveStatus::Optimal`].
    pub solution: Option<Solution>,
}

impl Display for SolveReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let seconds = self.elapsed.as_secs_f64();
        match self.status {
            SolveStatus::Optimal => write!(f, "Solved in {:.2} seconds! {} walls/loops were found before solution reached", seconds, self.lazy_constraints),
            SolveStatus::Stopped => write!(f, "Stopped by user after {:.2} seconds", seconds),
            SolveStatus::Infeasible | SolveStatus::TimeLimit => write!(f, "Solution not found in {:.2} seconds! ({})", seconds, self.status),
        }
    }
}
