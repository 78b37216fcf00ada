#![warn(missing_docs)]

//! # `heyawake`
//!
//! A solver for [Heyawake](https://en.wikipedia.org/wiki/Heyawake), the Nikoli shading puzzle.
//! Begin by drawing a board with a [`BoardBuilder`](builder::BoardBuilder), or load one from a [`Template`](template::Template).
//! Convert it to a [`Board`], then call [`solve()`](crate::Board::solve) to get a [`SolveReport`] holding the solution.
//!
//! # Rules
//! The grid is split into regions, some of which carry a number. Shade some cells black so that:
//! 1. a numbered region holds exactly that many black cells;
//! 2. no two black cells share an edge;
//! 3. the white cells form one orthogonally connected area;
//! 4. no straight line of white cells crosses two region borders.
//!
//! # Internals
//! Rules 1, 2 and 4 (and a weak local form of rule 3) are linear over one 0/1 indicator per cell and shade, so they are
//! translated to CNF up front and handed to an incremental SAT solver. Full white connectivity is not, so it is enforced
//! lazily: every time the solver proposes a colouring, the [`cuts`] module looks for a black structure which splits the
//! white area and, if it finds one, adds a constraint forbidding that exact structure before the search resumes.
//!
//! Because black cells never share an edge, they can only touch at corners. The white area is disconnected exactly when
//! some diagonally connected chain of black cells runs from one point of the boundary to another (a *wall*) or closes on
//! itself (a *loop*). Finding either is a depth-first search over diagonal neighbours, followed by a purge of the dead-end
//! trails the search wandered down, so that each cut only names the cells which actually matter.

pub use board::{Board, RuleViolation};
pub use builder::BoardBuilder;
pub use error::{HeyawakeError, Result};
pub use grid::Grid;
pub use location::Location;
pub use solver::{Solution, SolveOptions, SolveReport, SolveStatus, StopFlag};
pub use template::Template;

/// Frozen boards, rule checking and solving.
pub mod board;
/// Drawing boards region by region.
pub mod builder;
/// Per-cell shades and border flags.
pub mod cell;
/// The initial 0/1 model of a board.
pub mod constraints;
pub mod cuts;
/// Crate-wide error type.
pub mod error;
/// The bare square lattice.
pub mod grid;
pub(crate) mod location;
pub(crate) mod logic;
/// Decision variables and linear constraints.
pub mod model;
/// Groups of cells sharing a clue.
pub mod region;
/// Orthogonal and diagonal steps.
pub mod shape;
/// The lazy-constraint search on top of `varisat`.
pub mod solver;
/// JSON puzzle templates.
pub mod template;
mod tests;
