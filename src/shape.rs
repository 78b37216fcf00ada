use std::hash::Hash;

use strum::VariantArray;

use crate::location::Location;

/// A single move on the square lattice.
///
/// [`SquareStep`] moves across an edge and [`DiagonalStep`] moves across a corner.
pub trait Step: Sized + Copy + VariantArray + PartialEq + Eq + Hash {
    /// Attempt the step from `location` in the direction specified by `self` and return the resultant [`Location`].
    ///
    /// The result is not bounds checked; see [`Grid::contains`](crate::grid::Grid::contains).
    fn attempt_from(&self, location: Location) -> Location;
}

/// Edge-sharing moves. Heyawake's adjacency and visibility rules are stated in these directions.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum SquareStep {
    /// Towards `y - 1`.
    Up,
    /// Towards `y + 1`.
    Down,
    /// Towards `x - 1`.
    Left,
    /// Towards `x + 1`.
    Right,
}

impl Step for SquareStep {
    fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((0, -1)),
            Self::Down => location.offset_by((0, 1)),
            Self::Left => location.offset_by((-1, 0)),
            Self::Right => location.offset_by((1, 0)),
        }
    }
}

/// Corner-sharing moves. Black cells may only touch this way, so walls and loops are chains of these.
///
/// The variant order is the order in which traversals explore neighbours.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum DiagonalStep {
    /// `(-1, -1)`
    UpLeft,
    /// `(-1, +1)`
    DownLeft,
    /// `(+1, +1)`
    DownRight,
    /// `(+1, -1)`
    UpRight,
}

impl Step for DiagonalStep {
    fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::UpLeft => location.offset_by((-1, -1)),
            Self::DownLeft => location.offset_by((-1, 1)),
            Self::DownRight => location.offset_by((1, 1)),
            Self::UpRight => location.offset_by((1, -1)),
        }
    }
}

/// Functionality on top of [`Step`] with identical implementation across every step kind.
pub trait BoardShape: Step {
    /// Get all neighbors of a [`Location`] in "theory", by attempting every step direction in `Self::VARIANTS`.
    fn neighbors_of(location: Location) -> Vec<(Self, Location)>;
    /// Determine the direction from `a` to `b` by calling [`attempt_from`](Step::attempt_from) until one works.
    ///
    /// Returns [`None`] if `b` is not one step away from `a`.
    fn direction_to(a: Location, b: Location) -> Option<Self>;
}

impl<S> BoardShape for S
where
    S: Step,
{
    fn neighbors_of(location: Location) -> Vec<(Self, Location)> {
        Self::VARIANTS.iter()
            .map(|dir| (*dir, dir.attempt_from(location)))
            .collect()
    }

    fn direction_to(a: Location, b: Location) -> Option<Self> {
        Self::VARIANTS.iter().find(|dir| dir.attempt_from(a) == b).copied()
    }
}
