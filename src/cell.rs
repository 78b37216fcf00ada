use std::fmt::{Display, Formatter};

use strum::VariantArray;

use crate::shape::SquareStep;

/// The colour a solved cell takes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, VariantArray)]
pub enum Shade {
    /// Part of the connected white area; the default.
    #[default]
    White,
    /// Shaded.
    Black,
}

impl Shade {
    /// Column of this shade in the variable table.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        match self {
            Shade::White => 0,
            Shade::Black => 1,
        }
    }
}

impl Display for Shade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Shade::White => '.',
            Shade::Black => '#',
        })
    }
}

/// Which sides of a cell coincide with the border of its region.
///
/// The outer edge of the grid always counts as a border.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BoundaryFlags {
    /// The side facing `y - 1`.
    pub north: bool,
    /// The side facing `y + 1`.
    pub south: bool,
    /// The side facing `x + 1`.
    pub east: bool,
    /// The side facing `x - 1`.
    pub west: bool,
}

impl BoundaryFlags {
    /// Whether the side of the cell facing `direction` is a border.
    pub fn get(&self, direction: SquareStep) -> bool {
        match direction {
            SquareStep::Up => self.north,
            SquareStep::Down => self.south,
            SquareStep::Left => self.west,
            SquareStep::Right => self.east,
        }
    }

    pub(crate) fn set(&mut self, direction: SquareStep, value: bool) {
        match direction {
            SquareStep::Up => self.north = value,
            SquareStep::Down => self.south = value,
            SquareStep::Left => self.west = value,
            SquareStep::Right => self.east = value,
        }
    }
}
