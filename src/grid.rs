use std::num::NonZero;

use itertools::Itertools;

use crate::location::{Dimension, Location};
use crate::shape::{BoardShape, DiagonalStep, SquareStep};

/// The bare `N x N` lattice, answering neighbourhood questions without knowing anything about regions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Grid {
    size: Dimension,
}

impl Grid {
    /// An `size x size` grid.
    pub fn new(size: Dimension) -> Self {
        Self { size }
    }

    /// Shorthand for tests and loaders that already know `size` is nonzero.
    ///
    /// # Panics
    /// If `size` is zero.
    pub fn with_side(size: usize) -> Self {
        Self::new(NonZero::new(size).expect("grid side must be nonzero"))
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> Dimension {
        self.size
    }

    /// Number of cells.
    #[inline]
    pub fn area(&self) -> usize {
        self.size.get() * self.size.get()
    }

    /// Whether `location` lies on the grid.
    #[inline]
    pub fn contains(&self, location: Location) -> bool {
        location.0 < self.size.get() && location.1 < self.size.get()
    }

    /// Whether `location` lies on the outer ring of the grid.
    #[inline]
    pub fn is_boundary(&self, location: Location) -> bool {
        let last = self.size.get() - 1;
        location.0 == 0 || location.1 == 0 || location.0 == last || location.1 == last
    }

    /// Every location, in row-major order.
    pub fn locations(&self) -> impl Iterator<Item=Location> {
        let side = self.size.get();
        (0..side).cartesian_product(0..side).map(|(y, x)| Location(x, y))
    }

    /// Every location on the outer ring, in row-major order.
    pub fn boundary(&self) -> impl Iterator<Item=Location> + '_ {
        self.locations().filter(|location| self.is_boundary(*location))
    }

    /// Cells sharing an edge with `location`, clipped to the grid.
    pub fn orthogonal_neighbors(&self, location: Location) -> Vec<Location> {
        SquareStep::neighbors_of(location).into_iter()
            .map(|(_, neighbor)| neighbor)
            .filter(|neighbor| self.contains(*neighbor))
            .collect()
    }

    /// Cells sharing only a corner with `location`, clipped to the grid.
    ///
    /// Neighbours come out in [`DiagonalStep`] variant order.
    pub fn diagonal_neighbors(&self, location: Location) -> Vec<Location> {
        DiagonalStep::neighbors_of(location).into_iter()
            .map(|(_, neighbor)| neighbor)
            .filter(|neighbor| self.contains(*neighbor))
            .collect()
    }
}
