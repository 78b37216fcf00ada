use std::collections::HashSet;

use itertools::Itertools;
use strum::VariantArray;

use crate::cell::BoundaryFlags;
use crate::location::Location;
use crate::shape::{SquareStep, Step};

/// Index of a region within its [`Board`](crate::Board) or [`BoardBuilder`](crate::builder::BoardBuilder).
pub type RegionID = usize;

/// A group of cells sharing one optional black-cell count.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub(crate) cells: Vec<Location>,
    // None is "not given", which is different from a clue of 0
    pub(crate) clue: Option<usize>,
}

impl Region {
    pub(crate) fn new(mut cells: Vec<Location>, clue: Option<usize>) -> Self {
        cells.sort();
        cells.dedup();
        Self { cells, clue }
    }

    /// Member cells in row-major order.
    pub fn cells(&self) -> &[Location] {
        &self.cells
    }

    /// Required black-cell count, if given.
    pub fn clue(&self) -> Option<usize> {
        self.clue
    }

    /// The cell a clue is written in: the first member in row-major order.
    pub fn anchor(&self) -> Location {
        self.cells[0]
    }

    /// Whether `location` is a member.
    pub fn contains(&self, location: Location) -> bool {
        self.cells.binary_search(&location).is_ok()
    }

    /// Derive the [`BoundaryFlags`] of every member by comparing each member's neighbours against the member set.
    ///
    /// The result depends only on membership, so recomputing it is harmless.
    pub fn boundary_flags(&self) -> Vec<(Location, BoundaryFlags)> {
        let members: HashSet<Location> = self.cells.iter().copied().collect();

        self.cells.iter()
            .map(|&location| {
                let mut flags = BoundaryFlags::default();
                for direction in SquareStep::VARIANTS {
                    flags.set(*direction, !members.contains(&direction.attempt_from(location)));
                }
                (location, flags)
            })
            .collect_vec()
    }
}
