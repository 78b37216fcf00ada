use std::num::NonZero;
use std::ops::RangeInclusive;

use itertools::Itertools;
use log::debug;

use crate::board::Board;
use crate::grid::Grid;
use crate::location::{Dimension, Location};
use crate::region::{Region, RegionID};
use crate::shape::{BoardShape, SquareStep};

/// Side lengths a board may have.
pub const VALID_SIZES: RangeInclusive<usize> = 4..=35;

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// The requested side length lies outside [`VALID_SIZES`].
    SizeOutOfRange,
    /// A location outside the board was selected or grouped.
    FeatureOutOfBounds,
    /// A region operation named a region which does not exist.
    RegionNotFound,
    /// [`BoardBuilder::build`] was called while some cell belonged to no region.
    Ungrouped,
}

/// Builds a [`Board`] the way a user draws one: select a patch of cells, group it into a region, optionally give the region
/// a clue, and repeat until every cell is grouped.
///
/// Structural mistakes (a bad size, an out-of-bounds location, an unknown region) put the builder in an invalid state, after
/// which every mutating call does nothing. Harmless mistakes, like selecting a cell which is already grouped, are ignored.
/// Builders can be [`Clone`]d to save their state at some point.
#[derive(Clone, Debug)]
pub struct BoardBuilder {
    size: Dimension,
    regions: Vec<Region>,
    selection: Vec<Location>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::with_size(*VALID_SIZES.start())
    }
}

impl BoardBuilder {
    /// Start an empty board with side length `size`.
    pub fn with_size(size: usize) -> Self {
        let mut invalid_reasons = Vec::new();
        if !VALID_SIZES.contains(&size) {
            invalid_reasons.push(BuilderInvalidReason::SizeOutOfRange);
        }

        Self {
            // an invalid builder never builds, so any nonzero placeholder will do
            size: NonZero::new(size).unwrap_or(NonZero::<usize>::MIN),
            regions: Vec::new(),
            selection: Vec::new(),
            invalid_reasons,
        }
    }

    #[inline]
    fn grid(&self) -> Grid {
        Grid::new(self.size)
    }

    /// Side length requested at construction.
    pub fn size(&self) -> Dimension {
        self.size
    }

    /// Regions grouped so far, in grouping order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Cells selected for the next region, in selection order.
    pub fn selection(&self) -> &[Location] {
        &self.selection
    }

    /// Whether `location` already belongs to a region.
    pub fn is_grouped(&self, location: Location) -> bool {
        self.regions.iter().any(|region| region.contains(location))
    }

    /// Whether every cell belongs to a region, i.e. the board is ready to solve.
    pub fn is_ready(&self) -> bool {
        self.grid().locations().all(|location| self.is_grouped(location))
    }

    fn check_bounds(&mut self, location: Location) -> bool {
        if self.grid().contains(location) {
            true
        } else {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            false
        }
    }

    fn check_region(&mut self, region: RegionID) -> bool {
        if region < self.regions.len() {
            true
        } else {
            self.invalid_reasons.push(BuilderInvalidReason::RegionNotFound);
            false
        }
    }

    /// Add `location` to the selection.
    ///
    /// The first cell of a selection is always accepted. Later cells must share an edge with some selected cell.
    /// Cells which are already grouped or selected, or are not adjacent to the selection, are ignored.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if
    /// `location` is out of bounds.
    pub fn select(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() || !self.check_bounds(location) {
            return self;
        }

        if self.is_grouped(location) || self.selection.contains(&location) {
            debug!("ignoring selection of {}: already taken", location);
            return self;
        }

        let touches_selection = self.selection.iter()
            .any(|selected| SquareStep::direction_to(*selected, location).is_some());
        if self.selection.is_empty() || touches_selection {
            self.selection.push(location);
        } else {
            debug!("ignoring selection of {}: not adjacent to the current selection", location);
        }

        self
    }

    /// Turn the current selection into a new, unclued region. Does nothing if nothing is selected.
    pub fn group_selection(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() || self.selection.is_empty() {
            return self;
        }

        let cells = std::mem::take(&mut self.selection).into_iter()
            .filter(|cell| !self.is_grouped(*cell))
            .collect_vec();
        if !cells.is_empty() {
            self.regions.push(Region::new(cells, None));
        }

        self
    }

    /// Group `cells` into a new region with `clue` in one go, as a loader would.
    ///
    /// Unlike [`Self::select`], no adjacency is required. Cells which are already grouped or pending in the selection are
    /// left out, so regions never overlap. The selection itself is kept. Does nothing if no cell is left.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if any
    /// location is out of bounds.
    pub fn add_region(&mut self, cells: &[Location], clue: Option<usize>) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        for cell in cells {
            if !self.check_bounds(*cell) {
                return self;
            }
        }

        let free = cells.iter().copied()
            .filter(|cell| !self.is_grouped(*cell) && !self.selection.contains(cell))
            .collect_vec();
        if free.len() < cells.len() {
            debug!("leaving {} taken cell(s) out of the new region", cells.len() - free.len());
        }
        if !free.is_empty() {
            self.regions.push(Region::new(free, clue));
        }

        self
    }

    /// Require `region` to hold exactly `clue` black cells.
    ///
    /// May cause the builder to enter a [`RegionNotFound`](BuilderInvalidReason::RegionNotFound) invalid state.
    pub fn set_clue(&mut self, region: RegionID, clue: usize) -> &mut Self {
        if !self.invalid_reasons.is_empty() || !self.check_region(region) {
            return self;
        }

        self.regions[region].clue = Some(clue);
        self
    }

    /// Remove the clue of `region`, leaving its count unconstrained.
    ///
    /// May cause the builder to enter a [`RegionNotFound`](BuilderInvalidReason::RegionNotFound) invalid state.
    pub fn clear_clue(&mut self, region: RegionID) -> &mut Self {
        if !self.invalid_reasons.is_empty() || !self.check_region(region) {
            return self;
        }

        self.regions[region].clue = None;
        self
    }

    /// Ungroup `region`, returning its cells to their default state. Later regions move down one index.
    ///
    /// May cause the builder to enter a [`RegionNotFound`](BuilderInvalidReason::RegionNotFound) invalid state.
    pub fn remove_region(&mut self, region: RegionID) -> &mut Self {
        if !self.invalid_reasons.is_empty() || !self.check_region(region) {
            return self;
        }

        self.regions.remove(region);
        self
    }

    /// Drop the most recently selected cell, or if nothing is selected, the most recently added region.
    pub fn undo(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if self.selection.pop().is_none() {
            self.regions.pop();
        }

        self
    }

    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`Board`].
    ///
    /// Fails if the builder is invalid or if some cell belongs to no region; a pending selection does not count as a region.
    pub fn build(&self) -> Result<Board, Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(self.invalid_reasons.clone());
        }

        if !self.is_ready() {
            let ungrouped = self.grid().locations().filter(|location| !self.is_grouped(*location)).collect_vec();
            debug!("cannot build, {} cells ungrouped: {}", ungrouped.len(), ungrouped.iter().join(" "));
            return Err(vec![BuilderInvalidReason::Ungrouped]);
        }

        Ok(Board::from_regions(self.size, self.regions.clone()))
    }
}
