use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use log::info;
use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;
use petgraph::visit::Dfs;
use unordered_pair::UnorderedPair;

use crate::cell::{BoundaryFlags, Shade};
use crate::constraints::build_model;
use crate::cuts::{CutEngine, CutObserver};
use crate::error::Result;
use crate::grid::Grid;
use crate::location::{Dimension, Location};
use crate::region::{Region, RegionID};
use crate::shape::{SquareStep, Step};
use crate::solver::{LazySolver, Solution, SolveOptions, SolveReport, StopFlag};

/// A finished puzzle: a square grid partitioned into regions, some of them clued.
///
/// [`Board`]s should be built using a [`BoardBuilder`](crate::builder::BoardBuilder), or loaded from a
/// [`Template`](crate::template::Template). A board never changes once built.
#[derive(Clone, Debug)]
pub struct Board {
    pub(crate) grid: Grid,
    pub(crate) regions: Vec<Region>,
    pub(crate) membership: Array2<RegionID>,
    pub(crate) flags: Array2<BoundaryFlags>,
}

/// A rule broken by a colouring, as reported by [`Board::violations`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuleViolation {
    /// Two black cells share an edge.
    AdjacentBlack(Location, Location),
    /// A clued region holds the wrong number of black cells.
    RegionCount {
        /// The offending region.
        region: RegionID,
        /// Its clue.
        expected: usize,
        /// Black cells actually in it.
        found: usize,
    },
    /// A white run crossing two region borders.
    Visibility {
        /// The cells of the run, starting at the first border.
        run: Vec<Location>,
    },
    /// The white cells fall apart into more than one orthogonally connected area.
    WhiteDisconnected,
    /// The colouring is for a board of another size, so no other rule was checked.
    SizeMismatch {
        /// Side length of the board.
        expected: usize,
        /// Side length of the colouring.
        found: usize,
    },
}

impl Display for RuleViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleViolation::AdjacentBlack(a, b) => write!(f, "black cells {} and {} are adjacent", a, b),
            RuleViolation::RegionCount { region, expected, found } =>
                write!(f, "region {} has {} black cells instead of {}", region, found, expected),
            RuleViolation::Visibility { run } =>
                write!(f, "white run {} crosses two region borders", run.iter().join(" ")),
            RuleViolation::WhiteDisconnected => write!(f, "white cells are not connected"),
            RuleViolation::SizeMismatch { expected, found } =>
                write!(f, "colouring is {0}x{0} but the board is {1}x{1}", found, expected),
        }
    }
}

impl Board {
    /// Freeze `regions`, which must partition the grid; checked by the builder.
    pub(crate) fn from_regions(size: Dimension, regions: Vec<Region>) -> Self {
        let grid = Grid::new(size);
        let side = size.get();
        let mut membership = Array2::from_elem((side, side), 0);
        let mut flags = Array2::from_elem((side, side), BoundaryFlags::default());

        for (id, region) in regions.iter().enumerate() {
            for (location, cell_flags) in region.boundary_flags() {
                membership[location.as_index()] = id;
                flags[location.as_index()] = cell_flags;
            }
        }

        Self { grid, regions, membership, flags }
    }

    /// The lattice underneath the regions.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> Dimension {
        self.grid.size()
    }

    /// Regions indexed by [`RegionID`].
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The region with index `id`, if there is one.
    pub fn region(&self, id: RegionID) -> Option<&Region> {
        self.regions.get(id)
    }

    /// # Panics
    /// If `location` is off the board.
    pub fn region_of(&self, location: Location) -> RegionID {
        self.membership[location.as_index()]
    }

    /// # Panics
    /// If `location` is off the board.
    pub fn flags(&self, location: Location) -> BoundaryFlags {
        self.flags[location.as_index()]
    }

    /// Walk from `location` (inclusive) in `direction` until the walked cells have touched three distinct regions.
    ///
    /// Returns the walked cells, or `None` if the edge of the grid comes first.
    /// No such run may be entirely white.
    pub fn visibility_run(&self, location: Location, direction: SquareStep) -> Option<Vec<Location>> {
        let mut run = Vec::new();
        let mut touched: Vec<RegionID> = Vec::with_capacity(3);
        let mut cell = location;

        while self.grid.contains(cell) {
            run.push(cell);
            let region = self.region_of(cell);
            if !touched.contains(&region) {
                touched.push(region);
                if touched.len() >= 3 {
                    return Some(run);
                }
            }
            cell = direction.attempt_from(cell);
        }

        None
    }

    /// Every pair of orthogonally adjacent cells separated by a region border.
    pub fn borders(&self) -> HashSet<UnorderedPair<Location>> {
        self.grid.locations()
            .flat_map(|location| [SquareStep::Down, SquareStep::Right].into_iter()
                .map(move |direction| (location, direction.attempt_from(location))))
            .filter(|(_, neighbor)| self.grid.contains(*neighbor))
            .filter(|(location, neighbor)| self.region_of(*location) != self.region_of(*neighbor))
            .map(UnorderedPair::from)
            .collect()
    }

    /// Check `solution` against every rule this crate knows: adjacency, region counts, visibility, and white connectivity.
    ///
    /// Returns every rule broken, or nothing for a valid solution.
    pub fn violations(&self, solution: &Solution) -> Vec<RuleViolation> {
        let side = self.size().get();
        if solution.shades.dim() != (side, side) {
            return vec![RuleViolation::SizeMismatch { expected: side, found: solution.shades.nrows() }];
        }

        let mut violations = Vec::new();
        let is_black = |location: Location| solution.shade(location) == Shade::Black;

        for location in self.grid.locations().filter(|location| is_black(*location)) {
            for direction in [SquareStep::Down, SquareStep::Right] {
                let neighbor = direction.attempt_from(location);
                if self.grid.contains(neighbor) && is_black(neighbor) {
                    violations.push(RuleViolation::AdjacentBlack(location, neighbor));
                }
            }
        }

        for (id, region) in self.regions.iter().enumerate() {
            if let Some(expected) = region.clue() {
                let found = region.cells().iter().filter(|cell| is_black(**cell)).count();
                if found != expected {
                    violations.push(RuleViolation::RegionCount { region: id, expected, found });
                }
            }
        }

        for location in self.grid.locations() {
            for direction in [SquareStep::Down, SquareStep::Right] {
                if !self.flags(location).get(direction) {
                    continue;
                }
                if let Some(run) = self.visibility_run(location, direction) {
                    if !run.iter().any(|cell| is_black(*cell)) {
                        violations.push(RuleViolation::Visibility { run });
                    }
                }
            }
        }

        let mut whites: UnGraphMap<Location, ()> = UnGraphMap::new();
        for location in self.grid.locations().filter(|location| !is_black(*location)) {
            whites.add_node(location);
            for direction in [SquareStep::Up, SquareStep::Left] {
                let neighbor = direction.attempt_from(location);
                if whites.contains_node(neighbor) {
                    whites.add_edge(location, neighbor, ());
                }
            }
        }
        if let Some(first) = whites.nodes().next() {
            let mut dfs = Dfs::new(&whites, first);
            let mut reached = 0;
            while dfs.next(&whites).is_some() {
                reached += 1;
            }
            if reached != whites.node_count() {
                violations.push(RuleViolation::WhiteDisconnected);
            }
        }

        violations
    }

    /// Solve this board, returning a [`SolveReport`] whose `solution` is present when the status is optimal.
    ///
    /// Equivalent to [`Self::solve_with`] with a stop flag nobody raises and no observer.
    pub fn solve(&self, options: &SolveOptions) -> Result<SolveReport> {
        self.solve_with(options, &StopFlag::default(), &mut ())
    }

    /// Solve this board, stopping early if `stop` is raised and reporting progress to `observer`.
    pub fn solve_with(&self, options: &SolveOptions, stop: &StopFlag, observer: &mut dyn CutObserver) -> Result<SolveReport> {
        let model = build_model(self);

        let mut solver = LazySolver::new(model.vars.num_vars());
        for (_, constraint) in &model.constraints {
            solver.add_constraint(constraint);
        }
        info!("solving {0}x{0} board: {1} regions, {2} constraints, {3} variables",
            self.size(), self.regions.len(), model.constraints.len(), solver.allocated_vars());

        let mut engine = CutEngine::new(&model.vars, stop.clone(), observer);
        let outcome = solver.search(&mut engine, options)?;

        let report = SolveReport {
            status: outcome.status,
            elapsed: outcome.elapsed,
            lazy_constraints: outcome.lazy_constraints,
            candidates: outcome.candidates,
            solution: outcome.values.map(|values| Solution::from_values(&model.vars, &values)),
        };
        info!("{}", report);

        Ok(report)
    }

    fn render(&self, solution: Option<&Solution>) -> String {
        let side = self.size().get();
        let mut out = String::with_capacity((2 * side + 2) * (2 * side + 1));

        let borders = self.borders();
        // the grid edge is always drawn
        let walled = |location: Location, direction: SquareStep| {
            let neighbor = direction.attempt_from(location);
            !self.grid.contains(neighbor) || borders.contains(&UnorderedPair::from((location, neighbor)))
        };

        let border_row = |out: &mut String, y: usize, direction: SquareStep| {
            for x in 0..side {
                out.push('+');
                out.push(if walled(Location(x, y), direction) { '-' } else { ' ' });
            }
            out.push('+');
            out.push('\n');
        };

        for y in 0..side {
            border_row(&mut out, y, SquareStep::Up);

            for x in 0..side {
                let location = Location(x, y);
                out.push(if walled(location, SquareStep::Left) { '|' } else { ' ' });

                let region = &self.regions[self.region_of(location)];
                let clue = region.clue()
                    .filter(|_| region.anchor() == location)
                    .map(|clue| char::from_digit(clue as u32, 36).unwrap_or('?'));
                out.push(match (solution.map(|solution| solution.shade(location)), clue) {
                    (Some(Shade::Black), _) => '#',
                    (_, Some(clue)) => clue,
                    (Some(Shade::White), None) => '.',
                    (None, None) => ' ',
                });
            }
            out.push('|');
            out.push('\n');
        }

        border_row(&mut out, side - 1, SquareStep::Down);

        out
    }

    /// Draw the board with `solution` filled in: `#` for black, `.` for white, clues on white cells.
    ///
    /// # Panics
    /// If `solution` is smaller than the board.
    pub fn render_solution(&self, solution: &Solution) -> String {
        self.render(Some(solution))
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(None))
    }
}
