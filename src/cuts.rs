//! Discovery of walls and loops in a candidate colouring, and the cuts that forbid them.
//!
//! In a valid Heyawake solution black cells never share an edge, so black cells can only touch at corners.
//! The white area is then disconnected exactly when some diagonally-connected string of black cells either runs from one
//! point of the grid boundary to another (a *wall*) or closes on itself (a *loop*).
//! Neither condition is linear, so rather than encoding it up front, every candidate found by the solver is scanned here;
//! the first wall and the first loop found are trimmed down to their essential cells and returned as [`Cut`]s, each stating
//! that not all of its cells may be black at once.
//!
//! All scans go in row-major order and explore neighbours in [`DiagonalStep`](crate::shape::DiagonalStep) order, so the
//! same candidate always produces the same cuts.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use log::{debug, info};
use ndarray::Array2;
use petgraph::graphmap::UnGraphMap;

use crate::cell::Shade;
use crate::grid::Grid;
use crate::location::Location;
use crate::model::{LinearConstraint, ShadeVars};
use crate::solver::{CallbackContext, CandidateHandler, StopFlag};

/// An immutable snapshot of which cells are black in one candidate assignment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    grid: Grid,
    black: Array2<bool>,
}

impl Candidate {
    /// Wrap a square array of black flags, indexed `[y, x]`.
    ///
    /// # Panics
    /// If `black` is not square or is empty.
    pub fn new(black: Array2<bool>) -> Self {
        assert_eq!(black.nrows(), black.ncols(), "candidate must be square");
        Self { grid: Grid::with_side(black.nrows()), black }
    }

    /// A candidate on `grid` whose black cells are exactly `cells`; out-of-bounds cells are ignored.
    pub fn from_black_cells(grid: Grid, cells: &[Location]) -> Self {
        let side = grid.size().get();
        let mut black = Array2::from_elem((side, side), false);
        for cell in cells.iter().filter(|cell| grid.contains(**cell)) {
            black[cell.as_index()] = true;
        }
        Self { grid, black }
    }

    pub(crate) fn from_context(vars: &ShadeVars, context: &CallbackContext<'_>) -> Self {
        let grid = vars.grid();
        let side = grid.size().get();
        Self {
            grid,
            black: Array2::from_shape_fn((side, side), |index| context.value(vars.var(Location::from(index), Shade::Black))),
        }
    }

    /// The grid this candidate colours.
    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Whether `location` is black. Off-grid locations are not.
    #[inline]
    pub fn is_black(&self, location: Location) -> bool {
        self.grid.contains(location) && self.black[location.as_index()]
    }

    /// Black cells in row-major order.
    pub fn black_cells(&self) -> impl Iterator<Item=Location> + '_ {
        self.grid.locations().filter(|location| self.is_black(*location))
    }

    fn black_diagonal_neighbors(&self, location: Location) -> Vec<Location> {
        self.grid.diagonal_neighbors(location).into_iter()
            .filter(|neighbor| self.is_black(*neighbor))
            .collect_vec()
    }
}

/// The kind of illegal black structure a cut forbids.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StructureKind {
    /// Touches the grid boundary at two or more cells, cutting the white area in two.
    Wall,
    /// Closes on itself, enclosing a pocket of white cells.
    Loop,
}

impl Display for StructureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            StructureKind::Wall => "wall",
            StructureKind::Loop => "loop",
        })
    }
}

/// How far along a structure is when an observer is told about it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Every cell the traversal had visited when it noticed the violation.
    Detected,
    /// What remains after trail purging; these are the cells the cut is stated over.
    Purged,
}

/// Forbids one structure: at most `|cells| - 1` of `cells` may be black.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cut {
    kind: StructureKind,
    traversed: Vec<Location>,
    cells: Vec<Location>,
}

impl Cut {
    /// Whether a wall or a loop produced this cut.
    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Cells visited by the traversal which found the structure, in visiting order.
    pub fn traversed(&self) -> &[Location] {
        &self.traversed
    }

    /// The essential cells of the structure, in row-major order.
    pub fn cells(&self) -> &[Location] {
        &self.cells
    }

    /// How many of [`Self::cells`] may still be black together.
    pub fn bound(&self) -> usize {
        self.cells.len() - 1
    }

    /// State this cut over the black indicators of `vars`.
    pub fn to_constraint(&self, vars: &ShadeVars) -> LinearConstraint {
        LinearConstraint::at_most(self.cells.iter().map(|cell| vars.black(*cell)).collect_vec(), self.bound())
    }
}

/// One depth-first traversal over diagonally adjacent black cells.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trace {
    /// Cells in the order they were visited.
    pub visited: Vec<Location>,
    /// How many visited cells lie on the grid boundary.
    pub boundary_hits: usize,
    /// Whether the traversal closed a cycle.
    pub loop_found: bool,
}

/// Follow black cells diagonally from `start`, stopping as soon as a second boundary cell is reached.
///
/// If no second boundary cell is reachable, the whole black diagonal component of `start` is visited.
pub fn trace_wall(candidate: &Candidate, start: Location) -> Trace {
    let grid = candidate.grid();
    let side = grid.size().get();
    let mut seen = Array2::from_elem((side, side), false);
    let mut trace = Trace::default();
    let mut stack = vec![start];

    while let Some(cell) = stack.pop() {
        if seen[cell.as_index()] {
            continue;
        }
        seen[cell.as_index()] = true;
        trace.visited.push(cell);

        if grid.is_boundary(cell) {
            trace.boundary_hits += 1;
            if trace.boundary_hits > 1 {
                break;
            }
        }

        // reversed, so that the first neighbour is the next one popped
        stack.extend(candidate.black_diagonal_neighbors(cell).into_iter()
            .filter(|neighbor| !seen[neighbor.as_index()])
            .rev());
    }

    trace
}

/// Follow black cells diagonally from `start`, stopping as soon as some cell has a visited neighbour other than the cell it
/// was reached from.
///
/// If no cycle is reachable, the whole black diagonal component of `start` is visited.
pub fn trace_loop(candidate: &Candidate, start: Location) -> Trace {
    let grid = candidate.grid();
    let side = grid.size().get();
    let mut seen = Array2::from_elem((side, side), false);
    let mut trace = Trace::default();
    let mut stack: Vec<(Option<Location>, Location)> = vec![(None, start)];

    while let Some((predecessor, cell)) = stack.pop() {
        if seen[cell.as_index()] {
            continue;
        }
        seen[cell.as_index()] = true;
        trace.visited.push(cell);

        let neighbors = candidate.black_diagonal_neighbors(cell);
        // cell has no children yet, so a visited neighbour other than its parent closes a cycle
        if neighbors.iter().any(|neighbor| seen[neighbor.as_index()] && Some(*neighbor) != predecessor) {
            trace.loop_found = true;
            break;
        }

        stack.extend(neighbors.into_iter()
            .filter(|neighbor| !seen[neighbor.as_index()])
            .rev()
            .map(|neighbor| (Some(cell), neighbor)));
    }

    trace
}

/// Repeatedly drop every cell of `cells` which is not `anchored` and has exactly one diagonal neighbour left in the set.
///
/// What remains is returned in row-major order. Only leaves are ever removed, so a connected input stays connected, and the
/// result is a fixed point: purging it again changes nothing.
pub fn purge_trails(grid: Grid, cells: &[Location], anchored: impl Fn(Location) -> bool) -> Vec<Location> {
    let mut graph: UnGraphMap<Location, ()> = UnGraphMap::with_capacity(cells.len(), 2 * cells.len());
    for cell in cells {
        graph.add_node(*cell);
    }
    for cell in cells {
        for neighbor in grid.diagonal_neighbors(*cell) {
            if graph.contains_node(neighbor) {
                graph.add_edge(*cell, neighbor, ());
            }
        }
    }

    let is_trail_end = |graph: &UnGraphMap<Location, ()>, cell: Location| {
        !anchored(cell) && graph.neighbors(cell).count() == 1
    };

    let mut pending = graph.nodes()
        .filter(|cell| is_trail_end(&graph, *cell))
        .collect_vec();

    while let Some(cell) = pending.pop() {
        if !graph.contains_node(cell) || !is_trail_end(&graph, cell) {
            continue;
        }

        let remaining_neighbor = graph.neighbors(cell).next();
        graph.remove_node(cell);

        if let Some(neighbor) = remaining_neighbor {
            if is_trail_end(&graph, neighbor) {
                pending.push(neighbor);
            }
        }
    }

    graph.nodes().sorted().collect_vec()
}

/// Find the first wall in boundary scan order, trimmed so that it only keeps the cells connecting its boundary anchors.
pub fn find_wall(candidate: &Candidate) -> Option<Cut> {
    let grid = candidate.grid();
    let side = grid.size().get();
    let mut explored = Array2::from_elem((side, side), false);

    for start in grid.boundary() {
        if !candidate.is_black(start) || explored[start.as_index()] {
            continue;
        }

        let trace = trace_wall(candidate, start);
        trace.visited.iter().for_each(|cell| explored[cell.as_index()] = true);

        if trace.boundary_hits > 1 {
            let cells = purge_trails(grid, &trace.visited, |cell| grid.is_boundary(cell));
            return Some(Cut { kind: StructureKind::Wall, traversed: trace.visited, cells });
        }
    }

    None
}

/// Find the first loop in row-major scan order, trimmed down to the cells lying on cycles.
pub fn find_loop(candidate: &Candidate) -> Option<Cut> {
    let grid = candidate.grid();
    let side = grid.size().get();
    let mut explored = Array2::from_elem((side, side), false);

    for start in candidate.black_cells() {
        if explored[start.as_index()] {
            continue;
        }

        let trace = trace_loop(candidate, start);
        trace.visited.iter().for_each(|cell| explored[cell.as_index()] = true);

        if trace.loop_found {
            let cells = purge_trails(grid, &trace.visited, |_| false);
            return Some(Cut { kind: StructureKind::Loop, traversed: trace.visited, cells });
        }
    }

    None
}

/// Every cut one candidate calls for: at most one wall, then at most one loop.
pub fn discover(candidate: &Candidate) -> Vec<Cut> {
    find_wall(candidate).into_iter()
        .chain(find_loop(candidate))
        .collect_vec()
}

/// Optional hook for anyone who wants to watch the search, such as an editor animating it.
///
/// Calls are made synchronously from inside the search, so implementations should return promptly.
pub trait CutObserver {
    /// A new candidate arrived, before any scan.
    fn on_candidate(&mut self, _candidate: &Candidate) {}
    /// A wall or loop was found (`Detected`) or trimmed (`Purged`).
    fn on_structure(&mut self, _kind: StructureKind, _stage: Stage, _cells: &[Location]) {}
}

impl CutObserver for () {}

impl<O: CutObserver + ?Sized> CutObserver for &mut O {
    fn on_candidate(&mut self, candidate: &Candidate) {
        (**self).on_candidate(candidate)
    }

    fn on_structure(&mut self, kind: StructureKind, stage: Stage, cells: &[Location]) {
        (**self).on_structure(kind, stage, cells)
    }
}

/// The [`CandidateHandler`] which turns walls and loops into lazy constraints.
pub struct CutEngine<'a, O: CutObserver> {
    vars: &'a ShadeVars,
    stop: StopFlag,
    observer: O,
    cuts_emitted: usize,
}

impl<'a, O: CutObserver> CutEngine<'a, O> {
    /// An engine reading candidates through `vars`, checking `stop` first and reporting to `observer`.
    pub fn new(vars: &'a ShadeVars, stop: StopFlag, observer: O) -> Self {
        Self { vars, stop, observer, cuts_emitted: 0 }
    }

    /// Cuts emitted over the lifetime of this engine.
    pub fn cuts_emitted(&self) -> usize {
        self.cuts_emitted
    }
}

impl<O: CutObserver> CandidateHandler for CutEngine<'_, O> {
    fn on_candidate(&mut self, context: &mut CallbackContext<'_>) {
        if self.stop.is_raised() {
            info!("stop requested, terminating search");
            context.terminate();
            return;
        }

        let candidate = Candidate::from_context(self.vars, context);
        self.observer.on_candidate(&candidate);

        for cut in discover(&candidate) {
            self.observer.on_structure(cut.kind(), Stage::Detected, cut.traversed());
            self.observer.on_structure(cut.kind(), Stage::Purged, cut.cells());

            self.cuts_emitted += 1;
            debug!("{} #{}: {} cells traversed, {} kept: {}", cut.kind(), self.cuts_emitted, cut.traversed().len(), cut.cells().len(),
                cut.cells().iter().join(" "));

            context.add_lazy(cut.to_constraint(self.vars));
        }
    }
}
