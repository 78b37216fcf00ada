use itertools::Itertools;
use log::debug;
use strum::{Display, VariantArray};

use crate::board::Board;
use crate::model::{LinearConstraint, ShadeVars};
use crate::shape::SquareStep;

/// Which rule a constraint of the initial model expresses.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, VariantArray)]
pub enum ConstraintKind {
    /// Each cell is exactly one of white or black.
    SelectOne,
    /// A clued region holds exactly that many black cells.
    RegionCount,
    /// No two black cells share an edge.
    AdjacentBlack,
    /// No straight white run crosses two region borders.
    Visibility,
    /// A white cell has a white orthogonal neighbour. Necessary for white connectivity, far from sufficient; the rest is
    /// left to the lazily added wall and loop cuts.
    ConnectedWhite,
}

/// The variables and constraints registered before the search starts.
#[derive(Clone, Debug)]
pub struct Model {
    /// One indicator per cell and shade.
    pub vars: ShadeVars,
    /// Every constraint, tagged with the rule it expresses.
    pub constraints: Vec<(ConstraintKind, LinearConstraint)>,
}

impl Model {
    /// The constraints expressing `kind`, in registration order.
    pub fn of_kind(&self, kind: ConstraintKind) -> impl Iterator<Item=&LinearConstraint> + '_ {
        self.constraints.iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, constraint)| constraint)
    }
}

/// Translate `board` into its initial 0/1 model.
///
/// # Logical setup
/// Every cell `c` has two indicators, `white(c)` and `black(c)`.
///
/// 1. `white(c) + black(c) == 1`.
/// 2. For a region with clue `k`, the `black` indicators of its members sum to `k`.
/// 3. `black(c)` implies the `black` indicators of the orthogonal neighbours of `c` sum to 0.
/// 4. For every cell whose south (east) side is a region border, if walking south (east) from it meets three regions
///    before the grid edge, at least one cell of that run is black.
/// 5. `white(c)` implies at least one orthogonal neighbour of `c` is white.
pub fn build_model(board: &Board) -> Model {
    let grid = board.grid();
    let vars = ShadeVars::new(grid);
    let mut constraints = Vec::new();

    for cell in grid.locations() {
        constraints.push((ConstraintKind::SelectOne, LinearConstraint::exactly(vec![vars.white(cell), vars.black(cell)], 1)));
    }

    for region in board.regions() {
        if let Some(clue) = region.clue() {
            constraints.push((ConstraintKind::RegionCount, LinearConstraint::exactly(
                region.cells().iter().map(|cell| vars.black(*cell)).collect_vec(),
                clue,
            )));
        }
    }

    for cell in grid.locations() {
        let neighbors = grid.orthogonal_neighbors(cell);

        constraints.push((ConstraintKind::AdjacentBlack, LinearConstraint::at_most(
            neighbors.iter().map(|neighbor| vars.black(*neighbor)).collect_vec(),
            0,
        ).only_if(vars.black(cell))));

        if !neighbors.is_empty() {
            constraints.push((ConstraintKind::ConnectedWhite, LinearConstraint::at_least(
                neighbors.iter().map(|neighbor| vars.white(*neighbor)).collect_vec(),
                1,
            ).only_if(vars.white(cell))));
        }
    }

    for cell in grid.locations() {
        for direction in [SquareStep::Down, SquareStep::Right] {
            if !board.flags(cell).get(direction) {
                continue;
            }
            if let Some(run) = board.visibility_run(cell, direction) {
                constraints.push((ConstraintKind::Visibility, LinearConstraint::at_least(
                    run.iter().map(|cell| vars.black(*cell)).collect_vec(),
                    1,
                )));
            }
        }
    }

    let counts = constraints.iter().map(|(kind, _)| *kind).counts();
    debug!("initial model: {}", ConstraintKind::VARIANTS.iter()
        .map(|kind| format!("{} {}", counts.get(kind).copied().unwrap_or(0), kind))
        .join(", "));

    Model { vars, constraints }
}
