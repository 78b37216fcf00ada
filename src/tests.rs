#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use itertools::Itertools;
    use ndarray::Array2;
    use petgraph::graphmap::UnGraphMap;
    use petgraph::visit::Dfs;
    use unordered_pair::UnorderedPair;
    use varisat::{CnfFormula, Solver, Var};

    use crate::board::{Board, RuleViolation};
    use crate::builder::{BoardBuilder, BuilderInvalidReason};
    use crate::cell::Shade;
    use crate::constraints::{build_model, ConstraintKind};
    use crate::cuts::{discover, find_loop, find_wall, purge_trails, trace_wall, Candidate, CutEngine, CutObserver, Stage, StructureKind};
    use crate::error::HeyawakeError;
    use crate::grid::Grid;
    use crate::location::Location;
    use crate::model::{LinearConstraint, ShadeVars};
    use crate::shape::SquareStep;
    use crate::solver::{CallbackContext, CandidateHandler, LazySolver, Solution, SolveOptions, SolveStatus, StopFlag};
    use crate::template::Template;

    /// 4x4, three column regions: x = 0 with clue 1, x = 1..=2 with clue 2, x = 3 with clue 1.
    fn column_board() -> Board {
        let mut builder = BoardBuilder::with_size(4);
        for columns in [vec![0], vec![1, 2], vec![3]] {
            for y in 0..4 {
                for x in &columns {
                    builder.select(Location(*x, y));
                }
            }
            builder.group_selection();
        }
        builder.set_clue(0, 1).set_clue(1, 2).set_clue(2, 1);

        builder.build().unwrap()
    }

    const COLUMN_SOLUTION: [&str; 4] = [
        ".#..",
        "...#",
        "#...",
        "..#.",
    ];

    /// 6x6 split into 3x3 quadrants, each with clue 1.
    fn quadrant_board() -> Board {
        let mut builder = BoardBuilder::with_size(6);
        for (qx, qy) in [(0, 0), (3, 0), (0, 3), (3, 3)] {
            let cells = (0..3).cartesian_product(0..3)
                .map(|(y, x)| Location(qx + x, qy + y))
                .collect_vec();
            builder.add_region(&cells, Some(1));
        }

        builder.build().unwrap()
    }

    fn all_black(side: usize) -> Candidate {
        Candidate::new(Array2::from_elem((side, side), true))
    }

    fn is_connected(grid: Grid, cells: &[Location]) -> bool {
        let mut graph: UnGraphMap<Location, ()> = UnGraphMap::new();
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

        let Some(first) = cells.first() else { return true };
        let mut dfs = Dfs::new(&graph, *first);
        let mut reached = 0;
        while dfs.next(&graph).is_some() {
            reached += 1;
        }
        reached == cells.len()
    }

    #[derive(Default)]
    struct Recorder {
        candidates: usize,
        structures: Vec<(StructureKind, Stage, Vec<Location>)>,
    }

    impl CutObserver for Recorder {
        fn on_candidate(&mut self, _candidate: &Candidate) {
            self.candidates += 1;
        }

        fn on_structure(&mut self, kind: StructureKind, stage: Stage, cells: &[Location]) {
            self.structures.push((kind, stage, cells.to_vec()));
        }
    }

    #[test]
    fn neighbors_stay_in_bounds() {
        let grid = Grid::with_side(4);
        for location in grid.locations() {
            let orthogonal = grid.orthogonal_neighbors(location);
            let diagonal = grid.diagonal_neighbors(location);

            assert!(orthogonal.iter().chain(&diagonal).all(|neighbor| grid.contains(*neighbor)));
            assert!(!orthogonal.contains(&location) && !diagonal.contains(&location));
        }

        assert_eq!(grid.orthogonal_neighbors(Location(0, 0)), vec![Location(0, 1), Location(1, 0)]);
        assert_eq!(grid.diagonal_neighbors(Location(0, 0)), vec![Location(1, 1)]);
        assert_eq!(grid.diagonal_neighbors(Location(1, 1)),
                   vec![Location(0, 0), Location(0, 2), Location(2, 2), Location(2, 0)]);
        assert_eq!(grid.orthogonal_neighbors(Location(1, 2)).len(), 4);
    }

    #[test]
    fn locations_are_row_major() {
        let grid = Grid::with_side(4);
        let locations = grid.locations().collect_vec();

        assert_eq!(locations.len(), 16);
        assert_eq!(&locations[..5], &[Location(0, 0), Location(1, 0), Location(2, 0), Location(3, 0), Location(0, 1)]);
        assert!(locations.iter().tuple_windows().all(|(a, b)| a < b));
        assert_eq!(grid.boundary().count(), 12);
    }

    fn assert_encodes(constraint: &LinearConstraint, n: usize) {
        let mut next = n;
        let clauses = constraint.to_clauses(&mut || {
            let var = Var::from_index(next);
            next += 1;
            var
        });

        let mut solver = Solver::new();
        solver.add_formula(&CnfFormula::from(clauses));

        for bits in 0..1usize << n {
            let value = |var: Var| (bits >> var.index()) & 1 == 1;
            let assumptions = (0..n)
                .map(|i| Var::from_index(i))
                .map(|var| if value(var) { var.positive() } else { var.negative() })
                .collect_vec();
            solver.assume(&assumptions);

            assert_eq!(solver.solve().unwrap(), constraint.is_satisfied_by(value),
                       "{} under {:0width$b}", constraint, bits, width = n);
        }
    }

    #[test]
    fn cardinality_encodings() {
        let lits = (0..5).map(|i| Var::from_index(i).positive()).collect_vec();

        for k in 0..=6 {
            assert_encodes(&LinearConstraint::at_most(lits.clone(), k), 5);
            assert_encodes(&LinearConstraint::at_least(lits.clone(), k), 5);
            assert_encodes(&LinearConstraint::exactly(lits.clone(), k), 5);
        }
        assert_encodes(&LinearConstraint::exactly(lits[..3].to_vec(), 1), 5);
    }

    #[test]
    fn guarded_encodings() {
        let lits = (1..5).map(|i| Var::from_index(i).negative()).collect_vec();
        let guard = Var::from_index(0).positive();

        assert_encodes(&LinearConstraint::at_most(lits.clone(), 0).only_if(guard), 5);
        assert_encodes(&LinearConstraint::at_least(lits.clone(), 1).only_if(!guard), 5);
        assert_encodes(&LinearConstraint::at_least(lits.clone(), 5).only_if(guard), 5);
    }

    #[test]
    fn wall_from_corner_of_all_black() {
        let candidate = all_black(4);

        let trace = trace_wall(&candidate, Location(0, 0));
        assert_eq!(trace.visited, vec![Location(0, 0), Location(1, 1), Location(0, 2)]);
        assert_eq!(trace.boundary_hits, 2);

        let cut = find_wall(&candidate).unwrap();
        assert_eq!(cut.kind(), StructureKind::Wall);
        assert_eq!(cut.cells(), &[Location(0, 0), Location(1, 1), Location(0, 2)]);
        assert_eq!(cut.bound(), 2);
        assert!(cut.cells().iter().filter(|cell| candidate.grid().is_boundary(**cell)).count() >= 2);
    }

    #[test]
    fn wall_trail_is_purged() {
        let grid = Grid::with_side(6);
        let wall = [Location(3, 0), Location(2, 1), Location(3, 2), Location(4, 3), Location(5, 4)];
        let trail = Location(1, 2);
        let candidate = Candidate::from_black_cells(grid, &[&wall[..], &[trail][..]].concat());

        let cut = find_wall(&candidate).unwrap();
        assert_eq!(cut.traversed(), &[Location(3, 0), Location(2, 1), trail, Location(3, 2), Location(4, 3), Location(5, 4)]);
        assert_eq!(cut.cells(), &wall);
        assert_eq!(cut.bound(), 4);
        assert_eq!(find_loop(&candidate), None);
    }

    #[test]
    fn diamond_is_a_loop() {
        let grid = Grid::with_side(5);
        let diamond = [Location(2, 1), Location(1, 2), Location(3, 2), Location(2, 3)];
        let candidate = Candidate::from_black_cells(grid, &diamond);

        assert_eq!(find_wall(&candidate), None);
        let cut = find_loop(&candidate).unwrap();
        assert_eq!(cut.kind(), StructureKind::Loop);
        assert_eq!(cut.cells(), &diamond);
        assert_eq!(cut.bound(), 3);
        assert_eq!(discover(&candidate).len(), 1);
    }

    #[test]
    fn loop_tail_is_purged() {
        let grid = Grid::with_side(6);
        let diamond = [Location(2, 1), Location(1, 2), Location(3, 2), Location(2, 3)];
        let tail = Location(3, 4);
        let candidate = Candidate::from_black_cells(grid, &[&diamond[..], &[tail][..]].concat());

        let cut = find_loop(&candidate).unwrap();
        assert!(cut.traversed().contains(&tail));
        assert_eq!(cut.cells(), &diamond);
    }

    #[test]
    fn block_is_not_a_loop() {
        let grid = Grid::with_side(5);
        let block = Candidate::from_black_cells(grid, &[Location(1, 1), Location(2, 1), Location(1, 2), Location(2, 2)]);

        assert_eq!(find_loop(&block), None);
        assert!(discover(&block).is_empty());
    }

    #[test]
    fn scattered_blacks_need_no_cuts() {
        let solution = Solution::parse(&COLUMN_SOLUTION).unwrap();
        let candidate = Candidate::from_black_cells(Grid::with_side(4), &solution.black_cells());
        assert!(discover(&candidate).is_empty());

        // region counts are not checked here
        let candidate = Candidate::from_black_cells(Grid::with_side(5), &[Location(1, 1), Location(3, 1)]);
        assert!(discover(&candidate).is_empty());

        let empty = Candidate::new(Array2::from_elem((4, 4), false));
        assert!(discover(&empty).is_empty());
    }

    #[test]
    fn all_black_gets_both_cuts() {
        let candidate = all_black(5);
        let cuts = discover(&candidate);

        assert_eq!(cuts.iter().map(|cut| cut.kind()).collect_vec(), vec![StructureKind::Wall, StructureKind::Loop]);
        let ring = cuts[1].cells();
        assert!(ring.len() >= 4);
        for cell in ring {
            let inside = candidate.grid().diagonal_neighbors(*cell).into_iter().filter(|neighbor| ring.contains(neighbor)).count();
            assert!(inside >= 2, "{} is a trail end", cell);
        }
    }

    #[test]
    fn purge_is_idempotent_and_connected() {
        let grid = Grid::with_side(6);
        let cells = [Location(3, 0), Location(2, 1), Location(1, 2), Location(0, 3), Location(3, 2), Location(4, 3)];

        let anchors: [&dyn Fn(Location) -> bool; 2] = [&|cell: Location| grid.is_boundary(cell), &|_: Location| false];
        for anchored in anchors {
            let once = purge_trails(grid, &cells, anchored);
            let twice = purge_trails(grid, &once, anchored);

            assert_eq!(once, twice);
            assert!(is_connected(grid, &once));
            assert!(once.iter().tuple_windows().all(|(a, b)| a < b));
        }

        // both ends of the chain lie on the boundary, so only the spur goes
        assert_eq!(purge_trails(grid, &cells, |cell| grid.is_boundary(cell)),
                   vec![Location(3, 0), Location(2, 1), Location(1, 2), Location(0, 3)]);
        // no anchors and no cycle: the chain is eaten down to one cell
        assert!(purge_trails(grid, &cells, |_| false).len() <= 1);
    }

    #[test]
    fn cut_forbids_its_candidate() {
        let grid = Grid::with_side(4);
        let vars = ShadeVars::new(grid);
        let candidate = all_black(4);

        for cut in discover(&candidate) {
            let constraint = cut.to_constraint(&vars);
            assert!(!constraint.is_satisfied_by(|var| var.index() % 2 == 1));

            // whiten one cell of the structure and it is allowed again
            let spared = vars.var(cut.cells()[0], Shade::Black);
            assert!(constraint.is_satisfied_by(|var| var.index() % 2 == 1 && var != spared));
        }
    }

    fn all_black_values(vars: &ShadeVars) -> Vec<bool> {
        (0..vars.num_vars()).map(|index| index % 2 == 1).collect()
    }

    #[test]
    fn engine_emits_wall_then_loop() {
        let vars = ShadeVars::new(Grid::with_side(4));
        let values = all_black_values(&vars);
        let mut recorder = Recorder::default();

        let mut engine = CutEngine::new(&vars, StopFlag::default(), &mut recorder);
        let mut context = CallbackContext::new(&values);
        engine.on_candidate(&mut context);

        assert_eq!(engine.cuts_emitted(), 2);
        assert!(!context.is_terminating());
        assert_eq!(context.lazy_constraints().len(), 2);
        assert_eq!(context.lazy_constraints()[0],
                   LinearConstraint::at_most(vec![vars.black(Location(0, 0)), vars.black(Location(1, 1)), vars.black(Location(0, 2))], 2));

        assert_eq!(recorder.candidates, 1);
        assert_eq!(recorder.structures.iter().map(|(kind, stage, _)| (*kind, *stage)).collect_vec(), vec![
            (StructureKind::Wall, Stage::Detected),
            (StructureKind::Wall, Stage::Purged),
            (StructureKind::Loop, Stage::Detected),
            (StructureKind::Loop, Stage::Purged),
        ]);
    }

    #[test]
    fn engine_honours_stop_flag() {
        let vars = ShadeVars::new(Grid::with_side(4));
        let values = all_black_values(&vars);
        let stop = StopFlag::default();
        stop.raise();
        let mut recorder = Recorder::default();

        let mut engine = CutEngine::new(&vars, stop, &mut recorder);
        let mut context = CallbackContext::new(&values);
        engine.on_candidate(&mut context);

        assert!(context.is_terminating());
        assert!(context.lazy_constraints().is_empty());
        assert_eq!(engine.cuts_emitted(), 0);
        assert_eq!(recorder.candidates, 0);
        assert!(recorder.structures.is_empty());
    }

    /// Rejects every candidate with a true variable until none is left.
    struct ForbidTrue;

    impl CandidateHandler for ForbidTrue {
        fn on_candidate(&mut self, context: &mut CallbackContext<'_>) {
            let lits = (0..3).map(Var::from_index)
                .filter(|var| context.value(*var))
                .map(|var| var.positive())
                .collect_vec();
            if !lits.is_empty() {
                let bound = lits.len() - 1;
                context.add_lazy(LinearConstraint::at_most(lits, bound));
            }
        }
    }

    #[test]
    fn lazy_search_resumes_after_cuts() {
        let mut solver = LazySolver::new(3);
        let outcome = solver.search(&mut ForbidTrue, &SolveOptions::default()).unwrap();

        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.values, Some(vec![false, false, false]));
        assert_eq!(outcome.lazy_constraints, outcome.candidates - 1);
    }

    #[test]
    fn lazy_search_infeasible() {
        let mut solver = LazySolver::new(2);
        let lits = vec![Var::from_index(0).positive(), Var::from_index(1).positive()];
        solver.add_constraint(&LinearConstraint::at_least(lits.clone(), 2));
        solver.add_constraint(&LinearConstraint::at_most(lits, 1));

        let outcome = solver.search(&mut ForbidTrue, &SolveOptions::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert_eq!(outcome.values, None);
        assert_eq!(outcome.candidates, 0);
    }

    #[test]
    fn builder_selection_rules() {
        let mut builder = BoardBuilder::with_size(4);
        builder.select(Location(0, 0))
            .select(Location(2, 2))
            .select(Location(1, 0))
            .select(Location(1, 0))
            .select(Location(1, 1));
        assert_eq!(builder.selection(), &[Location(0, 0), Location(1, 0), Location(1, 1)]);

        builder.undo();
        assert_eq!(builder.selection(), &[Location(0, 0), Location(1, 0)]);

        builder.group_selection();
        assert!(builder.selection().is_empty());
        assert_eq!(builder.regions().len(), 1);
        assert!(builder.is_grouped(Location(1, 0)));

        // already grouped
        builder.select(Location(0, 0));
        assert!(builder.selection().is_empty());

        builder.undo();
        assert!(builder.regions().is_empty());
        assert_eq!(builder.is_valid(), None);
    }

    #[test]
    fn builder_invalid_states() {
        assert_eq!(BoardBuilder::with_size(3).is_valid(), Some(&vec![BuilderInvalidReason::SizeOutOfRange]));
        assert_eq!(BoardBuilder::with_size(36).build().unwrap_err(), vec![BuilderInvalidReason::SizeOutOfRange]);

        let mut builder = BoardBuilder::with_size(4);
        builder.select(Location(4, 0)).select(Location(0, 0));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));
        assert!(builder.selection().is_empty());

        let mut builder = BoardBuilder::with_size(4);
        builder.set_clue(0, 1);
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::RegionNotFound]));

        let mut builder = BoardBuilder::with_size(4);
        builder.add_region(&[Location(0, 0), Location(1, 0)], Some(1));
        assert_eq!(builder.build().unwrap_err(), vec![BuilderInvalidReason::Ungrouped]);
    }

    #[test]
    fn builder_clues_and_removal() {
        let mut builder = BoardBuilder::with_size(4);
        builder.add_region(&[Location(0, 0), Location(1, 0)], None)
            .add_region(&[Location(1, 0), Location(2, 0)], Some(0))
            .set_clue(0, 2);

        assert_eq!(builder.regions()[0].clue(), Some(2));
        // (1, 0) was taken by the first region
        assert_eq!(builder.regions()[1].cells(), &[Location(2, 0)]);
        assert_eq!(builder.regions()[1].clue(), Some(0));

        builder.clear_clue(0).remove_region(1);
        assert_eq!(builder.regions().len(), 1);
        assert_eq!(builder.regions()[0].clue(), None);
        assert!(!builder.is_grouped(Location(2, 0)));
        assert_eq!(builder.is_valid(), None);
    }

    #[test]
    fn board_display() {
        let board = column_board();

        assert_eq!(format!("{}", board), "+-+-+-+-+
|1|2  |1|
+ + + + +
| |   | |
+ + + + +
| |   | |
+ + + + +
| |   | |
+-+-+-+-+
");

        let solution = Solution::parse(&COLUMN_SOLUTION).unwrap();
        assert_eq!(board.render_solution(&solution), "+-+-+-+-+
|1|# .|1|
+ + + + +
|.|. .|#|
+ + + + +
|#|. .|.|
+ + + + +
|.|. #|.|
+-+-+-+-+
");
    }

    #[test]
    fn board_structure() {
        let board = column_board();

        assert_eq!(board.region_of(Location(0, 3)), 0);
        assert_eq!(board.region_of(Location(2, 1)), 1);
        assert_eq!(board.region(1).unwrap().anchor(), Location(1, 0));

        let flags = board.flags(Location(1, 1));
        assert!(flags.west && !flags.east && !flags.north && !flags.south);
        let flags = board.flags(Location(3, 3));
        assert!(flags.west && flags.east && !flags.north && flags.south);

        let borders = board.borders();
        assert_eq!(borders.len(), 8);
        assert!(borders.contains(&UnorderedPair::from((Location(1, 2), Location(0, 2)))));
        assert!(!borders.contains(&UnorderedPair::from((Location(1, 2), Location(2, 2)))));

        assert_eq!(board.visibility_run(Location(0, 1), SquareStep::Right),
                   Some(vec![Location(0, 1), Location(1, 1), Location(2, 1), Location(3, 1)]));
        assert_eq!(board.visibility_run(Location(2, 1), SquareStep::Right), None);
        assert_eq!(board.visibility_run(Location(0, 0), SquareStep::Down), None);
    }

    #[test]
    fn violations_of_colourings() {
        let board = column_board();

        let valid = Solution::parse(&COLUMN_SOLUTION).unwrap();
        assert_eq!(board.violations(&valid), Vec::<RuleViolation>::new());

        let white = Solution::parse(&["....", "....", "....", "...."]).unwrap();
        let violations = board.violations(&white);
        assert_eq!(violations.iter().filter(|v| matches!(v, RuleViolation::RegionCount { .. })).count(), 3);
        assert_eq!(violations.iter().filter(|v| matches!(v, RuleViolation::Visibility { .. })).count(), 4);
        assert!(!violations.contains(&RuleViolation::WhiteDisconnected));

        let cornered = Solution::parse(&[".#..", "#...", "..#.", "...#"]).unwrap();
        let violations = board.violations(&cornered);
        assert!(violations.contains(&RuleViolation::WhiteDisconnected));
        assert!(!violations.iter().any(|v| matches!(v, RuleViolation::AdjacentBlack(..))));

        let touching = Solution::parse(&["##..", "....", "....", "...."]).unwrap();
        assert!(board.violations(&touching).contains(&RuleViolation::AdjacentBlack(Location(0, 0), Location(1, 0))));
    }

    #[test]
    fn model_accepts_known_solution() {
        let board = column_board();
        let model = build_model(&board);

        let count = |kind| model.of_kind(kind).count();
        assert_eq!(count(ConstraintKind::SelectOne), 16);
        assert_eq!(count(ConstraintKind::RegionCount), 3);
        assert_eq!(count(ConstraintKind::AdjacentBlack), 16);
        assert_eq!(count(ConstraintKind::ConnectedWhite), 16);
        assert_eq!(count(ConstraintKind::Visibility), 4);

        let solution = Solution::parse(&COLUMN_SOLUTION).unwrap();
        let black = solution.black_cells().into_iter().collect::<HashSet<_>>();
        let value = |var: Var| {
            let (cell, shade) = (var.index() / 2, var.index() % 2);
            black.contains(&Location(cell % 4, cell / 4)) == (shade == 1)
        };
        for (kind, constraint) in &model.constraints {
            assert!(constraint.is_satisfied_by(value), "{} constraint {} rejects a valid solution", kind, constraint);
        }
    }

    #[test]
    fn solve_column_board() {
        let board = column_board();
        let report = board.solve(&SolveOptions::default()).unwrap();

        assert_eq!(report.status, SolveStatus::Optimal);
        assert!(report.candidates >= 1);
        assert!(format!("{}", report).starts_with("Solved in "));
        let solution = report.solution.unwrap();
        assert_eq!(board.violations(&solution), Vec::<RuleViolation>::new());
    }

    #[test]
    fn solve_quadrant_board_with_observer() {
        let board = quadrant_board();
        let mut recorder = Recorder::default();
        let report = board.solve_with(&SolveOptions::default(), &StopFlag::default(), &mut recorder).unwrap();

        assert_eq!(report.status, SolveStatus::Optimal);
        let solution = report.solution.unwrap();
        assert_eq!(board.violations(&solution), Vec::<RuleViolation>::new());
        assert_eq!(solution.black_cells().len(), 4);

        assert_eq!(recorder.candidates, report.candidates);
        let purged = recorder.structures.iter().filter(|(_, stage, _)| *stage == Stage::Purged).collect_vec();
        assert_eq!(purged.len(), report.lazy_constraints);
        assert!(purged.iter().all(|(_, _, cells)| cells.len() >= 2));
    }

    #[test]
    fn solve_infeasible() {
        let mut builder = BoardBuilder::with_size(4);
        for location in Grid::with_side(4).locations() {
            builder.select(location);
        }
        builder.group_selection().set_clue(0, 9);
        let board = builder.build().unwrap();

        let report = board.solve(&SolveOptions::default()).unwrap();
        assert_eq!(report.status, SolveStatus::Infeasible);
        assert!(report.solution.is_none());
        assert!(format!("{}", report).starts_with("Solution not found in "));
    }

    #[test]
    fn solve_out_of_time() {
        let report = column_board().solve(&SolveOptions { time_limit: Some(Duration::ZERO) }).unwrap();

        assert_eq!(report.status, SolveStatus::TimeLimit);
        assert_eq!(report.candidates, 0);
        assert!(report.solution.is_none());
    }

    #[test]
    fn solve_stopped_before_start() {
        let stop = StopFlag::default();
        stop.raise();
        let mut recorder = Recorder::default();

        let report = column_board().solve_with(&SolveOptions::default(), &stop, &mut recorder).unwrap();
        assert_eq!(report.status, SolveStatus::Stopped);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.lazy_constraints, 0);
        assert!(report.solution.is_none());
        assert!(recorder.structures.is_empty());
        assert!(format!("{}", report).starts_with("Stopped by user"));
    }

    #[test]
    fn template_round_trip() {
        let board = column_board();
        let template = Template::from_board(&board);

        assert_eq!(template.size, 4);
        assert_eq!(template.regions[1].cells[0], crate::template::TemplateCell { x: 1, y: 0, clue: Some(2) });
        assert!(template.regions.iter().all(|region| region.cells[1..].iter().all(|cell| cell.clue.is_none())));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columns.json");
        template.save(&path).unwrap();
        let loaded = Template::load(&path).unwrap();

        assert_eq!(loaded, template);
        assert_eq!(format!("{}", loaded.to_board().unwrap()), format!("{}", board));
    }

    #[test]
    fn template_from_json() {
        // the clue may sit on any cell, and cells may come in any order
        let json = r#"{ "size": 4, "regions": [
            { "cells": [ { "x": 0, "y": 1 }, { "x": 0, "y": 0, "clue": null }, { "x": 0, "y": 3, "clue": 1 }, { "x": 0, "y": 2 } ] },
            { "cells": [ { "x": 1, "y": 0 }, { "x": 1, "y": 1 }, { "x": 1, "y": 2 }, { "x": 1, "y": 3 },
                         { "x": 2, "y": 0 }, { "x": 2, "y": 1 }, { "x": 2, "y": 2 }, { "x": 2, "y": 3, "clue": 2 } ] },
            { "cells": [ { "x": 3, "y": 0, "clue": 1 }, { "x": 3, "y": 1 }, { "x": 3, "y": 2 }, { "x": 3, "y": 3 } ] }
        ] }"#;

        let board = Template::from_json(json).unwrap().to_board().unwrap();
        assert_eq!(format!("{}", board), format!("{}", column_board()));
    }

    #[test]
    fn template_errors() {
        let out_of_bounds = Template::from_json(r#"{ "size": 4, "regions": [ { "cells": [ { "x": 4, "y": 0 } ] } ] }"#).unwrap();
        assert!(matches!(out_of_bounds.to_board(), Err(HeyawakeError::Builder(reasons)) if reasons == vec![BuilderInvalidReason::FeatureOutOfBounds]));

        let partial = Template::from_json(r#"{ "size": 4, "regions": [ { "cells": [ { "x": 0, "y": 0 } ] } ] }"#).unwrap();
        assert!(matches!(partial.to_board(), Err(HeyawakeError::Builder(reasons)) if reasons == vec![BuilderInvalidReason::Ungrouped]));

        let empty = Template { size: 4, regions: vec![crate::template::TemplateRegion { cells: vec![] }] };
        assert!(matches!(empty.to_board(), Err(HeyawakeError::Template(_))));

        assert!(matches!(Template::from_json("{ \"size\": 4 }"), Err(HeyawakeError::Json(_))));
        assert!(matches!(Template::load("/nonexistent/heyawake.json"), Err(HeyawakeError::Io(_))));
    }

    #[test]
    fn regions_never_overlap() {
        let mut builder = BoardBuilder::with_size(4);
        builder.select(Location(0, 0))
            .add_region(&[Location(0, 0), Location(1, 0)], Some(1))
            .group_selection();
        assert_eq!(builder.regions()[0].cells(), &[Location(1, 0)]);
        assert_eq!(builder.regions()[1].cells(), &[Location(0, 0)]);

        let rest = Grid::with_side(4).locations().filter(|location| !builder.is_grouped(*location)).collect_vec();
        builder.add_region(&rest, None);
        let board = builder.build().unwrap();

        for location in board.grid().locations() {
            let owners = board.regions().iter().filter(|region| region.contains(location)).count();
            assert_eq!(owners, 1, "{} belongs to {} regions", location, owners);
            assert!(board.regions()[board.region_of(location)].contains(location));
        }
        assert_eq!(board.region_of(Location(0, 0)), 1);
    }

    #[test]
    fn template_with_shared_cell() {
        let mut template = Template::from_board(&column_board());
        // (1, 0) also belongs to the second region
        template.regions[0].cells.push(crate::template::TemplateCell { x: 1, y: 0, clue: None });

        assert!(matches!(template.to_board(), Err(HeyawakeError::Template(_))));
    }

    #[test]
    fn violations_of_wrong_size() {
        let board = column_board();
        let solution = Solution::parse(&[".....", ".....", ".....", ".....", "....."]).unwrap();

        assert_eq!(board.violations(&solution), vec![RuleViolation::SizeMismatch { expected: 4, found: 5 }]);
    }
}
