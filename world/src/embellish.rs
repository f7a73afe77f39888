//! Topology passes that turn a perfect maze into something with loops.

use maze_escape_core::{CellCoord, Direction, TileKind};
use tracing::{debug, warn};

use crate::{
    grid::Grid,
    navigation::Passability,
    repair::{repair, RepairReport},
    rng::MazeRng,
};

const SIDE_PASSAGE_MIN_RUN: usize = 8;
const SIDE_PASSAGE_CHANCE: f64 = 0.35;
const SIDE_PASSAGE_DEPTH: u32 = 2;
const LOOP_CONNECTOR_CHANCE: f64 = 0.12;
const DEAD_END_TRIM_CHANCE: f64 = 0.5;
const WALL_REMOVAL_CHANCE: f64 = 0.03;
const WALL_REMOVAL_MAX_SURROUNDINGS: usize = 4;

/// Distance from a dead end to the tile that must already be open before the
/// wall between them is removed.
pub const DEAD_END_REJOIN_REACH: u32 = 2;

/// Tiles opened by each embellishment pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbellishReport {
    /// Walls opened next to long straight corridors.
    pub side_passages: usize,
    /// Walls opened between two opposite corridors.
    pub loop_connectors: usize,
    /// Dead ends reconnected to a neighbouring corridor.
    pub trimmed_dead_ends: usize,
    /// Isolated walls removed by the openness pass.
    pub removed_walls: usize,
    /// Repair outcome recorded after every pass that ran.
    pub repairs: Vec<RepairReport>,
    /// Set when a repair failed to converge and the remaining passes were skipped.
    pub aborted: bool,
}

type Pass = fn(&mut Grid, &mut MazeRng) -> usize;

/// Runs every embellishment pass in order, repairing connectivity after each.
pub(crate) fn embellish(grid: &mut Grid, rng: &mut MazeRng, spawn: CellCoord) -> EmbellishReport {
    let passes: [(&str, Pass); 4] = [
        ("side_passages", side_passages),
        ("loop_connectors", loop_connectors),
        ("dead_ends", trim_dead_ends),
        ("wall_removal", remove_walls),
    ];

    let mut report = EmbellishReport::default();
    for (index, (name, pass)) in passes.into_iter().enumerate() {
        let opened = pass(grid, rng);
        match index {
            0 => report.side_passages = opened,
            1 => report.loop_connectors = opened,
            2 => report.trimmed_dead_ends = opened,
            _ => report.removed_walls = opened,
        }

        let repaired = repair(grid, spawn);
        debug!(pass = name, opened, sealed = repaired.sealed, "embellishment pass finished");
        report.repairs.push(repaired);
        if !repaired.converged {
            warn!(pass = name, "repair did not converge; skipping remaining embellishment");
            report.aborted = true;
            break;
        }
    }
    report
}

/// Straight run of open tiles along one axis.
#[derive(Clone, Copy, Debug)]
struct Run {
    start: CellCoord,
    length: usize,
    along: Direction,
}

fn straight_runs(grid: &Grid) -> Vec<Run> {
    let mut runs = Vec::new();
    for row in 0..grid.rows() {
        let line = (0..grid.columns()).map(|column| CellCoord::new(column, row));
        collect_runs(grid, line, Direction::East, &mut runs);
    }
    for column in 0..grid.columns() {
        let line = (0..grid.rows()).map(|row| CellCoord::new(column, row));
        collect_runs(grid, line, Direction::South, &mut runs);
    }
    runs
}

fn collect_runs<I>(grid: &Grid, line: I, along: Direction, runs: &mut Vec<Run>)
where
    I: Iterator<Item = CellCoord>,
{
    let mut current: Option<Run> = None;
    for cell in line {
        if grid.is_passable(cell, Passability::Maze) {
            match current.as_mut() {
                Some(run) => run.length += 1,
                None => {
                    current = Some(Run {
                        start: cell,
                        length: 1,
                        along,
                    })
                }
            }
        } else if let Some(run) = current.take() {
            if run.length >= SIDE_PASSAGE_MIN_RUN {
                runs.push(run);
            }
        }
    }
    if let Some(run) = current {
        if run.length >= SIDE_PASSAGE_MIN_RUN {
            runs.push(run);
        }
    }
}

fn side_passages(grid: &mut Grid, rng: &mut MazeRng) -> usize {
    let mut opened = 0;
    for run in straight_runs(grid) {
        if !rng.chance(SIDE_PASSAGE_CHANCE) {
            continue;
        }
        let offset = rng.below(run.length) as u32;
        let Some(origin) = run.start.step(run.along, offset, grid.columns(), grid.rows()) else {
            continue;
        };
        let side = match (run.along, rng.chance(0.5)) {
            (Direction::East | Direction::West, true) => Direction::North,
            (Direction::East | Direction::West, false) => Direction::South,
            (_, true) => Direction::West,
            (_, false) => Direction::East,
        };

        for depth in 1..=SIDE_PASSAGE_DEPTH {
            let Some(cell) = origin.step(side, depth, grid.columns(), grid.rows()) else {
                break;
            };
            if !grid.is_interior(cell) || grid.kind(cell) != TileKind::Wall {
                break;
            }
            grid.set(cell, TileKind::Empty);
            opened += 1;
        }
    }
    opened
}

fn is_loop_connector(grid: &Grid, cell: CellCoord) -> bool {
    if !grid.is_interior(cell) || grid.kind(cell) != TileKind::Wall {
        return false;
    }
    let open = |direction: Direction| {
        cell.step(direction, 1, grid.columns(), grid.rows())
            .is_some_and(|neighbor| grid.kind(neighbor) == TileKind::Empty)
    };
    let wall = |direction: Direction| {
        cell.step(direction, 1, grid.columns(), grid.rows())
            .map_or(true, |neighbor| grid.kind(neighbor) == TileKind::Wall)
    };

    let horizontal = open(Direction::East)
        && open(Direction::West)
        && wall(Direction::North)
        && wall(Direction::South);
    let vertical = open(Direction::North)
        && open(Direction::South)
        && wall(Direction::East)
        && wall(Direction::West);
    horizontal || vertical
}

fn loop_connectors(grid: &mut Grid, rng: &mut MazeRng) -> usize {
    let cells: Vec<CellCoord> = grid.cells().collect();
    let mut opened = 0;
    for cell in cells {
        // Earlier openings in this pass can invalidate later candidates.
        if !is_loop_connector(grid, cell) {
            continue;
        }
        if rng.chance(LOOP_CONNECTOR_CHANCE) {
            grid.set(cell, TileKind::Empty);
            opened += 1;
        }
    }
    opened
}

fn trim_dead_ends(grid: &mut Grid, rng: &mut MazeRng) -> usize {
    let cells: Vec<CellCoord> = grid.cells().collect();
    let mut opened = 0;
    for cell in cells {
        if grid.kind(cell) != TileKind::Empty || grid.open_neighbors(cell, Passability::Maze) != 1 {
            continue;
        }

        let candidates: Vec<CellCoord> = Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                let wall = cell.step(direction, 1, grid.columns(), grid.rows())?;
                let beyond = cell.step(direction, DEAD_END_REJOIN_REACH, grid.columns(), grid.rows())?;
                let usable = grid.is_interior(wall)
                    && grid.kind(wall) == TileKind::Wall
                    && grid.is_passable(beyond, Passability::Maze);
                usable.then_some(wall)
            })
            .collect();
        if candidates.is_empty() || !rng.chance(DEAD_END_TRIM_CHANCE) {
            continue;
        }

        let wall = candidates[rng.below(candidates.len())];
        grid.set(wall, TileKind::Empty);
        opened += 1;
    }
    opened
}

fn remove_walls(grid: &mut Grid, rng: &mut MazeRng) -> usize {
    let cells: Vec<CellCoord> = grid.cells().collect();
    let mut opened = 0;
    for cell in cells {
        if !grid.is_interior(cell) || grid.kind(cell) != TileKind::Wall {
            continue;
        }
        if grid.open_neighbors(cell, Passability::Maze) < 2
            || grid.open_surroundings(cell, Passability::Maze) > WALL_REMOVAL_MAX_SURROUNDINGS
        {
            continue;
        }
        if rng.chance(WALL_REMOVAL_CHANCE) {
            grid.set(cell, TileKind::Empty);
            opened += 1;
        }
    }
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{carve::carve_passages, navigation::DistanceField};

    #[test]
    fn long_corridors_are_detected_on_both_axes() {
        let grid = Grid::from_rows(&[
            "############", //
            "#..........#", //
            "#.##########", //
            "#.##########", //
            "#.##########", //
            "#.##########", //
            "#.##########", //
            "#.##########", //
            "#.##########", //
            "############",
        ]);
        let runs = straight_runs(&grid);
        assert_eq!(runs.len(), 2);
        assert!(runs
            .iter()
            .any(|run| run.along == Direction::East && run.length == 10));
        assert!(runs
            .iter()
            .any(|run| run.along == Direction::South && run.length == 8));
    }

    #[test]
    fn loop_connector_needs_opposite_corridors() {
        let grid = Grid::from_rows(&[
            "#####", //
            "#.#.#", //
            "#.#.#", //
            "#...#", //
            "#####",
        ]);
        assert!(is_loop_connector(&grid, CellCoord::new(2, 1)));
        assert!(!is_loop_connector(&grid, CellCoord::new(2, 2)));
        assert!(!is_loop_connector(&grid, CellCoord::new(2, 3)));
    }

    #[test]
    fn embellished_maze_stays_connected() {
        let spawn = CellCoord::new(1, 1);
        let mut grid = Grid::filled(31, 31, TileKind::Wall);
        let mut rng = MazeRng::new(42);
        carve_passages(&mut grid, &mut rng, spawn);
        let before = grid.count(TileKind::Empty);

        let report = embellish(&mut grid, &mut rng, spawn);
        assert!(!report.aborted);
        assert_eq!(report.repairs.len(), 4);
        assert!(grid.count(TileKind::Empty) >= before);

        let field = DistanceField::from_origin(&grid, spawn, Passability::Maze);
        for cell in grid.cells() {
            if grid.is_passable(cell, Passability::Maze) {
                assert!(field.is_reachable(cell), "{cell:?} is stranded");
            }
            if grid.is_border(cell) {
                assert_eq!(grid.kind(cell), TileKind::Wall);
            }
        }
    }
}
