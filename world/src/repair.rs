//! Connectivity repair: bridges or seals pockets unreachable from spawn.

use std::collections::VecDeque;

use maze_escape_core::{CellCoord, Direction, TileKind};
use tracing::warn;

use crate::{
    grid::Grid,
    navigation::{DistanceField, Passability},
};

/// Upper bound on bridge/seal rounds before leftovers are sealed outright.
pub const MAX_REPAIR_ATTEMPTS: usize = 100;

/// Summary of a single repair run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Number of rounds that found at least one unreachable pocket.
    pub rounds: usize,
    /// Walls opened to reconnect pockets.
    pub bridged: usize,
    /// Open tiles turned back into walls.
    pub sealed: usize,
    /// Whether the grid was fully connected before the attempt cap ran out.
    pub converged: bool,
    /// Whether a bottom/right border candidate had to be forced open.
    pub opened_border: bool,
}

/// Guarantees every open tile is reachable from `spawn` and that the
/// bottom/right inner ring holds at least one reachable open tile.
pub(crate) fn repair(grid: &mut Grid, spawn: CellCoord) -> RepairReport {
    let mut report = RepairReport::default();
    if grid.kind(spawn) == TileKind::Wall && grid.is_interior(spawn) {
        grid.set(spawn, TileKind::Empty);
    }

    for attempt in 0..=MAX_REPAIR_ATTEMPTS {
        let field = DistanceField::from_origin(grid, spawn, Passability::Maze);
        let pockets = unreachable_pockets(grid, &field);
        if pockets.is_empty() {
            report.converged = true;
            break;
        }

        if attempt == MAX_REPAIR_ATTEMPTS {
            let sealed: usize = pockets.iter().map(Vec::len).sum();
            for pocket in &pockets {
                seal(grid, pocket);
            }
            report.sealed += sealed;
            warn!(
                sealed,
                attempts = MAX_REPAIR_ATTEMPTS,
                "connectivity repair hit its attempt cap; sealing leftovers"
            );
            break;
        }

        report.rounds += 1;
        for pocket in &pockets {
            match bridge_candidate(grid, &field, pocket) {
                Some(bridge) => {
                    grid.set(bridge, TileKind::Empty);
                    report.bridged += 1;
                }
                None => {
                    seal(grid, pocket);
                    report.sealed += pocket.len();
                }
            }
        }
    }

    report.opened_border = ensure_border_candidate(grid, spawn);
    report
}

/// Opens a reachable tile on the inner ring next to the bottom or right
/// border when none exists yet. Returns whether anything was opened.
pub(crate) fn ensure_border_candidate(grid: &mut Grid, spawn: CellCoord) -> bool {
    let field = DistanceField::from_origin(grid, spawn, Passability::Maze);
    let on_ring = |cell: CellCoord| {
        grid.is_interior(cell)
            && (cell.row() + 2 == grid.rows() || cell.column() + 2 == grid.columns())
    };

    if grid
        .cells()
        .any(|cell| on_ring(cell) && grid.kind(cell) == TileKind::Empty && field.is_reachable(cell))
    {
        return false;
    }

    let mut best: Option<CellCoord> = None;
    for cell in grid.cells() {
        if !on_ring(cell) || grid.kind(cell) != TileKind::Wall {
            continue;
        }
        if !grid.neighbors(cell).any(|neighbor| field.is_reachable(neighbor)) {
            continue;
        }
        let better = best.map_or(true, |current| score(cell) > score(current));
        if better {
            best = Some(cell);
        }
    }

    if let Some(cell) = best {
        grid.set(cell, TileKind::Empty);
        return true;
    }

    // Nothing on the ring touches the reachable region: dig straight down from
    // the reachable tile closest to the bottom-right corner.
    let Some(start) = field
        .reachable_cells()
        .fold(None, |best: Option<CellCoord>, cell| match best {
            Some(current) if score(current) >= score(cell) => Some(current),
            _ => Some(cell),
        })
    else {
        return false;
    };

    let mut cursor = start;
    let mut opened = false;
    while cursor.row() + 2 < grid.rows() {
        let Some(next) = cursor.step(Direction::South, 1, grid.columns(), grid.rows()) else {
            break;
        };
        if !grid.is_interior(next) {
            break;
        }
        if grid.kind(next) == TileKind::Wall {
            grid.set(next, TileKind::Empty);
            opened = true;
        }
        cursor = next;
    }
    opened
}

fn score(cell: CellCoord) -> u32 {
    cell.column() + cell.row()
}

/// Groups unreachable open tiles into 4-connected pockets in row-major
/// discovery order.
fn unreachable_pockets(grid: &Grid, field: &DistanceField) -> Vec<Vec<CellCoord>> {
    let mut assigned = vec![false; grid.tiles().len()];
    let mut pockets = Vec::new();

    for cell in grid.cells() {
        let Some(index) = grid.index(cell) else {
            continue;
        };
        if assigned[index] || !is_stranded(grid, field, cell) {
            continue;
        }

        let mut pocket = Vec::new();
        let mut queue = VecDeque::from([cell]);
        assigned[index] = true;
        while let Some(current) = queue.pop_front() {
            pocket.push(current);
            for neighbor in grid.neighbors(current) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if assigned[neighbor_index] || !is_stranded(grid, field, neighbor) {
                    continue;
                }
                assigned[neighbor_index] = true;
                queue.push_back(neighbor);
            }
        }
        pocket.sort_by_key(|cell| (cell.row(), cell.column()));
        pockets.push(pocket);
    }

    pockets
}

fn is_stranded(grid: &Grid, field: &DistanceField, cell: CellCoord) -> bool {
    grid.is_passable(cell, Passability::Maze) && !field.is_reachable(cell)
}

fn bridge_candidate(grid: &Grid, field: &DistanceField, pocket: &[CellCoord]) -> Option<CellCoord> {
    pocket.iter().find_map(|cell| {
        grid.neighbors(*cell).find(|wall| {
            grid.is_interior(*wall)
                && grid.kind(*wall) == TileKind::Wall
                && grid
                    .neighbors(*wall)
                    .any(|neighbor| field.is_reachable(neighbor))
        })
    })
}

fn seal(grid: &mut Grid, pocket: &[CellCoord]) {
    for cell in pocket {
        grid.set(*cell, TileKind::Wall);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fully_connected(grid: &Grid, spawn: CellCoord) -> bool {
        let field = DistanceField::from_origin(grid, spawn, Passability::Maze);
        grid.cells()
            .filter(|cell| grid.is_passable(*cell, Passability::Maze))
            .all(|cell| field.is_reachable(cell))
    }

    #[test]
    fn single_wall_pocket_is_bridged() {
        let mut grid = Grid::from_rows(&[
            "#######", //
            "#..#..#", //
            "#..#..#", //
            "#######",
        ]);
        let report = repair(&mut grid, CellCoord::new(1, 1));
        assert!(report.converged);
        assert_eq!(report.bridged, 1);
        assert_eq!(report.sealed, 0);
        assert_eq!(grid.kind(CellCoord::new(3, 1)), TileKind::Empty);
        assert!(fully_connected(&grid, CellCoord::new(1, 1)));
    }

    #[test]
    fn distant_pocket_is_sealed() {
        let mut grid = Grid::from_rows(&[
            "#########", //
            "#..###..#", //
            "#..###..#", //
            "#########",
        ]);
        let report = repair(&mut grid, CellCoord::new(1, 1));
        assert!(report.converged);
        assert_eq!(report.sealed, 4);
        assert_eq!(grid.kind(CellCoord::new(6, 1)), TileKind::Wall);
        assert!(fully_connected(&grid, CellCoord::new(1, 1)));
    }

    #[test]
    fn border_candidate_is_forced_open() {
        let mut grid = Grid::from_rows(&[
            "######", //
            "#...##", //
            "#...##", //
            "######", //
            "######",
        ]);
        let opened = ensure_border_candidate(&mut grid, CellCoord::new(1, 1));
        assert!(opened);
        assert_eq!(grid.kind(CellCoord::new(4, 2)), TileKind::Empty);
        assert!(fully_connected(&grid, CellCoord::new(1, 1)));
    }

    #[test]
    fn existing_border_candidate_is_left_alone() {
        let mut grid = Grid::from_rows(&["#####", "#...#", "#...#", "#####"]);
        let before = grid.clone();
        assert!(!ensure_border_candidate(&mut grid, CellCoord::new(1, 1)));
        assert_eq!(grid, before);
    }
}
