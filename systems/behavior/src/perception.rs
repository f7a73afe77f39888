//! Line-of-sight checks.

use maze_escape_core::{CellCoord, Direction};
use maze_escape_world::MazeState;

/// Casts a straight ray from `origin` along `facing` for up to `range` tiles
/// and reports whether it reaches `target` before hitting a tile agents
/// cannot walk on.
pub(crate) fn sees_along(
    maze: &MazeState,
    origin: CellCoord,
    facing: Direction,
    range: u32,
    target: CellCoord,
) -> bool {
    if origin == target {
        return true;
    }
    let grid = maze.grid();
    for distance in 1..=range {
        let Some(cell) = origin.step(facing, distance, grid.columns(), grid.rows()) else {
            return false;
        };
        if !maze.is_walkable(cell) {
            return false;
        }
        if cell == target {
            return true;
        }
    }
    false
}
