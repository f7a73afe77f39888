//! Recursive-backtracking corridor carver.

use maze_escape_core::{CellCoord, Direction, TileKind};

use crate::{grid::Grid, navigation::Passability, rng::MazeRng};

const SCATTER_ATTEMPTS_PER_OPENING: usize = 20;

#[derive(Clone, Copy, Debug)]
struct Frame {
    cell: CellCoord,
    directions: [Direction; 4],
    next: usize,
}

impl Frame {
    fn enter(cell: CellCoord, rng: &mut MazeRng) -> Self {
        let mut directions = Direction::ALL;
        rng.shuffle(&mut directions);
        Self {
            cell,
            directions,
            next: 0,
        }
    }
}

/// Carves a perfect maze from `start` by stepping two tiles at a time.
///
/// The frame stack replays the recursive formulation exactly: directions are
/// shuffled on entry to a tile and tried in that order once the descent into
/// each earlier direction has returned.
pub(crate) fn carve_passages(grid: &mut Grid, rng: &mut MazeRng, start: CellCoord) {
    if !grid.is_interior(start) {
        return;
    }

    grid.set(start, TileKind::Empty);
    let mut stack = vec![Frame::enter(start, rng)];

    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.directions.len() {
            let _ = stack.pop();
            continue;
        }

        let direction = frame.directions[frame.next];
        frame.next += 1;
        let cell = frame.cell;

        let Some(target) = cell.step(direction, 2, grid.columns(), grid.rows()) else {
            continue;
        };
        if !grid.is_interior(target) || grid.kind(target) != TileKind::Wall {
            continue;
        }
        let Some(between) = cell.step(direction, 1, grid.columns(), grid.rows()) else {
            continue;
        };

        grid.set(between, TileKind::Empty);
        grid.set(target, TileKind::Empty);
        stack.push(Frame::enter(target, rng));
    }
}

/// Opens up to `count` interior walls that already touch two open tiles.
///
/// Sampling is restricted to the interior, so the border can never be opened.
pub(crate) fn scatter_openings(grid: &mut Grid, rng: &mut MazeRng, count: usize) -> usize {
    let interior_columns = usize::try_from(grid.columns().saturating_sub(2)).unwrap_or(0);
    let interior_rows = usize::try_from(grid.rows().saturating_sub(2)).unwrap_or(0);
    if interior_columns == 0 || interior_rows == 0 {
        return 0;
    }

    let mut opened = 0;
    for _ in 0..count.saturating_mul(SCATTER_ATTEMPTS_PER_OPENING) {
        if opened >= count {
            break;
        }
        let column = 1 + rng.below(interior_columns) as u32;
        let row = 1 + rng.below(interior_rows) as u32;
        let cell = CellCoord::new(column, row);
        if grid.kind(cell) != TileKind::Wall {
            continue;
        }
        if grid.open_neighbors(cell, Passability::Maze) >= 2 {
            grid.set(cell, TileKind::Empty);
            opened += 1;
        }
    }
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::DistanceField;

    fn carved(seed: u32) -> Grid {
        let mut grid = Grid::filled(21, 15, TileKind::Wall);
        let mut rng = MazeRng::new(seed);
        carve_passages(&mut grid, &mut rng, CellCoord::new(1, 1));
        grid
    }

    #[test]
    fn carving_visits_every_odd_cell() {
        let grid = carved(3);
        for row in (1..14).step_by(2) {
            for column in (1..20).step_by(2) {
                assert_eq!(
                    grid.kind(CellCoord::new(column, row)),
                    TileKind::Empty,
                    "cell ({column}, {row}) was not carved"
                );
            }
        }
    }

    #[test]
    fn carving_produces_a_spanning_tree() {
        let grid = carved(11);
        let open = grid.count(TileKind::Empty);
        let mut edges = 0;
        for cell in grid.cells() {
            if grid.kind(cell) == TileKind::Empty {
                edges += grid
                    .neighbors(cell)
                    .filter(|neighbor| grid.kind(*neighbor) == TileKind::Empty)
                    .count();
            }
        }
        assert_eq!(edges / 2, open - 1, "a tree has exactly n - 1 edges");

        let field = DistanceField::from_origin(&grid, CellCoord::new(1, 1), Passability::Maze);
        assert_eq!(field.reachable_cells().count(), open);
    }

    #[test]
    fn carving_never_touches_the_border() {
        let grid = carved(5);
        for cell in grid.cells().filter(|cell| grid.is_border(*cell)) {
            assert_eq!(grid.kind(cell), TileKind::Wall);
        }
    }

    #[test]
    fn scatter_openings_keep_border_intact() {
        let mut grid = carved(8);
        let mut rng = MazeRng::new(99);
        let before = grid.count(TileKind::Empty);
        let opened = scatter_openings(&mut grid, &mut rng, 6);
        assert!(opened <= 6);
        assert_eq!(grid.count(TileKind::Empty), before + opened);
        for cell in grid.cells().filter(|cell| grid.is_border(*cell)) {
            assert_eq!(grid.kind(cell), TileKind::Wall);
        }
    }
}
