//! Breadth-first distance fields shared by generation and agent navigation.

use std::collections::VecDeque;

use maze_escape_core::{CellCoord, TileKind};

use crate::grid::Grid;

/// Distance recorded for tiles the search never reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Rule deciding which tiles a search may enter.
///
/// Maze generation and agent navigation disagree about generators, so every
/// caller names the rule it wants and fields remember which one built them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Passability {
    /// Everything except walls is open. Used by repair and feature placement.
    Maze,
    /// Walls and generators block; corridors, the exit and telepads are open.
    Agent,
}

impl Passability {
    /// Reports whether a tile of the provided kind may be entered.
    #[must_use]
    pub const fn allows(self, kind: TileKind) -> bool {
        match self {
            Self::Maze => !matches!(kind, TileKind::Wall),
            Self::Agent => matches!(kind, TileKind::Empty | TileKind::Exit | TileKind::Telepad),
        }
    }
}

/// Dense hop-count grid rooted at a single origin tile.
///
/// Distances default to [`UNREACHABLE`] for tiles the search could not enter,
/// so callers can tell walls and sealed pockets apart from open corridors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceField {
    width: u32,
    height: u32,
    origin: Option<CellCoord>,
    passability: Option<Passability>,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Builds a field over `grid` from `origin` under the provided policy.
    #[must_use]
    pub fn from_origin(grid: &Grid, origin: CellCoord, passability: Passability) -> Self {
        let mut field = Self::default();
        field.rebuild(grid, origin, passability);
        field
    }

    /// Rebuilds the field in place, reusing its allocation.
    pub fn rebuild(&mut self, grid: &Grid, origin: CellCoord, passability: Passability) {
        self.rebuild_with(grid.columns(), grid.rows(), origin, |cell| {
            !grid.is_passable(cell, passability)
        });
        self.passability = Some(passability);
    }

    /// Rebuilds the distances using a breadth-first search with an arbitrary
    /// blocking predicate.
    pub fn rebuild_with<F>(&mut self, width: u32, height: u32, origin: CellCoord, mut is_blocked: F)
    where
        F: FnMut(CellCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;
        self.origin = Some(origin);
        self.passability = None;

        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![UNREACHABLE; cell_count];
        } else {
            self.distances.fill(UNREACHABLE);
        }

        if origin.column() >= width || origin.row() >= height || is_blocked(origin) {
            return;
        }

        let mut queue = VecDeque::new();
        if let Some(index) = index(width_usize, origin) {
            self.distances[index] = 0;
            queue.push_back(origin);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(width_usize, cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for neighbor in neighbors(cell, width, height) {
                let Some(neighbor_index) = index(width_usize, neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                if is_blocked(neighbor) {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Width of the field in tiles.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in tiles.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tile the search started from.
    #[must_use]
    pub fn origin(&self) -> Option<CellCoord> {
        self.origin
    }

    /// Policy used to build the field, when it was built from a grid.
    #[must_use]
    pub fn passability(&self) -> Option<Passability> {
        self.passability
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[u32] {
        &self.distances
    }

    /// Distance captured for the provided tile, if it lies within the field.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        index(width, cell).and_then(|offset| self.distances.get(offset).copied())
    }

    /// Finite distance to the tile, or `None` when unreached or out of bounds.
    #[must_use]
    pub fn reachable_distance(&self, cell: CellCoord) -> Option<u32> {
        self.distance(cell).filter(|distance| *distance != UNREACHABLE)
    }

    /// Reports whether the search reached the tile.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.reachable_distance(cell).is_some()
    }

    /// Every reached tile in row-major order.
    pub fn reachable_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let width = self.width;
        self.distances
            .iter()
            .enumerate()
            .filter(|(_, distance)| **distance != UNREACHABLE)
            .filter_map(move |(offset, _)| {
                let width = usize::try_from(width).ok().filter(|width| *width > 0)?;
                let column = u32::try_from(offset % width).ok()?;
                let row = u32::try_from(offset / width).ok()?;
                Some(CellCoord::new(column, row))
            })
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_with_sets_origin_to_zero() {
        let mut field = DistanceField::default();

        field.rebuild_with(3, 4, CellCoord::new(1, 2), |_| false);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
        assert_eq!(field.distance(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut field = DistanceField::default();
        let wall = CellCoord::new(1, 1);

        field.rebuild_with(3, 4, CellCoord::new(1, 2), |cell| cell == wall);

        assert_eq!(field.distance(wall), Some(UNREACHABLE));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn policies_disagree_about_generators() {
        let grid = Grid::from_rows(&["#####", "#.G.#", "#####"]);
        let origin = CellCoord::new(1, 1);
        let far = CellCoord::new(3, 1);

        let maze = DistanceField::from_origin(&grid, origin, Passability::Maze);
        let agent = DistanceField::from_origin(&grid, origin, Passability::Agent);

        assert_eq!(maze.reachable_distance(far), Some(2));
        assert!(!agent.is_reachable(far));
        assert_eq!(agent.passability(), Some(Passability::Agent));
    }

    #[test]
    fn blocked_origin_reaches_nothing() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let field = DistanceField::from_origin(&grid, CellCoord::new(0, 0), Passability::Maze);
        assert_eq!(field.reachable_cells().count(), 0);
    }

    #[test]
    fn reachable_cells_lists_row_major() {
        let grid = Grid::from_rows(&["####", "#..#", "#.##", "####"]);
        let field = DistanceField::from_origin(&grid, CellCoord::new(1, 1), Passability::Agent);
        let cells: Vec<_> = field.reachable_cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(1, 2)
            ]
        );
    }
}
