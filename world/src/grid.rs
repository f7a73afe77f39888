//! Dense tile storage for a single maze.

use std::fmt;

use maze_escape_core::{CellCoord, Direction, TileKind};

use crate::navigation::Passability;

/// Row-major grid of tile kinds with a one-tile border.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// Creates a grid of the provided dimensions filled with `fill`.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, fill: TileKind) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![fill; capacity],
        }
    }

    /// Parses a grid from rows of tile glyphs (`#`, `.`, `E`, `G`, `T`).
    ///
    /// Unknown glyphs are read as walls. Rows shorter than the first row are
    /// padded with walls.
    #[must_use]
    pub fn from_rows(lines: &[&str]) -> Self {
        let rows = u32::try_from(lines.len()).unwrap_or(0);
        let columns = lines
            .first()
            .map_or(0, |line| u32::try_from(line.chars().count()).unwrap_or(0));
        let mut grid = Self::filled(columns, rows, TileKind::Wall);
        for (row, line) in lines.iter().enumerate() {
            for (column, glyph) in line.chars().enumerate() {
                let cell = CellCoord::new(column as u32, row as u32);
                grid.set(cell, kind_from_glyph(glyph));
            }
        }
        grid
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether the coordinate lies on the outermost ring.
    #[must_use]
    pub fn is_border(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.row() == 0
                || cell.column() + 1 == self.columns
                || cell.row() + 1 == self.rows)
    }

    /// Reports whether the coordinate lies strictly inside the border.
    #[must_use]
    pub fn is_interior(&self, cell: CellCoord) -> bool {
        self.contains(cell) && !self.is_border(cell)
    }

    /// Tile kind at the coordinate; anything outside the grid reads as a wall.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> TileKind {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(TileKind::Wall)
    }

    /// Reports whether the tile can be entered under the provided policy.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord, passability: Passability) -> bool {
        self.contains(cell) && passability.allows(self.kind(cell))
    }

    pub(crate) fn set(&mut self, cell: CellCoord, kind: TileKind) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = kind;
            }
        }
    }

    /// In-bounds orthogonal neighbours in canonical direction order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        let rows = self.rows;
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| cell.step(direction, 1, columns, rows))
    }

    /// Number of orthogonal neighbours passable under the provided policy.
    #[must_use]
    pub fn open_neighbors(&self, cell: CellCoord, passability: Passability) -> usize {
        self.neighbors(cell)
            .filter(|neighbor| self.is_passable(*neighbor, passability))
            .count()
    }

    /// Number of passable tiles among the eight surrounding tiles.
    #[must_use]
    pub fn open_surroundings(&self, cell: CellCoord, passability: Passability) -> usize {
        let mut count = 0;
        for dy in -1..=1_i64 {
            for dx in -1..=1_i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(neighbor) = cell.offset(dx, dy, self.columns, self.rows) {
                    if self.is_passable(neighbor, passability) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Every coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Number of tiles holding the provided kind.
    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|tile| **tile == kind).count()
    }

    /// Dense tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for column in 0..self.columns {
                write!(f, "{}", self.kind(CellCoord::new(column, row)).glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn kind_from_glyph(glyph: char) -> TileKind {
    match glyph {
        '.' | ' ' => TileKind::Empty,
        'E' => TileKind::Exit,
        'G' => TileKind::Generator,
        'T' => TileKind::Telepad,
        _ => TileKind::Wall,
    }
}
