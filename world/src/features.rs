//! Placement of the exit, generators and telepads on a repaired grid.

use maze_escape_core::{CellCoord, TileKind};
use tracing::debug;

use crate::{
    grid::Grid,
    navigation::{DistanceField, Passability},
    repair::ensure_border_candidate,
    rng::MazeRng,
    search::{fractional_anchor, nearest_matching},
};

const GENERATOR_ANCHORS: [(f32, f32); 3] = [(0.8, 0.2), (0.2, 0.8), (0.5, 0.5)];
const GENERATOR_JITTER: u32 = 1;
const GENERATOR_SPACING: [u32; 6] = [10, 8, 6, 4, 2, 1];

/// Marks the exit on the reachable inner-ring tile farthest toward the
/// bottom-right corner.
pub(crate) fn place_exit(grid: &mut Grid, spawn: CellCoord) -> CellCoord {
    let exit = match exit_candidate(grid, spawn) {
        Some(cell) => cell,
        None => {
            let _ = ensure_border_candidate(grid, spawn);
            exit_candidate(grid, spawn).unwrap_or_else(|| farthest_reachable(grid, spawn))
        }
    };
    grid.set(exit, TileKind::Exit);
    exit
}

fn exit_candidate(grid: &Grid, spawn: CellCoord) -> Option<CellCoord> {
    let field = DistanceField::from_origin(grid, spawn, Passability::Maze);
    let on_inner_ring = |cell: CellCoord| {
        grid.is_interior(cell)
            && (cell.column() == 1
                || cell.row() == 1
                || cell.column() + 2 == grid.columns()
                || cell.row() + 2 == grid.rows())
    };
    best_by_score(
        grid.cells().filter(|cell| {
            on_inner_ring(*cell)
                && *cell != spawn
                && grid.kind(*cell) == TileKind::Empty
                && field.is_reachable(*cell)
        }),
    )
}

fn farthest_reachable(grid: &Grid, spawn: CellCoord) -> CellCoord {
    let field = DistanceField::from_origin(grid, spawn, Passability::Maze);
    best_by_score(
        field
            .reachable_cells()
            .filter(|cell| grid.kind(*cell) == TileKind::Empty),
    )
    .unwrap_or(spawn)
}

/// Highest `column + row`; the first cell in iteration order wins ties.
fn best_by_score<I>(cells: I) -> Option<CellCoord>
where
    I: Iterator<Item = CellCoord>,
{
    cells.fold(None, |best, cell| match best {
        Some(current) if score(current) >= score(cell) => Some(current),
        _ => Some(cell),
    })
}

fn score(cell: CellCoord) -> u32 {
    cell.column() + cell.row()
}

/// Embeds up to `count` generators in walls that border reachable corridors.
pub(crate) fn place_generators(
    grid: &mut Grid,
    rng: &mut MazeRng,
    spawn: CellCoord,
    count: usize,
) -> Vec<CellCoord> {
    if count == 0 {
        return Vec::new();
    }

    let field = DistanceField::from_origin(grid, spawn, Passability::Maze);
    let chosen = if count == GENERATOR_ANCHORS.len() {
        anchored_generators(grid, rng, &field)
    } else {
        spaced_generators(grid, rng, &field, count)
    };

    for cell in &chosen {
        grid.set(*cell, TileKind::Generator);
    }
    if chosen.len() < count {
        debug!(requested = count, placed = chosen.len(), "generator placement fell short");
    }
    chosen
}

fn is_generator_site(grid: &Grid, field: &DistanceField, cell: CellCoord) -> bool {
    grid.is_interior(cell)
        && grid.kind(cell) == TileKind::Wall
        && grid
            .neighbors(cell)
            .any(|neighbor| grid.kind(neighbor) == TileKind::Empty && field.is_reachable(neighbor))
}

fn anchored_generators(grid: &Grid, rng: &mut MazeRng, field: &DistanceField) -> Vec<CellCoord> {
    let mut chosen = Vec::with_capacity(GENERATOR_ANCHORS.len());
    for (fx, fy) in GENERATOR_ANCHORS {
        let jitter = (rng.jitter(GENERATOR_JITTER), rng.jitter(GENERATOR_JITTER));
        let anchor = fractional_anchor(grid.columns(), grid.rows(), fx, fy, jitter);
        let found = nearest_matching(grid.columns(), grid.rows(), anchor, |cell| {
            !chosen.contains(&cell) && is_generator_site(grid, field, cell)
        });
        if let Some(cell) = found {
            chosen.push(cell);
        }
    }
    chosen
}

fn spaced_generators(
    grid: &Grid,
    rng: &mut MazeRng,
    field: &DistanceField,
    count: usize,
) -> Vec<CellCoord> {
    let mut candidates: Vec<CellCoord> = grid
        .cells()
        .filter(|cell| is_generator_site(grid, field, *cell))
        .collect();
    rng.shuffle(&mut candidates);

    let mut chosen: Vec<CellCoord> = Vec::with_capacity(count);
    for spacing in GENERATOR_SPACING {
        for candidate in &candidates {
            if chosen.len() >= count {
                return chosen;
            }
            if chosen.contains(candidate) {
                continue;
            }
            if chosen
                .iter()
                .all(|existing| existing.manhattan_distance(*candidate) >= spacing)
            {
                chosen.push(*candidate);
            }
        }
    }
    chosen
}

/// Places one pair of telepads near the left and right edges, or nothing when
/// two distinct reachable tiles cannot be found.
pub(crate) fn place_telepads(grid: &mut Grid, spawn: CellCoord, exit: CellCoord) -> Vec<CellCoord> {
    let field = DistanceField::from_origin(grid, spawn, Passability::Agent);
    let middle_row = grid.rows() / 2;
    let targets = [
        CellCoord::new(2, middle_row),
        CellCoord::new(grid.columns().saturating_sub(3), middle_row),
    ];

    let mut pads: Vec<CellCoord> = Vec::with_capacity(targets.len());
    for target in targets {
        let found = nearest_matching(grid.columns(), grid.rows(), target, |cell| {
            cell != exit
                && cell != spawn
                && !pads.contains(&cell)
                && grid.kind(cell) == TileKind::Empty
                && field.is_reachable(cell)
        });
        match found {
            Some(cell) => pads.push(cell),
            None => {
                debug!(?target, "no reachable tile for telepad; skipping telepads");
                return Vec::new();
            }
        }
    }

    for pad in &pads {
        grid.set(*pad, TileKind::Telepad);
    }
    pads
}
