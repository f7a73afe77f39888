#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic pathfinding and continuous movement for maze agents.
//!
//! Agents pick a discrete target tile with one of the planners in this crate
//! (a single gradient step on a cached distance field, its mirrored ascent for
//! fleeing, or a full A* route) and then glide toward it with [`Motion`].

mod motion;
mod path;

use maze_escape_core::CellCoord;
use maze_escape_world::{DistanceField, Grid, Passability};

pub use motion::{thaw_factor, Advance, Motion, SpeedModifiers, THAW_WINDOW};
pub use path::find_path;

/// Returns the first neighbour, in canonical direction order, whose distance
/// is strictly smaller than the distance recorded for `cell`.
#[must_use]
pub fn gradient_step(
    field: &DistanceField,
    grid: &Grid,
    cell: CellCoord,
    passability: Passability,
) -> Option<CellCoord> {
    let current = field.reachable_distance(cell)?;
    grid.neighbors(cell).find(|neighbor| {
        grid.is_passable(*neighbor, passability)
            && field
                .reachable_distance(*neighbor)
                .is_some_and(|distance| distance < current)
    })
}

/// Mirror of [`gradient_step`] used by fleeing agents.
///
/// Picks the passable neighbour with the largest reachable distance. A strict
/// increase wins over a sideways move; a neighbour closer to the origin is
/// never returned. Ties keep the earliest neighbour in canonical order.
#[must_use]
pub fn ascent_step(
    field: &DistanceField,
    grid: &Grid,
    cell: CellCoord,
    passability: Passability,
) -> Option<CellCoord> {
    let current = field.reachable_distance(cell);
    let mut best: Option<Candidate> = None;

    for neighbor in grid.neighbors(cell) {
        if !grid.is_passable(neighbor, passability) {
            continue;
        }
        let Some(distance) = field.reachable_distance(neighbor) else {
            continue;
        };
        if current.is_some_and(|current| distance < current) {
            continue;
        }

        let candidate = Candidate {
            cell: neighbor,
            distance,
        };
        best = Some(match best {
            Some(existing) if !candidate.is_farther_than(existing) => existing,
            _ => candidate,
        });
    }

    best.map(|candidate| candidate.cell)
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: CellCoord,
    distance: u32,
}

impl Candidate {
    fn is_farther_than(self, other: Candidate) -> bool {
        self.distance > other.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        Grid::from_rows(&[
            "#######", //
            "#.....#", //
            "#.###.#", //
            "#.....#", //
            "#######",
        ])
    }

    #[test]
    fn gradient_prefers_canonical_order_among_equals() {
        let grid = Grid::from_rows(&["#####", "#...#", "#...#", "#...#", "#####"]);
        let field = DistanceField::from_origin(&grid, CellCoord::new(3, 3), Passability::Agent);
        let next = gradient_step(&field, &grid, CellCoord::new(1, 1), Passability::Agent);
        assert_eq!(next, Some(CellCoord::new(2, 1)));
    }

    #[test]
    fn gradient_stops_at_origin() {
        let grid = corridor();
        let origin = CellCoord::new(5, 3);
        let field = DistanceField::from_origin(&grid, origin, Passability::Agent);
        assert_eq!(gradient_step(&field, &grid, origin, Passability::Agent), None);
    }

    #[test]
    fn gradient_walks_the_shortest_route() {
        let grid = corridor();
        let origin = CellCoord::new(5, 3);
        let field = DistanceField::from_origin(&grid, origin, Passability::Agent);
        let mut cell = CellCoord::new(1, 1);
        let mut steps = 0;
        while let Some(next) = gradient_step(&field, &grid, cell, Passability::Agent) {
            cell = next;
            steps += 1;
        }
        assert_eq!(cell, origin);
        assert_eq!(steps, 6);
    }

    #[test]
    fn gradient_ignores_unreachable_start() {
        let grid = corridor();
        let field = DistanceField::from_origin(&grid, CellCoord::new(1, 1), Passability::Agent);
        assert_eq!(
            gradient_step(&field, &grid, CellCoord::new(3, 2), Passability::Agent),
            None
        );
    }

    #[test]
    fn ascent_moves_away_from_origin() {
        let grid = corridor();
        let origin = CellCoord::new(1, 1);
        let field = DistanceField::from_origin(&grid, origin, Passability::Agent);
        let next = ascent_step(&field, &grid, CellCoord::new(2, 1), Passability::Agent);
        assert_eq!(next, Some(CellCoord::new(3, 1)));
    }

    #[test]
    fn ascent_never_steps_closer() {
        let grid = Grid::from_rows(&["#####", "#...#", "#####"]);
        let field = DistanceField::from_origin(&grid, CellCoord::new(1, 1), Passability::Agent);
        assert_eq!(
            ascent_step(&field, &grid, CellCoord::new(3, 1), Passability::Agent),
            None
        );
    }
}
