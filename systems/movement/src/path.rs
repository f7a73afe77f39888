//! A* search over the tile grid.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use maze_escape_core::CellCoord;
use maze_escape_world::{Grid, Passability};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    estimate: u32,
    heuristic: u32,
    sequence: u64,
    cell: CellCoord,
}

impl Ord for OpenNode {
    // Reversed so the max-heap pops the lowest estimate; remaining ties go to
    // the node closest to the goal, then to the node pushed first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds a shortest 4-connected route from `start` to `goal`.
///
/// The returned tiles exclude `start` and end with `goal`; the route is empty
/// when both coincide. Returns `None` when the goal cannot be entered or no
/// route exists. The start tile itself is never checked for passability so an
/// agent displaced onto a blocked tile can still plan its way out.
#[must_use]
pub fn find_path(
    grid: &Grid,
    start: CellCoord,
    goal: CellCoord,
    passability: Passability,
) -> Option<Vec<CellCoord>> {
    if !grid.contains(start) || !grid.is_passable(goal, passability) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut open = BinaryHeap::new();
    let mut best_cost: HashMap<CellCoord, u32> = HashMap::new();
    let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
    let mut sequence = 0_u64;

    let _ = best_cost.insert(start, 0);
    open.push(OpenNode {
        estimate: start.manhattan_distance(goal),
        heuristic: start.manhattan_distance(goal),
        sequence,
        cell: start,
    });

    while let Some(node) = open.pop() {
        if node.cell == goal {
            return Some(reconstruct(&came_from, start, goal));
        }

        let Some(cost) = best_cost.get(&node.cell).copied() else {
            continue;
        };
        if node.estimate > cost + node.heuristic {
            continue;
        }

        for neighbor in grid.neighbors(node.cell) {
            if !grid.is_passable(neighbor, passability) {
                continue;
            }
            let next_cost = cost + 1;
            if best_cost
                .get(&neighbor)
                .is_some_and(|known| *known <= next_cost)
            {
                continue;
            }

            let _ = best_cost.insert(neighbor, next_cost);
            let _ = came_from.insert(neighbor, node.cell);
            sequence += 1;
            let heuristic = neighbor.manhattan_distance(goal);
            open.push(OpenNode {
                estimate: next_cost + heuristic,
                heuristic,
                sequence,
                cell: neighbor,
            });
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<CellCoord, CellCoord>,
    start: CellCoord,
    goal: CellCoord,
) -> Vec<CellCoord> {
    let mut route = vec![goal];
    let mut cursor = goal;
    while let Some(previous) = came_from.get(&cursor).copied() {
        if previous == start {
            break;
        }
        route.push(previous);
        cursor = previous;
    }
    route.reverse();
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_escape_world::DistanceField;

    fn maze() -> Grid {
        Grid::from_rows(&[
            "#########", //
            "#.......#", //
            "#.#####.#", //
            "#.#...#.#", //
            "#.#.#.#.#", //
            "#...#...#", //
            "#########",
        ])
    }

    #[test]
    fn route_length_matches_breadth_first_distance() {
        let grid = maze();
        let start = CellCoord::new(1, 1);
        let field = DistanceField::from_origin(&grid, start, Passability::Agent);
        for goal in field.reachable_cells().collect::<Vec<_>>() {
            let route = find_path(&grid, start, goal, Passability::Agent).expect("reachable");
            assert_eq!(route.len() as u32, field.distance(goal).unwrap_or(u32::MAX));
            assert_eq!(route.last().copied().unwrap_or(start), goal);
        }
    }

    #[test]
    fn route_steps_are_adjacent_and_open() {
        let grid = maze();
        let start = CellCoord::new(1, 1);
        let route = find_path(&grid, start, CellCoord::new(3, 3), Passability::Agent)
            .expect("reachable");
        let mut previous = start;
        for cell in route {
            assert_eq!(previous.manhattan_distance(cell), 1);
            assert!(grid.is_passable(cell, Passability::Agent));
            previous = cell;
        }
    }

    #[test]
    fn start_equal_to_goal_is_empty() {
        let grid = maze();
        let cell = CellCoord::new(1, 1);
        assert_eq!(find_path(&grid, cell, cell, Passability::Agent), Some(Vec::new()));
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let grid = Grid::from_rows(&["#######", "#..#..#", "#######"]);
        assert_eq!(
            find_path(&grid, CellCoord::new(1, 1), CellCoord::new(4, 1), Passability::Agent),
            None
        );
        assert_eq!(
            find_path(&grid, CellCoord::new(1, 1), CellCoord::new(3, 1), Passability::Agent),
            None
        );
    }

    #[test]
    fn generators_block_agents_but_not_maze_searches() {
        let grid = Grid::from_rows(&["#####", "#.G.#", "#####"]);
        let start = CellCoord::new(1, 1);
        let goal = CellCoord::new(3, 1);
        assert_eq!(find_path(&grid, start, goal, Passability::Agent), None);
        assert_eq!(
            find_path(&grid, start, goal, Passability::Maze),
            Some(vec![CellCoord::new(2, 1), goal])
        );
    }

    #[test]
    fn search_is_deterministic() {
        let grid = Grid::from_rows(&["######", "#....#", "#....#", "#....#", "######"]);
        let start = CellCoord::new(1, 1);
        let goal = CellCoord::new(4, 3);
        let first = find_path(&grid, start, goal, Passability::Agent);
        let second = find_path(&grid, start, goal, Passability::Agent);
        assert_eq!(first, second);
        assert_eq!(first.map(|route| route.len()), Some(5));
    }
}
