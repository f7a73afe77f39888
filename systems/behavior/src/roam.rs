//! Passive wandering between far-away goals.

use std::collections::VecDeque;

use glam::Vec2;
use maze_escape_core::CellCoord;
use maze_escape_system_movement::find_path;
use maze_escape_world::{MazeState, Passability};
use rand::Rng;

use crate::body::random_neighbor;

const GOAL_SAMPLES: usize = 24;
const MIN_GOAL_DISTANCE: u32 = 10;
const VISIT_HISTORY: usize = 24;
const HISTORY_EXCLUSION_RADIUS: f32 = 4.0;

/// Goal selection, visit history and the A* route toward the current goal.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RoamPlanner {
    goal: Option<CellCoord>,
    route: VecDeque<CellCoord>,
    history: VecDeque<CellCoord>,
}

impl RoamPlanner {
    /// Next tile to walk to, re-planning when the route is exhausted or
    /// blocked. Falls back to a random neighbour when no route exists.
    pub(crate) fn next_step<R: Rng>(
        &mut self,
        cell: CellCoord,
        maze: &MazeState,
        rng: &mut R,
    ) -> Option<CellCoord> {
        self.remember(cell);
        while self.route.front() == Some(&cell) {
            let _ = self.route.pop_front();
        }

        let usable = self
            .route
            .front()
            .is_some_and(|next| next.manhattan_distance(cell) == 1 && maze.is_walkable(*next));
        if !usable {
            self.replan(cell, maze, rng);
        }

        match self.route.front() {
            Some(next) => Some(*next),
            None => random_neighbor(cell, maze, rng),
        }
    }

    /// Drops the current route so the next step plans afresh.
    pub(crate) fn forget_route(&mut self) {
        self.goal = None;
        self.route.clear();
    }

    fn remember(&mut self, cell: CellCoord) {
        if self.history.back() == Some(&cell) {
            return;
        }
        if self.history.len() == VISIT_HISTORY {
            let _ = self.history.pop_front();
        }
        self.history.push_back(cell);
    }

    fn replan<R: Rng>(&mut self, cell: CellCoord, maze: &MazeState, rng: &mut R) {
        self.route.clear();
        self.goal = self.pick_goal(cell, maze, rng);
        let Some(goal) = self.goal else {
            return;
        };
        match find_path(maze.grid(), cell, goal, Passability::Agent) {
            Some(route) => self.route.extend(route),
            None => self.goal = None,
        }
    }

    fn pick_goal<R: Rng>(&self, cell: CellCoord, maze: &MazeState, rng: &mut R) -> Option<CellCoord> {
        let reachable: Vec<CellCoord> = maze
            .agent_field(cell)
            .reachable_cells()
            .filter(|candidate| *candidate != cell)
            .collect();
        if reachable.is_empty() {
            return None;
        }

        let centroid = self.history_centroid();
        let mut best: Option<(u32, CellCoord)> = None;
        for _ in 0..GOAL_SAMPLES {
            let candidate = reachable[rng.gen_range(0..reachable.len())];
            let distance = candidate.manhattan_distance(cell);
            if distance < MIN_GOAL_DISTANCE {
                continue;
            }
            if let Some(centroid) = centroid {
                if candidate.center().distance(centroid) <= HISTORY_EXCLUSION_RADIUS {
                    continue;
                }
            }
            if best.map_or(true, |(score, _)| distance > score) {
                best = Some((distance, candidate));
            }
        }

        best.map(|(_, goal)| goal)
            .or_else(|| Some(reachable[rng.gen_range(0..reachable.len())]))
    }

    fn history_centroid(&self) -> Option<Vec2> {
        if self.history.len() < VISIT_HISTORY {
            return None;
        }
        let sum = self
            .history
            .iter()
            .fold(Vec2::ZERO, |sum, cell| sum + cell.center());
        Some(sum / self.history.len() as f32)
    }

    #[cfg(test)]
    pub(crate) fn goal(&self) -> Option<CellCoord> {
        self.goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_escape_world::{MazeConfig, SPAWN};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn roaming_follows_adjacent_walkable_steps() {
        let maze = MazeState::generate(&MazeConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut planner = RoamPlanner::default();
        let mut cell = SPAWN;
        for _ in 0..200 {
            let next = planner.next_step(cell, &maze, &mut rng).expect("spawn has neighbours");
            assert_eq!(next.manhattan_distance(cell), 1);
            assert!(maze.is_walkable(next));
            cell = next;
        }
    }

    #[test]
    fn goals_are_far_from_the_roamer() {
        let maze = MazeState::generate(&MazeConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut planner = RoamPlanner::default();
        let _ = planner.next_step(SPAWN, &maze, &mut rng);
        let goal = planner.goal().expect("a goal is chosen");
        assert!(goal.manhattan_distance(SPAWN) >= MIN_GOAL_DISTANCE);
    }

    #[test]
    fn history_keeps_the_most_recent_visits() {
        let mut planner = RoamPlanner::default();
        for column in 0..30 {
            planner.remember(CellCoord::new(column, 1));
            planner.remember(CellCoord::new(column, 1));
        }
        assert_eq!(planner.history.len(), VISIT_HISTORY);
        assert_eq!(planner.history.front(), Some(&CellCoord::new(6, 1)));
        let centroid = planner.history_centroid().expect("history is full");
        assert!((centroid.x - 17.5).abs() < 1e-4);
    }
}
