//! Relentless chaser that can leap across single walls.

use std::time::Duration;

use maze_escape_core::{BehaviorTag, CellCoord, Direction, Event, TileKind, Timer};
use maze_escape_system_movement::gradient_step;
use maze_escape_world::{DistanceField, MazeState, Passability};

use crate::{body::Body, TickContext};

/// Interval between route recomputations.
pub const PURSUER_PATH_INTERVAL: Duration = Duration::from_millis(140);

/// Pause between committing to a leap and landing.
pub const LEAP_TELEGRAPH: Duration = Duration::from_millis(450);

/// Minimum time between two leaps.
pub const LEAP_COOLDOWN: Duration = Duration::from_secs(6);

/// A leap must shorten the walking distance to the player by more than this.
const LEAP_MIN_GAIN: u32 = 6;

const BASE_SPEED: f32 = 2.6;
const SPEED_PER_GENERATOR: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq)]
enum PursuerState {
    Chase,
    LeapTelegraph { landing: CellCoord, resolves: Timer },
}

/// Pursuer decision state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PursuerBrain {
    state: PursuerState,
    leap_cooldown: Timer,
}

impl PursuerBrain {
    pub(crate) fn new() -> Self {
        Self {
            state: PursuerState::Chase,
            leap_cooldown: Timer::elapsed(),
        }
    }

    pub(crate) fn tag(&self) -> BehaviorTag {
        match self.state {
            PursuerState::Chase => BehaviorTag::Chase,
            PursuerState::LeapTelegraph { .. } => BehaviorTag::LeapTelegraph,
        }
    }

    pub(crate) fn telegraph_until(&self) -> Option<Duration> {
        match self.state {
            PursuerState::LeapTelegraph { resolves, .. } => Some(resolves.fires_at()),
            PursuerState::Chase => None,
        }
    }

    pub(crate) fn allows_motion(&self) -> bool {
        self.state == PursuerState::Chase
    }

    /// Base speed grows with every completed generator.
    pub(crate) fn speed(&self, maze: &MazeState) -> f32 {
        BASE_SPEED + SPEED_PER_GENERATOR * maze.completed_generators() as f32
    }

    pub(crate) fn reset_to_base(&mut self) {
        self.state = PursuerState::Chase;
    }

    pub(crate) fn update(
        &mut self,
        body: &mut Body,
        ctx: &mut TickContext<'_>,
        contact_began: bool,
        out_events: &mut Vec<Event>,
    ) {
        let now = ctx.now;
        if contact_began {
            out_events.push(Event::AgentTouchedPlayer {
                agent: body.id(),
                kind: body.kind(),
            });
        }

        if let PursuerState::LeapTelegraph { landing, resolves } = self.state {
            // A pinned or thawing pursuer lands once it could move again.
            if resolves.is_ready(now) && body.is_free(now) && ctx.thaw > 0.0 {
                let from = body.cell();
                body.teleport(landing, now);
                out_events.push(Event::AgentLeaped {
                    agent: body.id(),
                    from,
                    to: landing,
                });
                self.state = PursuerState::Chase;
                self.leap_cooldown = Timer::start(now, LEAP_COOLDOWN);
                body.force_replan();
            }
            return;
        }

        if !body.due_for_plan(now, PURSUER_PATH_INTERVAL) {
            return;
        }
        let cell = body.cell();

        if self.leap_cooldown.is_ready(now) && !body.hazard.escalation_locked(now) {
            if let Some(landing) = find_leap(ctx.maze, ctx.player_field, cell) {
                let resolves = Timer::start(now, LEAP_TELEGRAPH);
                self.state = PursuerState::LeapTelegraph { landing, resolves };
                body.aim_at(None);
                out_events.push(Event::LeapTelegraphed {
                    agent: body.id(),
                    landing,
                    resolves_at: resolves.fires_at(),
                });
                return;
            }
        }

        let next = gradient_step(ctx.player_field, ctx.maze.grid(), cell, Passability::Agent);
        body.aim_at(next);
    }
}

/// Best wall to jump over from `cell`: the tile beyond a single wall that cuts
/// the walking distance to the player the most, provided the cut exceeds
/// [`LEAP_MIN_GAIN`].
fn find_leap(maze: &MazeState, field: &DistanceField, cell: CellCoord) -> Option<CellCoord> {
    let current = field.reachable_distance(cell)?;
    let grid = maze.grid();
    let mut best: Option<(u32, CellCoord)> = None;

    for direction in Direction::ALL {
        let Some(wall) = cell.step(direction, 1, grid.columns(), grid.rows()) else {
            continue;
        };
        if grid.kind(wall) != TileKind::Wall {
            continue;
        }
        let Some(landing) = cell.step(direction, 2, grid.columns(), grid.rows()) else {
            continue;
        };
        if !maze.is_walkable(landing) {
            continue;
        }
        let Some(distance) = field.reachable_distance(landing) else {
            continue;
        };
        let gain = current.saturating_sub(distance);
        if gain <= LEAP_MIN_GAIN {
            continue;
        }
        if best.map_or(true, |(best_gain, _)| gain > best_gain) {
            best = Some((gain, landing));
        }
    }

    best.map(|(_, landing)| landing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_escape_world::{MazeConfig, SPAWN};

    #[test]
    fn leaps_only_across_walls_with_a_large_gain() {
        let maze = MazeState::generate(&MazeConfig::default());
        let field = maze.agent_field(SPAWN);
        let grid = maze.grid();
        for cell in field.reachable_cells() {
            let Some(landing) = find_leap(&maze, &field, cell) else {
                continue;
            };
            assert_eq!(landing.manhattan_distance(cell), 2);
            let wall = CellCoord::new(
                (cell.column() + landing.column()) / 2,
                (cell.row() + landing.row()) / 2,
            );
            assert_eq!(grid.kind(wall), TileKind::Wall);
            let before = field.reachable_distance(cell).expect("reachable");
            let after = field.reachable_distance(landing).expect("reachable");
            assert!(before - after > LEAP_MIN_GAIN);
        }
    }

    #[test]
    fn speed_scales_with_completed_generators() {
        let mut maze = MazeState::generate(&MazeConfig::default());
        let brain = PursuerBrain::new();
        assert!((brain.speed(&maze) - BASE_SPEED).abs() < 1e-6);
        maze.generator_mut(0).expect("generator placed").completed = true;
        assert!((brain.speed(&maze) - (BASE_SPEED + SPEED_PER_GENERATOR)).abs() < 1e-6);
    }
}
