//! State shared by every archetype: position, facing, hazards and timers.

use std::time::Duration;

use glam::Vec2;
use maze_escape_core::{AgentId, AgentKind, CellCoord, Direction, Event, Timer};
use maze_escape_system_hazard::HazardStatus;
use maze_escape_system_movement::{Advance, Motion};
use maze_escape_world::MazeState;
use rand::{seq::SliceRandom, Rng};

/// Time an agent may stand still while free to move before it is nudged.
pub const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Archetype-independent part of an agent.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    id: AgentId,
    kind: AgentKind,
    pub(crate) motion: Motion,
    pub(crate) facing: Direction,
    pub(crate) hazard: HazardStatus,
    pub(crate) held: Timer,
    pub(crate) path_timer: Timer,
    pub(crate) in_contact: bool,
    last_position: Vec2,
    still_since: Duration,
    nudge: Option<CellCoord>,
}

impl Body {
    pub(crate) fn new(id: AgentId, kind: AgentKind, cell: CellCoord, maze: &MazeState) -> Self {
        let facing = Direction::ALL
            .into_iter()
            .find(|direction| {
                cell.step(*direction, 1, maze.grid().columns(), maze.grid().rows())
                    .is_some_and(|neighbor| maze.is_walkable(neighbor))
            })
            .unwrap_or(Direction::North);
        let motion = Motion::at(cell);
        Self {
            id,
            kind,
            last_position: motion.position(),
            motion,
            facing,
            hazard: HazardStatus::default(),
            held: Timer::elapsed(),
            path_timer: Timer::elapsed(),
            in_contact: false,
            still_since: Duration::ZERO,
            nudge: None,
        }
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Archetype.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Continuous position in tile units.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.motion.position()
    }

    /// Discrete tile currently occupied.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.motion.cell()
    }

    /// Tile being approached, if any.
    #[must_use]
    pub fn target(&self) -> Option<CellCoord> {
        self.motion.target()
    }

    /// Direction of the most recent step.
    #[must_use]
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Stun and slow windows.
    #[must_use]
    pub fn hazard(&self) -> &HazardStatus {
        &self.hazard
    }

    /// Reports whether a blast currently pins the agent in place.
    #[must_use]
    pub fn is_held(&self, now: Duration) -> bool {
        self.held.is_active(now)
    }

    /// Whether hazards and blasts allow the agent to move at all.
    pub(crate) fn is_free(&self, now: Duration) -> bool {
        !self.hazard.is_stunned(now) && !self.is_held(now)
    }

    /// Re-arms the path timer and returns true when the agent is free, is not
    /// still walking off a stall nudge, and either has no target or its
    /// replanning interval has lapsed.
    pub(crate) fn due_for_plan(&mut self, now: Duration, interval: Duration) -> bool {
        if !self.is_free(now) {
            return false;
        }
        if let Some(nudge) = self.nudge {
            if self.target() == Some(nudge) && self.cell() != nudge {
                return false;
            }
            self.nudge = None;
        }
        if self.target().is_some() && !self.path_timer.is_ready(now) {
            return false;
        }
        self.path_timer = Timer::start(now, interval);
        true
    }

    /// Makes the next [`Body::due_for_plan`] call succeed.
    pub(crate) fn force_replan(&mut self) {
        self.path_timer = Timer::elapsed();
    }

    pub(crate) fn hold(&mut self, now: Duration, duration: Duration) {
        self.held = Timer::start(now, duration);
        self.motion.set_target(None);
    }

    /// Points the agent at an adjacent tile, updating its facing.
    pub(crate) fn aim_at(&mut self, target: Option<CellCoord>) {
        if let Some(next) = target {
            if let Some(direction) = Direction::between(self.cell(), next) {
                self.facing = direction;
            }
        }
        self.motion.set_target(target);
    }

    pub(crate) fn teleport(&mut self, cell: CellCoord, now: Duration) {
        self.motion.teleport(cell);
        self.last_position = self.motion.position();
        self.still_since = now;
    }

    /// Integrates one tick of movement, reporting tile changes as events.
    pub(crate) fn advance(&mut self, speed: f32, dt: Duration, out_events: &mut Vec<Event>) -> Advance {
        let advance = self.motion.advance(speed, dt);
        if let Some((from, to)) = advance.crossed {
            out_events.push(Event::AgentMoved {
                agent: self.id,
                from,
                to,
            });
        }
        advance
    }

    /// Tracks how long the agent has not moved and, when it was free to move
    /// for longer than [`STALL_TIMEOUT`], redirects it to a random walkable
    /// neighbour. Planning is suspended until the agent reaches that
    /// neighbour. Returns whether the nudge fired.
    pub(crate) fn resolve_stall<R: Rng>(
        &mut self,
        free_to_move: bool,
        now: Duration,
        maze: &MazeState,
        rng: &mut R,
    ) -> bool {
        let position = self.motion.position();
        if !free_to_move || position != self.last_position {
            self.last_position = position;
            self.still_since = now;
            return false;
        }
        if now.saturating_sub(self.still_since) <= STALL_TIMEOUT {
            return false;
        }

        self.still_since = now;
        let target = random_neighbor(self.cell(), maze, rng);
        self.aim_at(target);
        self.nudge = target;
        target.is_some()
    }
}

/// Uniformly chosen walkable neighbour of `cell`.
pub(crate) fn random_neighbor<R: Rng>(
    cell: CellCoord,
    maze: &MazeState,
    rng: &mut R,
) -> Option<CellCoord> {
    let grid = maze.grid();
    let options: Vec<CellCoord> = grid
        .neighbors(cell)
        .filter(|neighbor| maze.is_walkable(*neighbor))
        .collect();
    options.choose(rng).copied()
}
