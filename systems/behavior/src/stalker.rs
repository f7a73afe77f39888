//! Wanderer that rages on sight and investigates noises.

use std::time::Duration;

use maze_escape_core::{BehaviorTag, Event, Timer};
use maze_escape_system_movement::gradient_step;
use maze_escape_world::{DistanceField, Passability};

use crate::{body::Body, perception::sees_along, roam::RoamPlanner, TickContext};

/// Interval between route recomputations.
pub const STALKER_PATH_INTERVAL: Duration = Duration::from_millis(200);

/// How long rage persists after the player was last seen.
pub const RAGE_CALM_DOWN: Duration = Duration::from_secs(4);

/// Maximum time spent investigating a noise.
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(6);

/// Tiles the stalker can see along its facing.
pub const SIGHT_RANGE: u32 = 8;

const ROAM_SPEED: f32 = 2.0;
const ALERT_SPEED: f32 = 2.6;
const RAGE_SPEED: f32 = 3.4;

#[derive(Clone, Debug, PartialEq)]
enum StalkerState {
    Roam,
    Alert { field: DistanceField, gives_up: Timer },
    Rage { calm: Timer },
}

/// Stalker decision state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StalkerBrain {
    state: StalkerState,
    roam: RoamPlanner,
}

impl StalkerBrain {
    pub(crate) fn new() -> Self {
        Self {
            state: StalkerState::Roam,
            roam: RoamPlanner::default(),
        }
    }

    pub(crate) fn tag(&self) -> BehaviorTag {
        match self.state {
            StalkerState::Roam => BehaviorTag::Roam,
            StalkerState::Alert { .. } => BehaviorTag::Alert,
            StalkerState::Rage { .. } => BehaviorTag::Rage,
        }
    }

    pub(crate) fn speed(&self) -> f32 {
        match self.state {
            StalkerState::Roam => ROAM_SPEED,
            StalkerState::Alert { .. } => ALERT_SPEED,
            StalkerState::Rage { .. } => RAGE_SPEED,
        }
    }

    pub(crate) fn reset_to_base(&mut self) {
        if self.state != StalkerState::Roam {
            self.state = StalkerState::Roam;
            self.roam.forget_route();
        }
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
        let locked = body.hazard.escalation_locked(now);

        let cell = body.cell();
        let nearest_noise = ctx
            .noises
            .iter()
            .copied()
            .min_by_key(|noise| noise.manhattan_distance(cell));
        if let Some(noise) = nearest_noise {
            if self.state == StalkerState::Roam && !locked {
                self.state = StalkerState::Alert {
                    field: DistanceField::from_origin(ctx.maze.grid(), noise, Passability::Agent),
                    gives_up: Timer::start(now, ALERT_TIMEOUT),
                };
                body.force_replan();
            }
        }

        if !body.due_for_plan(now, STALKER_PATH_INTERVAL) {
            return;
        }
        let sees_player = sees_along(ctx.maze, cell, body.facing(), SIGHT_RANGE, ctx.player);

        if sees_player && !locked {
            let calm = Timer::start(now, RAGE_CALM_DOWN);
            if !matches!(self.state, StalkerState::Rage { .. }) {
                self.roam.forget_route();
            }
            self.state = StalkerState::Rage { calm };
        }

        let next = match &self.state {
            StalkerState::Rage { calm } if calm.is_ready(now) && !sees_player => None,
            StalkerState::Rage { .. } => Some(gradient_step(
                ctx.player_field,
                ctx.maze.grid(),
                cell,
                Passability::Agent,
            )),
            StalkerState::Alert { field, gives_up } => {
                if gives_up.is_ready(now) || field.reachable_distance(cell).map_or(true, |d| d == 0) {
                    None
                } else {
                    Some(gradient_step(field, ctx.maze.grid(), cell, Passability::Agent))
                }
            }
            StalkerState::Roam => Some(self.roam.next_step(cell, ctx.maze, ctx.rng)),
        };

        let next = match next {
            Some(next) => next,
            None => {
                self.state = StalkerState::Roam;
                self.roam.next_step(cell, ctx.maze, ctx.rng)
            }
        };
        body.aim_at(next);
    }
}
