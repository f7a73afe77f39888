//! Territorial guard that punishes contact and then backs off.

use std::time::Duration;

use maze_escape_core::{BehaviorTag, Event, Timer};
use maze_escape_system_movement::gradient_step;
use maze_escape_world::Passability;

use crate::{body::Body, flee::flee_step, roam::RoamPlanner, TickContext};

/// Interval between route recomputations.
pub const ENFORCER_PATH_INTERVAL: Duration = Duration::from_millis(180);

/// Chebyshev radius inside which the enforcer notices a lingering player.
pub const PROXIMITY_RADIUS: u32 = 3;

/// How long the player may linger nearby before the enforcer rages.
pub const PROXIMITY_TRIGGER: Duration = Duration::from_millis(2_500);

/// Rage ends after this long without contact.
pub const RAGE_GIVE_UP: Duration = Duration::from_secs(12);

/// Player stun applied on contact.
pub const PUNISH_STUN: Duration = Duration::from_secs(3);

/// Retreat window after punishing the player.
pub const PUNISH_RETREAT: Duration = Duration::from_secs(3);

const ROAM_SPEED: f32 = 1.8;
const RAGE_SPEED: f32 = 3.6;
const FLEE_SPEED: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum EnforcerState {
    Roam { near_since: Option<Duration> },
    Rage { gives_up: Timer },
    Flee { until: Timer },
}

/// Enforcer decision state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EnforcerBrain {
    state: EnforcerState,
    roam: RoamPlanner,
}

impl EnforcerBrain {
    pub(crate) fn new() -> Self {
        Self {
            state: EnforcerState::Roam { near_since: None },
            roam: RoamPlanner::default(),
        }
    }

    pub(crate) fn tag(&self) -> BehaviorTag {
        match self.state {
            EnforcerState::Roam { .. } => BehaviorTag::Roam,
            EnforcerState::Rage { .. } => BehaviorTag::Rage,
            EnforcerState::Flee { .. } => BehaviorTag::Flee,
        }
    }

    pub(crate) fn speed(&self) -> f32 {
        match self.state {
            EnforcerState::Roam { .. } => ROAM_SPEED,
            EnforcerState::Rage { .. } => RAGE_SPEED,
            EnforcerState::Flee { .. } => FLEE_SPEED,
        }
    }

    pub(crate) fn reset_to_base(&mut self) {
        if !matches!(self.state, EnforcerState::Roam { .. }) {
            self.state = EnforcerState::Roam { near_since: None };
            self.roam.forget_route();
        }
    }

    fn enter(&mut self, state: EnforcerState, body: &mut Body) {
        self.state = state;
        self.roam.forget_route();
        body.force_replan();
    }

    pub(crate) fn update(
        &mut self,
        body: &mut Body,
        ctx: &mut TickContext<'_>,
        contact_began: bool,
        out_events: &mut Vec<Event>,
    ) {
        let now = ctx.now;
        let locked = body.hazard.escalation_locked(now);
        let fleeing = matches!(self.state, EnforcerState::Flee { .. });

        if contact_began {
            out_events.push(Event::AgentTouchedPlayer {
                agent: body.id(),
                kind: body.kind(),
            });
            if !fleeing && !locked {
                out_events.push(Event::PlayerPunished {
                    agent: body.id(),
                    stun: PUNISH_STUN,
                });
                self.enter(
                    EnforcerState::Flee {
                        until: Timer::start(now, PUNISH_RETREAT),
                    },
                    body,
                );
            }
        }

        match &mut self.state {
            EnforcerState::Roam { near_since } => {
                if !ctx.noises.is_empty() && !locked {
                    self.enter(rage(now), body);
                } else if body.cell().chebyshev_distance(ctx.player) <= PROXIMITY_RADIUS {
                    let since = *near_since.get_or_insert(now);
                    if now.saturating_sub(since) > PROXIMITY_TRIGGER && !locked {
                        self.enter(rage(now), body);
                    }
                } else {
                    *near_since = None;
                }
            }
            EnforcerState::Rage { gives_up } => {
                if !ctx.noises.is_empty() {
                    *gives_up = Timer::start(now, RAGE_GIVE_UP);
                } else if gives_up.is_ready(now) {
                    self.enter(EnforcerState::Roam { near_since: None }, body);
                }
            }
            EnforcerState::Flee { until } => {
                if until.is_ready(now) {
                    self.enter(EnforcerState::Roam { near_since: None }, body);
                }
            }
        }

        if !body.due_for_plan(now, ENFORCER_PATH_INTERVAL) {
            return;
        }
        let cell = body.cell();
        let next = match self.state {
            EnforcerState::Roam { .. } => self.roam.next_step(cell, ctx.maze, ctx.rng),
            EnforcerState::Rage { .. } => {
                gradient_step(ctx.player_field, ctx.maze.grid(), cell, Passability::Agent)
            }
            EnforcerState::Flee { .. } => flee_step(body, ctx, out_events),
        };
        body.aim_at(next);
    }
}

fn rage(now: Duration) -> EnforcerState {
    EnforcerState::Rage {
        gives_up: Timer::start(now, RAGE_GIVE_UP),
    }
}
