//! Skittish artillery that keeps its distance and lobs telegraphed blasts.

use std::time::Duration;

use maze_escape_core::{BehaviorTag, CellCoord, Direction, Event, Timer};
use maze_escape_world::Grid;
use rand::{seq::SliceRandom, Rng};

use crate::{body::Body, flee::flee_step, roam::RoamPlanner, Effect, TickContext};

/// Interval between route recomputations.
pub const BOMBARDIER_PATH_INTERVAL: Duration = Duration::from_millis(260);

/// Telegraph before the first blast of a volley lands.
pub const AIM_TELEGRAPH: Duration = Duration::from_millis(1_200);

/// Telegraph before a follow-up blast lands.
pub const FOLLOW_UP_TELEGRAPH: Duration = Duration::from_millis(600);

/// Chebyshev radius of a blast.
pub const BLAST_RADIUS: u32 = 1;

/// Player stun applied by a blast.
pub const PLAYER_BLAST_STUN: Duration = Duration::from_millis(1_500);

/// Time other agents caught in a blast are pinned in place.
pub const BLAST_HOLD: Duration = Duration::from_secs(3);

/// Knock-out after being tackled by the player.
pub const TACKLE_DISABLE: Duration = Duration::from_secs(5);

/// Knock-out after catching itself in its own blast.
pub const SELF_HIT_DISABLE: Duration = Duration::from_secs(8);

/// Recovery after a volley.
pub const SHOT_COOLDOWN: Duration = Duration::from_secs(2);

const SHOT_INTERVAL_MS: std::ops::RangeInclusive<u64> = 6_000..=10_000;
const FLEE_ENTER_DISTANCE: u32 = 6;
const FLEE_EXIT_DISTANCE: u32 = 9;
const ROAM_SPEED: f32 = 1.6;
const FLEE_SPEED: f32 = 2.8;

#[derive(Clone, Copy, Debug, PartialEq)]
enum BombardierState {
    Roam,
    Flee,
    Aim {
        target: CellCoord,
        resolves: Timer,
        follow_up: bool,
    },
    Cooldown {
        until: Timer,
    },
    Disabled {
        until: Timer,
    },
}

/// Bombardier decision state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BombardierBrain {
    state: BombardierState,
    roam: RoamPlanner,
    shot: Option<Timer>,
}

impl BombardierBrain {
    pub(crate) fn new() -> Self {
        Self {
            state: BombardierState::Roam,
            roam: RoamPlanner::default(),
            shot: None,
        }
    }

    pub(crate) fn tag(&self) -> BehaviorTag {
        match self.state {
            BombardierState::Roam => BehaviorTag::Roam,
            BombardierState::Flee => BehaviorTag::Flee,
            BombardierState::Aim { .. } => BehaviorTag::Aim,
            BombardierState::Cooldown { .. } => BehaviorTag::Cooldown,
            BombardierState::Disabled { .. } => BehaviorTag::Disabled,
        }
    }

    pub(crate) fn telegraph_until(&self) -> Option<Duration> {
        match self.state {
            BombardierState::Aim { resolves, .. } => Some(resolves.fires_at()),
            _ => None,
        }
    }

    pub(crate) fn allows_motion(&self) -> bool {
        matches!(self.state, BombardierState::Roam | BombardierState::Flee)
    }

    pub(crate) fn speed(&self) -> f32 {
        match self.state {
            BombardierState::Flee => FLEE_SPEED,
            _ => ROAM_SPEED,
        }
    }

    /// Aiming and fleeing collapse to roaming; knock-outs and cooldowns run
    /// their course.
    pub(crate) fn reset_to_base(&mut self) {
        if matches!(self.state, BombardierState::Aim { .. } | BombardierState::Flee) {
            self.state = BombardierState::Roam;
            self.shot = None;
            self.roam.forget_route();
        }
    }

    fn settle(&mut self, body: &mut Body) {
        self.state = BombardierState::Roam;
        self.shot = None;
        self.roam.forget_route();
        body.force_replan();
    }

    pub(crate) fn update(
        &mut self,
        body: &mut Body,
        ctx: &mut TickContext<'_>,
        touching: bool,
        effects: &mut Vec<Effect>,
        out_events: &mut Vec<Event>,
    ) {
        let now = ctx.now;

        // Sharing a tile with the player knocks the bombardier out whenever it
        // is not already down, including the tick its knock-out ends.
        let knocked_out = matches!(
            self.state,
            BombardierState::Disabled { until } if until.is_active(now)
        );
        if touching && !knocked_out {
            self.state = BombardierState::Disabled {
                until: Timer::start(now, TACKLE_DISABLE),
            };
            body.aim_at(None);
            out_events.push(Event::AgentTackled { agent: body.id() });
            effects.push(Effect::Noise { cell: body.cell() });
            return;
        }

        match self.state {
            BombardierState::Disabled { until } | BombardierState::Cooldown { until } => {
                if !until.is_ready(now) {
                    return;
                }
                self.settle(body);
            }
            BombardierState::Aim {
                target,
                resolves,
                follow_up,
            } => {
                if resolves.is_ready(now) {
                    self.resolve_blast(body, ctx, target, follow_up, effects, out_events);
                }
                return;
            }
            BombardierState::Roam | BombardierState::Flee => {}
        }

        let locked = body.hazard.escalation_locked(now);
        let rng = &mut *ctx.rng;
        let shot = *self.shot.get_or_insert_with(|| {
            Timer::start(now, Duration::from_millis(rng.gen_range(SHOT_INTERVAL_MS)))
        });
        if shot.is_ready(now) && !locked {
            let target = ctx.player;
            self.begin_aim(body, target, AIM_TELEGRAPH, false, now, out_events);
            return;
        }

        let distance = ctx.player_field.reachable_distance(body.cell());
        match self.state {
            BombardierState::Roam
                if !locked && distance.is_some_and(|d| d <= FLEE_ENTER_DISTANCE) =>
            {
                self.state = BombardierState::Flee;
                self.roam.forget_route();
                body.force_replan();
            }
            BombardierState::Flee if distance.map_or(true, |d| d > FLEE_EXIT_DISTANCE) => {
                self.state = BombardierState::Roam;
                body.force_replan();
            }
            _ => {}
        }

        if !body.due_for_plan(now, BOMBARDIER_PATH_INTERVAL) {
            return;
        }
        let cell = body.cell();
        let next = match self.state {
            BombardierState::Flee => flee_step(body, ctx, out_events),
            _ => self.roam.next_step(cell, ctx.maze, ctx.rng),
        };
        body.aim_at(next);
    }

    fn begin_aim(
        &mut self,
        body: &mut Body,
        target: CellCoord,
        telegraph: Duration,
        follow_up: bool,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let resolves = Timer::start(now, telegraph);
        self.state = BombardierState::Aim {
            target,
            resolves,
            follow_up,
        };
        body.aim_at(None);
        out_events.push(Event::BlastTelegraphed {
            agent: body.id(),
            target,
            resolves_at: resolves.fires_at(),
        });
    }

    fn resolve_blast(
        &mut self,
        body: &mut Body,
        ctx: &mut TickContext<'_>,
        center: CellCoord,
        was_follow_up: bool,
        effects: &mut Vec<Effect>,
        out_events: &mut Vec<Event>,
    ) {
        let now = ctx.now;
        let hit_player = ctx.player.chebyshev_distance(center) <= BLAST_RADIUS;
        let self_hit = body.cell().chebyshev_distance(center) <= BLAST_RADIUS;
        if hit_player {
            out_events.push(Event::PlayerHit {
                agent: body.id(),
                stun: PLAYER_BLAST_STUN,
            });
        }
        effects.push(Effect::Blast {
            source: body.id(),
            center,
            hit_player,
            self_hit,
        });

        if self_hit {
            self.state = BombardierState::Disabled {
                until: Timer::start(now, SELF_HIT_DISABLE),
            };
        } else if !was_follow_up && ctx.difficulty.allows_follow_up_shot() {
            let target = follow_up_target(center, ctx.player, ctx.maze.grid(), ctx.rng);
            self.begin_aim(body, target, FOLLOW_UP_TELEGRAPH, true, now, out_events);
        } else {
            self.state = BombardierState::Cooldown {
                until: Timer::start(now, SHOT_COOLDOWN),
            };
        }
    }
}

/// One tile from the previous blast toward the player along the dominant
/// axis, or a random cardinal tile when the player has not moved.
fn follow_up_target<R: Rng>(
    center: CellCoord,
    player: CellCoord,
    grid: &Grid,
    rng: &mut R,
) -> CellCoord {
    let direction = if player == center {
        Direction::ALL.choose(rng).copied()
    } else {
        let dx = i64::from(player.column()) - i64::from(center.column());
        let dy = i64::from(player.row()) - i64::from(center.row());
        Some(if dx.abs() >= dy.abs() {
            if dx > 0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if dy > 0 {
            Direction::South
        } else {
            Direction::North
        })
    };

    direction
        .and_then(|direction| center.step(direction, 1, grid.columns(), grid.rows()))
        .unwrap_or(center)
}
