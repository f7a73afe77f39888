#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agent decision making for the four adversary archetypes.
//!
//! Each agent is a [`Body`] shared by every archetype plus a brain holding
//! the archetype's state machine. The [`AgentRoster`] updates agents in id
//! order once per tick. Effects that reach other agents, such as blasts that
//! pin bystanders in place, are queued during the pass and applied once every
//! agent has acted so the outcome never depends on iteration order.

mod agent;
mod body;
mod bombardier;
mod enforcer;
mod flee;
mod perception;
mod pursuer;
mod roam;
mod stalker;

use std::time::Duration;

use maze_escape_core::{AgentId, AgentKind, AgentView, CellCoord, Difficulty, Event};
use maze_escape_world::{DistanceField, MazeState};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub use agent::Agent;
pub use body::{Body, STALL_TIMEOUT};
pub use bombardier::{
    AIM_TELEGRAPH, BLAST_HOLD, BLAST_RADIUS, BOMBARDIER_PATH_INTERVAL,
    FOLLOW_UP_TELEGRAPH, PLAYER_BLAST_STUN, SELF_HIT_DISABLE, SHOT_COOLDOWN, TACKLE_DISABLE,
};
pub use enforcer::{
    ENFORCER_PATH_INTERVAL, PROXIMITY_RADIUS, PROXIMITY_TRIGGER, PUNISH_RETREAT,
    PUNISH_STUN, RAGE_GIVE_UP,
};
pub use flee::TELEPAD_COOLDOWN;
pub use pursuer::{LEAP_COOLDOWN, LEAP_TELEGRAPH, PURSUER_PATH_INTERVAL};
pub use stalker::{ALERT_TIMEOUT, RAGE_CALM_DOWN, SIGHT_RANGE, STALKER_PATH_INTERVAL};

/// Everything an agent may read or mutate during one tick.
#[derive(Debug)]
pub struct TickContext<'a> {
    /// Simulated time at the end of the tick.
    pub now: Duration,
    /// Length of the tick.
    pub dt: Duration,
    /// Maze, mutable for telepad cooldowns.
    pub maze: &'a mut MazeState,
    /// Tile occupied by the player.
    pub player: CellCoord,
    /// Agent-passability distance field rooted at the player.
    pub player_field: &'a DistanceField,
    /// Noise pings raised since the previous tick, oldest first.
    pub noises: &'a [CellCoord],
    /// Active difficulty tier.
    pub difficulty: Difficulty,
    /// Global thaw multiplier in `0.0..=1.0`.
    pub thaw: f32,
    /// Whether a freeze currently stops every agent.
    pub frozen: bool,
    /// Runtime randomness shared by all agents.
    pub rng: &'a mut ChaCha8Rng,
}

/// Cross-agent consequence queued during the agent pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Effect {
    Blast {
        source: AgentId,
        center: CellCoord,
        hit_player: bool,
        self_hit: bool,
    },
    Noise {
        cell: CellCoord,
    },
}

/// Every agent in the level, kept in ascending id order.
#[derive(Clone, Debug, Default)]
pub struct AgentRoster {
    agents: Vec<Agent>,
}

impl AgentRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an agent of `kind` standing on `cell` and returns its id.
    pub fn spawn(&mut self, kind: AgentKind, cell: CellCoord, maze: &MazeState) -> AgentId {
        let id = AgentId::new(self.agents.len() as u32);
        debug!(agent = id.get(), kind = kind.label(), ?cell, "spawned agent");
        self.agents.push(Agent::new(id, kind, cell, maze));
        id
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether the roster holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Looks up one agent.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    /// Agents in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Mutable agents in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Updates every agent, then applies queued cross-agent effects.
    ///
    /// Returns the noise pings raised during the pass; the caller delivers
    /// them on the following tick.
    pub fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        out_events: &mut Vec<Event>,
    ) -> Vec<CellCoord> {
        let mut effects = Vec::new();
        for agent in &mut self.agents {
            agent.update(ctx, &mut effects, out_events);
        }

        let mut noises = Vec::new();
        for effect in effects {
            match effect {
                Effect::Blast {
                    source,
                    center,
                    hit_player,
                    self_hit,
                } => {
                    let held = self.pin_bystanders(source, center, ctx.now);
                    debug!(
                        agent = source.get(),
                        ?center,
                        hit_player,
                        held = held.len(),
                        "blast resolved"
                    );
                    out_events.push(Event::BlastResolved {
                        agent: source,
                        center,
                        hit_player,
                        held,
                        self_hit,
                    });
                }
                Effect::Noise { cell } => noises.push(cell),
            }
        }
        noises
    }

    fn pin_bystanders(
        &mut self,
        source: AgentId,
        center: CellCoord,
        now: Duration,
    ) -> Vec<AgentId> {
        let mut held = Vec::new();
        for agent in &mut self.agents {
            if agent.id() == source {
                continue;
            }
            if agent.body.cell().chebyshev_distance(center) > BLAST_RADIUS {
                continue;
            }
            agent.body.hold(now, BLAST_HOLD);
            held.push(agent.id());
        }
        held
    }

    /// Snapshot of every agent, sorted by id.
    #[must_use]
    pub fn view(&self) -> AgentView {
        AgentView::from_snapshots(self.agents.iter().map(Agent::snapshot).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_escape_core::BehaviorTag;
    use maze_escape_world::Passability;
    use rand::SeedableRng;

    const DT: Duration = Duration::from_millis(50);

    /// Row 1 and row 3 meet only at the far end, so the pursuer at (1, 1)
    /// prefers leaping the wall to reach (1, 3).
    const SERPENTINE: [&str; 5] = [
        "###########",
        "#.........#",
        "#########.#",
        "#.........#",
        "###########",
    ];

    fn tick(roster: &mut AgentRoster, maze: &mut MazeState, now: Duration, thaw: f32) -> Vec<Event> {
        let player = CellCoord::new(1, 3);
        let field = DistanceField::from_origin(maze.grid(), player, Passability::Agent);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ctx = TickContext {
            now,
            dt: DT,
            maze,
            player,
            player_field: &field,
            noises: &[],
            difficulty: Difficulty::default(),
            thaw,
            frozen: false,
            rng: &mut rng,
        };
        let mut events = Vec::new();
        let _ = roster.update(&mut ctx, &mut events);
        events
    }

    fn leaped(events: &[Event]) -> bool {
        events
            .iter()
            .any(|event| matches!(event, Event::AgentLeaped { .. }))
    }

    #[test]
    fn pinned_pursuer_lands_only_after_release() {
        let mut maze = MazeState::from_layout(&SERPENTINE);
        let mut roster = AgentRoster::new();
        let pursuer = roster.spawn(AgentKind::Pursuer, CellCoord::new(1, 1), &maze);

        let mut now = DT;
        let events = tick(&mut roster, &mut maze, now, 1.0);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LeapTelegraphed { .. })));

        let release = now + Duration::from_secs(1);
        for agent in roster.iter_mut() {
            agent.body.hold(now, Duration::from_secs(1));
        }
        while now + DT < release {
            now += DT;
            assert!(!leaped(&tick(&mut roster, &mut maze, now, 1.0)), "leapt at {now:?}");
        }
        let waiting = roster.get(pursuer).expect("spawned");
        assert_eq!(waiting.state(), BehaviorTag::LeapTelegraph);
        assert_eq!(waiting.body().cell(), CellCoord::new(1, 1));

        now += DT;
        assert!(leaped(&tick(&mut roster, &mut maze, now, 1.0)));
        assert_eq!(
            roster.get(pursuer).expect("spawned").body().cell(),
            CellCoord::new(1, 3)
        );
    }

    #[test]
    fn thawing_pursuer_lands_once_motion_resumes() {
        let mut maze = MazeState::from_layout(&SERPENTINE);
        let mut roster = AgentRoster::new();
        let pursuer = roster.spawn(AgentKind::Pursuer, CellCoord::new(1, 1), &maze);

        let mut now = DT;
        let _ = tick(&mut roster, &mut maze, now, 1.0);
        while now < Duration::from_secs(1) {
            now += DT;
            assert!(!leaped(&tick(&mut roster, &mut maze, now, 0.0)), "leapt at {now:?}");
        }
        assert_eq!(
            roster.get(pursuer).expect("spawned").state(),
            BehaviorTag::LeapTelegraph
        );

        now += DT;
        assert!(leaped(&tick(&mut roster, &mut maze, now, 0.5)));
    }

    #[test]
    fn blasts_pin_everyone_nearby_except_the_shooter() {
        let maze = MazeState::from_layout(&["#########", "#.......#", "#########"]);
        let mut roster = AgentRoster::new();
        let shooter = roster.spawn(AgentKind::Bombardier, CellCoord::new(3, 1), &maze);
        let near = roster.spawn(AgentKind::Pursuer, CellCoord::new(4, 1), &maze);
        let far = roster.spawn(AgentKind::Stalker, CellCoord::new(7, 1), &maze);
        let now = Duration::from_secs(2);

        let held = roster.pin_bystanders(shooter, CellCoord::new(3, 1), now);

        assert_eq!(held, vec![near]);
        let pinned = roster.get(near).expect("spawned");
        assert!(pinned.body().is_held(now));
        assert!(pinned.body().is_held(now + BLAST_HOLD - Duration::from_millis(1)));
        assert!(!pinned.body().is_held(now + BLAST_HOLD));
        assert!(!roster.get(far).expect("spawned").body().is_held(now));
        assert!(!roster.get(shooter).expect("spawned").body().is_held(now));
    }

    #[test]
    fn ids_follow_spawn_order() {
        let maze = MazeState::from_layout(&["#####", "#...#", "#####"]);
        let mut roster = AgentRoster::new();
        for kind in AgentKind::ALL {
            let _ = roster.spawn(kind, CellCoord::new(2, 1), &maze);
        }
        let ids: Vec<u32> = roster.view().iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(roster.len(), 4);
    }
}
