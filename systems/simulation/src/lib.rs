#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation context for a Maze Escape level.
//!
//! A [`Simulation`] owns the generated maze, the agent roster and the trap
//! ledger. Callers drive it exclusively through [`apply`], which consumes one
//! [`Command`] and appends the resulting [`Event`]s to a caller-owned queue,
//! and observe it through the read-only [`query`] module.

mod config;

use std::time::Duration;

use maze_escape_core::{CellCoord, Command, Difficulty, Event};
use maze_escape_system_behavior::{AgentRoster, TickContext};
use maze_escape_system_hazard::HazardState;
use maze_escape_system_movement::thaw_factor;
use maze_escape_system_spawning::{Config as SpawnConfig, Spawning, DEFAULT_MIN_DISTANCE};
use maze_escape_world::{DistanceField, MazeState, Passability};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

pub use config::{ConfigError, LevelConfig, RosterConfig, MAX_AGENTS, MAX_GENERATORS};

/// Mutable state of one level.
#[derive(Debug)]
pub struct Simulation {
    maze: MazeState,
    roster: AgentRoster,
    hazards: HazardState,
    player: CellCoord,
    player_field: DistanceField,
    now: Duration,
    freeze_until: Option<Duration>,
    pending_noise: Vec<CellCoord>,
    difficulty: Difficulty,
    god_mode: bool,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Validates the configuration, generates the maze and spawns the roster.
    pub fn new(config: &LevelConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let maze = MazeState::generate(&config.maze_config());
        let mut spawning = Spawning::new(SpawnConfig::new(
            DEFAULT_MIN_DISTANCE,
            u64::from(config.seed),
        ));
        let mut roster = AgentRoster::new();
        for point in spawning.plan(&maze, &config.roster.kinds()) {
            let _ = roster.spawn(point.kind, point.cell, &maze);
        }

        let player = maze.spawn();
        let player_field = maze.agent_field(player);
        info!(
            seed = config.seed,
            columns = maze.grid().columns(),
            rows = maze.grid().rows(),
            generators = maze.generators().len(),
            telepads = maze.telepads().len(),
            agents = roster.len(),
            embellishment_aborted = maze.embellishment().aborted,
            "level constructed"
        );

        Ok(Self {
            maze,
            roster,
            hazards: HazardState::new(),
            player,
            player_field,
            now: Duration::ZERO,
            freeze_until: None,
            pending_noise: Vec::new(),
            difficulty: Difficulty::new(config.difficulty),
            god_mode: false,
            rng: ChaCha8Rng::seed_from_u64(u64::from(config.seed)),
        })
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.now = self.now.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let mut events = Vec::new();
        self.hazards.expire(self.now, &mut events);

        let (frozen, thaw) = match self.freeze_until {
            Some(until) if self.now < until => (true, 0.0),
            Some(until) => (false, thaw_factor(self.now, until)),
            None => (false, 1.0),
        };

        let noises = std::mem::take(&mut self.pending_noise);
        let mut ctx = TickContext {
            now: self.now,
            dt,
            maze: &mut self.maze,
            player: self.player,
            player_field: &self.player_field,
            noises: &noises,
            difficulty: self.difficulty,
            thaw,
            frozen,
            rng: &mut self.rng,
        };
        let raised = self.roster.update(&mut ctx, &mut events);
        self.hazards
            .resolve_contacts(self.roster.iter_mut(), self.now, &mut events);
        for cell in raised {
            self.raise_noise(cell, &mut events);
        }

        if self.god_mode {
            events.retain(|event| !harms_player(event));
        }
        out_events.extend(events);
    }

    fn move_player(&mut self, cell: CellCoord) {
        if !self.maze.is_walkable(cell) {
            warn!(?cell, "ignoring player move onto an impassable tile");
            return;
        }
        self.player = cell;
        if self.player_field.origin() != Some(cell) {
            self.player_field
                .rebuild(self.maze.grid(), cell, Passability::Agent);
        }
    }

    fn raise_noise(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        self.pending_noise.push(cell);
        out_events.push(Event::NoiseRaised { cell });
    }

    fn freeze(&mut self, duration: Duration, out_events: &mut Vec<Event>) {
        let until = self.now.saturating_add(duration);
        let until = self.freeze_until.map_or(until, |current| current.max(until));
        self.freeze_until = Some(until);
        out_events.push(Event::FreezeStarted { until });
    }

    fn update_generator(&mut self, index: usize, progress: f32, completed: bool) {
        let Some(generator) = self.maze.generator_mut(index) else {
            warn!(index, "ignoring update for an unknown generator");
            return;
        };
        generator.progress = progress.clamp(0.0, 1.0);
        generator.completed = completed;
    }
}

fn harms_player(event: &Event) -> bool {
    matches!(
        event,
        Event::AgentTouchedPlayer { .. } | Event::PlayerPunished { .. } | Event::PlayerHit { .. }
    )
}

/// Applies the provided command to the simulation, mutating state
/// deterministically.
pub fn apply(simulation: &mut Simulation, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => simulation.tick(dt, out_events),
        Command::MovePlayer { cell } => simulation.move_player(cell),
        Command::PlaceTrap { cell } => {
            simulation
                .hazards
                .place_trap(simulation.maze.grid(), cell, simulation.now, out_events);
        }
        Command::RaiseNoise { cell } => simulation.raise_noise(cell, out_events),
        Command::Freeze { duration } => simulation.freeze(duration, out_events),
        Command::SetDifficulty { difficulty } => simulation.difficulty = difficulty,
        Command::SetGodMode { enabled } => simulation.god_mode = enabled,
        Command::UpdateGenerator {
            index,
            progress,
            completed,
        } => simulation.update_generator(index, progress, completed),
    }
}

/// Query functions that provide read-only access to the simulation.
pub mod query {
    use std::time::Duration;

    use maze_escape_core::{AgentView, CellCoord, Difficulty, TrapSnapshot};
    use maze_escape_system_behavior::AgentRoster;
    use maze_escape_world::{query::MazeSnapshot, DistanceField, MazeState};

    use super::Simulation;

    /// Generated maze with its features.
    #[must_use]
    pub fn maze(simulation: &Simulation) -> &MazeState {
        &simulation.maze
    }

    /// Serializable description of the maze layout and features.
    #[must_use]
    pub fn maze_snapshot(simulation: &Simulation) -> MazeSnapshot {
        maze_escape_world::query::snapshot(&simulation.maze)
    }

    /// Snapshot of every agent, sorted by id.
    #[must_use]
    pub fn agent_view(simulation: &Simulation) -> AgentView {
        simulation.roster.view()
    }

    /// Full agent state, including archetype internals.
    #[must_use]
    pub fn roster(simulation: &Simulation) -> &AgentRoster {
        &simulation.roster
    }

    /// Traps still on the floor, in placement order.
    #[must_use]
    pub fn traps(simulation: &Simulation) -> Vec<TrapSnapshot> {
        simulation.hazards.snapshots()
    }

    /// Tile occupied by the player.
    #[must_use]
    pub fn player(simulation: &Simulation) -> CellCoord {
        simulation.player
    }

    /// Agent-passability distance field rooted at the player.
    #[must_use]
    pub fn player_field(simulation: &Simulation) -> &DistanceField {
        &simulation.player_field
    }

    /// Simulated time elapsed since level start.
    #[must_use]
    pub fn now(simulation: &Simulation) -> Duration {
        simulation.now
    }

    /// End of the most recent freeze, if one was ever requested.
    #[must_use]
    pub fn freeze_until(simulation: &Simulation) -> Option<Duration> {
        simulation.freeze_until
    }

    /// Active difficulty tier.
    #[must_use]
    pub fn difficulty(simulation: &Simulation) -> Difficulty {
        simulation.difficulty
    }

    /// Whether player-harming events are suppressed.
    #[must_use]
    pub fn god_mode(simulation: &Simulation) -> bool {
        simulation.god_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_level() -> Simulation {
        Simulation::new(&LevelConfig {
            roster: RosterConfig::empty(),
            ..LevelConfig::default()
        })
        .expect("default level is valid")
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = LevelConfig {
            generators: MAX_GENERATORS + 1,
            ..LevelConfig::default()
        };
        assert!(matches!(
            Simulation::new(&config),
            Err(ConfigError::TooManyGenerators { .. })
        ));
    }

    #[test]
    fn tick_advances_the_clock() {
        let mut simulation = quiet_level();
        let mut events = Vec::new();
        apply(
            &mut simulation,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(250)
            }]
        );
        assert_eq!(query::now(&simulation), Duration::from_millis(250));
    }

    #[test]
    fn player_moves_onto_walls_are_ignored() {
        let mut simulation = quiet_level();
        let mut events = Vec::new();
        apply(
            &mut simulation,
            Command::MovePlayer {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::player(&simulation), CellCoord::new(1, 1));
    }

    #[test]
    fn player_field_follows_the_player() {
        let mut simulation = quiet_level();
        let target = query::maze(&simulation)
            .agent_field(CellCoord::new(1, 1))
            .reachable_cells()
            .find(|cell| *cell != CellCoord::new(1, 1))
            .expect("spawn has company");
        let mut events = Vec::new();
        apply(&mut simulation, Command::MovePlayer { cell: target }, &mut events);
        assert_eq!(query::player(&simulation), target);
        assert_eq!(query::player_field(&simulation).distance(target), Some(0));
        assert_eq!(query::player_field(&simulation).origin(), Some(target));
    }

    #[test]
    fn every_noise_in_a_tick_reaches_the_agents() {
        let mut simulation = quiet_level();
        let first = CellCoord::new(1, 1);
        let second = query::maze(&simulation).exit();
        let mut events = Vec::new();
        apply(&mut simulation, Command::RaiseNoise { cell: first }, &mut events);
        apply(&mut simulation, Command::RaiseNoise { cell: second }, &mut events);

        assert_eq!(simulation.pending_noise, vec![first, second]);
        assert_eq!(
            events,
            vec![
                Event::NoiseRaised { cell: first },
                Event::NoiseRaised { cell: second },
            ]
        );

        apply(
            &mut simulation,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut events,
        );
        assert!(simulation.pending_noise.is_empty());
    }

    #[test]
    fn overlapping_freezes_keep_the_later_deadline() {
        let mut simulation = quiet_level();
        let mut events = Vec::new();
        apply(
            &mut simulation,
            Command::Freeze {
                duration: Duration::from_secs(5),
            },
            &mut events,
        );
        apply(
            &mut simulation,
            Command::Freeze {
                duration: Duration::from_secs(1),
            },
            &mut events,
        );
        assert_eq!(query::freeze_until(&simulation), Some(Duration::from_secs(5)));
        assert_eq!(
            events.last(),
            Some(&Event::FreezeStarted {
                until: Duration::from_secs(5)
            })
        );
    }

    #[test]
    fn generator_updates_are_clamped() {
        let mut simulation = quiet_level();
        let mut events = Vec::new();
        apply(
            &mut simulation,
            Command::UpdateGenerator {
                index: 0,
                progress: 1.5,
                completed: true,
            },
            &mut events,
        );
        let generator = query::maze(&simulation).generators()[0];
        assert!((generator.progress - 1.0).abs() < f32::EPSILON);
        assert!(generator.completed);
        assert_eq!(query::maze(&simulation).completed_generators(), 1);
    }
}
