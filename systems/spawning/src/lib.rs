#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic level-start placement for agents.
//!
//! Every archetype has a home anchor expressed as a fraction of the maze
//! size. The first agent of a kind spawns on the reachable floor tile nearest
//! its anchor; later agents of the same kind jitter the anchor with a seeded
//! generator so they spread out instead of stacking.

use maze_escape_core::{AgentKind, CellCoord, TileKind};
use maze_escape_world::{fractional_anchor, nearest_matching, DistanceField, Grid, MazeState};
use tracing::debug;

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;
const JITTER_SPAN: u64 = 5;

/// Default minimum walking distance between the player spawn and any agent.
pub const DEFAULT_MIN_DISTANCE: u32 = 10;

/// Default seed for the anchor jitter.
pub const DEFAULT_SEED: u64 = 0x4d59_5df4_d0f3_3173;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    min_distance: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from the minimum spawn distance and jitter seed.
    #[must_use]
    pub const fn new(min_distance: u32, rng_seed: u64) -> Self {
        Self {
            min_distance,
            rng_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DISTANCE, DEFAULT_SEED)
    }
}

/// Tile chosen for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnPoint {
    /// Archetype to spawn.
    pub kind: AgentKind,
    /// Floor tile the agent starts on.
    pub cell: CellCoord,
}

/// Pure system that resolves requested archetypes to distinct spawn tiles.
#[derive(Debug)]
pub struct Spawning {
    min_distance: u32,
    rng_state: u64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            min_distance: config.min_distance,
            rng_state: config.rng_seed,
        }
    }

    /// Resolves every requested archetype to a spawn tile, in request order.
    ///
    /// Tiles are plain floor, reachable from the player spawn, at least the
    /// configured walking distance away from it when possible, and never
    /// shared. Requests that cannot be satisfied at all are dropped.
    pub fn plan(&mut self, maze: &MazeState, kinds: &[AgentKind]) -> Vec<SpawnPoint> {
        let grid = maze.grid();
        let field = maze.agent_field(maze.spawn());
        let mut taken: Vec<CellCoord> = Vec::with_capacity(kinds.len());
        let mut placed_per_kind = [0_usize; AgentKind::ALL.len()];
        let mut points = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let slot = kind_slot(kind);
            let jitter = if placed_per_kind[slot] == 0 {
                (0, 0)
            } else {
                self.next_jitter()
            };
            placed_per_kind[slot] += 1;

            let (fx, fy) = home_anchor(kind);
            let anchor = fractional_anchor(grid.columns(), grid.rows(), fx, fy, jitter);
            let found = nearest_matching(grid.columns(), grid.rows(), anchor, |cell| {
                is_free_floor(grid, &field, &taken, cell)
                    && field
                        .reachable_distance(cell)
                        .is_some_and(|distance| distance >= self.min_distance)
            })
            .or_else(|| farthest_free_floor(grid, &field, &taken));

            match found {
                Some(cell) => {
                    taken.push(cell);
                    points.push(SpawnPoint { kind, cell });
                }
                None => debug!(kind = kind.label(), "no free floor left for agent"),
            }
        }

        points
    }

    fn next_jitter(&mut self) -> (i64, i64) {
        let value = self.advance_rng();
        let half = (JITTER_SPAN / 2) as i64;
        let dx = ((value >> 33) % JITTER_SPAN) as i64 - half;
        let dy = ((value >> 17) % JITTER_SPAN) as i64 - half;
        (dx, dy)
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

fn kind_slot(kind: AgentKind) -> usize {
    AgentKind::ALL
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(0)
}

/// Fractional home of each archetype; the pursuer starts in the corner
/// opposite the player.
fn home_anchor(kind: AgentKind) -> (f32, f32) {
    match kind {
        AgentKind::Pursuer => (0.95, 0.95),
        AgentKind::Stalker => (0.9, 0.1),
        AgentKind::Enforcer => (0.5, 0.5),
        AgentKind::Bombardier => (0.1, 0.9),
    }
}

fn is_free_floor(grid: &Grid, field: &DistanceField, taken: &[CellCoord], cell: CellCoord) -> bool {
    grid.kind(cell) == TileKind::Empty
        && field.reachable_distance(cell).is_some_and(|distance| distance > 0)
        && !taken.contains(&cell)
}

fn farthest_free_floor(grid: &Grid, field: &DistanceField, taken: &[CellCoord]) -> Option<CellCoord> {
    let mut best: Option<(u32, CellCoord)> = None;
    for cell in field.reachable_cells() {
        if !is_free_floor(grid, field, taken, cell) {
            continue;
        }
        let Some(distance) = field.reachable_distance(cell) else {
            continue;
        };
        if best.map_or(true, |(score, _)| distance > score) {
            best = Some((distance, cell));
        }
    }
    best.map(|(_, cell)| cell)
}
