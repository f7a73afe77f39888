#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative maze state and procedural generation for Maze Escape.
//!
//! A maze is produced once per level by [`MazeState::generate`], which runs
//! the carver, connectivity repair, the embellishment passes and feature
//! placement in a fixed order driven by a single [`MazeRng`]. After generation
//! the grid layout never changes; only generator progress and telepad
//! cooldowns are mutated by the simulation.

mod carve;
mod embellish;
mod features;
mod grid;
mod navigation;
mod repair;
mod rng;
mod search;

use std::time::Duration;

use maze_escape_core::{CellCoord, TileKind, Timer};
use serde::Serialize;
use tracing::debug;

pub use embellish::{EmbellishReport, DEAD_END_REJOIN_REACH};
pub use grid::Grid;
pub use navigation::{DistanceField, Passability, UNREACHABLE};
pub use repair::{RepairReport, MAX_REPAIR_ATTEMPTS};
pub use rng::MazeRng;
pub use search::{fractional_anchor, nearest_matching};

/// Smallest supported side length, border included.
pub const MIN_DIMENSION: u32 = 7;

/// Largest supported side length, border included.
pub const MAX_DIMENSION: u32 = 255;

/// Tile the player starts on and every reachability check is rooted at.
pub const SPAWN: CellCoord = CellCoord::new(1, 1);

/// Extra single-tile openings scattered after carving.
pub const SCATTER_OPENINGS: usize = 6;

const DEFAULT_DIMENSION: u32 = 30;
const DEFAULT_GENERATOR_COUNT: usize = 3;

/// Inputs that fully determine a generated maze.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MazeConfig {
    /// Number of columns, border included.
    pub columns: u32,
    /// Number of rows, border included.
    pub rows: u32,
    /// Seed for the generation stream.
    pub seed: u32,
    /// Number of generators to embed in walls.
    pub generator_count: usize,
    /// Whether a telepad pair should be placed.
    pub include_telepads: bool,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_DIMENSION,
            rows: DEFAULT_DIMENSION,
            seed: 1,
            generator_count: DEFAULT_GENERATOR_COUNT,
            include_telepads: true,
        }
    }
}

/// Generator embedded in a wall next to a corridor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Generator {
    /// Wall tile holding the generator.
    pub cell: CellCoord,
    /// Whether the player finished the generator.
    pub completed: bool,
    /// Repair progress in the range `0.0..=1.0`.
    pub progress: f32,
    /// Number of failed interaction attempts.
    pub fail_count: u32,
    /// Window during which the generator refuses interaction.
    pub blocked: Timer,
}

impl Generator {
    fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            completed: false,
            progress: 0.0,
            fail_count: 0,
            blocked: Timer::elapsed(),
        }
    }
}

/// One half of a paired teleport pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Telepad {
    /// Tile holding the pad.
    pub cell: CellCoord,
    /// Cooldown armed whenever the pad is used.
    pub cooldown: Timer,
    /// Index of the partner pad.
    pub pair_index: usize,
}

impl Telepad {
    /// Reports whether the pad may be used at `now`.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        self.cooldown.is_ready(now)
    }
}

/// Generated maze together with its placed features.
#[derive(Clone, Debug, PartialEq)]
pub struct MazeState {
    config: MazeConfig,
    grid: Grid,
    exit: CellCoord,
    generators: Vec<Generator>,
    telepads: Vec<Telepad>,
    embellishment: EmbellishReport,
}

impl MazeState {
    /// Generates a maze from the provided configuration.
    ///
    /// Dimensions are clamped to `MIN_DIMENSION..=MAX_DIMENSION`. The result is
    /// a pure function of the configuration.
    #[must_use]
    pub fn generate(config: &MazeConfig) -> Self {
        let mut config = config.clone();
        config.columns = config.columns.clamp(MIN_DIMENSION, MAX_DIMENSION);
        config.rows = config.rows.clamp(MIN_DIMENSION, MAX_DIMENSION);

        let mut rng = MazeRng::new(config.seed);
        let mut grid = Grid::filled(config.columns, config.rows, TileKind::Wall);

        carve::carve_passages(&mut grid, &mut rng, SPAWN);
        let scattered = carve::scatter_openings(&mut grid, &mut rng, SCATTER_OPENINGS);
        let initial = repair::repair(&mut grid, SPAWN);
        debug!(
            seed = config.seed,
            scattered,
            bridged = initial.bridged,
            sealed = initial.sealed,
            "carved maze"
        );

        let embellishment = embellish::embellish(&mut grid, &mut rng, SPAWN);

        let exit = features::place_exit(&mut grid, SPAWN);
        let generators =
            features::place_generators(&mut grid, &mut rng, SPAWN, config.generator_count)
                .into_iter()
                .map(Generator::new)
                .collect();
        let telepads = if config.include_telepads {
            pair_telepads(features::place_telepads(&mut grid, SPAWN, exit))
        } else {
            Vec::new()
        };

        debug!(
            seed = config.seed,
            ?exit,
            open = grid.count(TileKind::Empty),
            "maze generated"
        );

        Self {
            config,
            grid,
            exit,
            generators,
            telepads,
            embellishment,
        }
    }

    /// Builds a maze from hand-authored glyph rows (`#`, `.`, `E`, `G`, `T`).
    ///
    /// Features are read from the glyphs in row-major order; telepads pair up
    /// consecutively and a trailing unpaired pad is ignored. When no `E` is
    /// present the spawn tile doubles as the exit. No repair is performed, so
    /// the caller owns the layout's connectivity.
    #[must_use]
    pub fn from_layout(lines: &[&str]) -> Self {
        let grid = Grid::from_rows(lines);
        let cells_of = |kind: TileKind| -> Vec<CellCoord> {
            grid.cells().filter(|cell| grid.kind(*cell) == kind).collect()
        };
        let exit = cells_of(TileKind::Exit).first().copied().unwrap_or(SPAWN);
        let generators: Vec<Generator> = cells_of(TileKind::Generator)
            .into_iter()
            .map(Generator::new)
            .collect();
        let telepads = pair_telepads(cells_of(TileKind::Telepad));
        let config = MazeConfig {
            columns: grid.columns(),
            rows: grid.rows(),
            seed: 0,
            generator_count: generators.len(),
            include_telepads: !telepads.is_empty(),
        };

        Self {
            config,
            grid,
            exit,
            generators,
            telepads,
            embellishment: EmbellishReport::default(),
        }
    }

    /// Configuration the maze was generated from, after clamping.
    #[must_use]
    pub fn config(&self) -> &MazeConfig {
        &self.config
    }

    /// Tile layout.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Seed the maze was generated from.
    #[must_use]
    pub fn seed(&self) -> u32 {
        self.config.seed
    }

    /// Spawn tile.
    #[must_use]
    pub const fn spawn(&self) -> CellCoord {
        SPAWN
    }

    /// Exit tile.
    #[must_use]
    pub fn exit(&self) -> CellCoord {
        self.exit
    }

    /// Generators in placement order.
    #[must_use]
    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Telepads in creation order; partners are adjacent pairs.
    #[must_use]
    pub fn telepads(&self) -> &[Telepad] {
        &self.telepads
    }

    /// Summary of the embellishment passes that shaped the maze.
    #[must_use]
    pub fn embellishment(&self) -> &EmbellishReport {
        &self.embellishment
    }

    /// Reports whether agents may walk onto the tile.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.grid.is_passable(cell, Passability::Agent)
    }

    /// Index of the telepad occupying the tile, if any.
    #[must_use]
    pub fn telepad_at(&self, cell: CellCoord) -> Option<usize> {
        self.telepads.iter().position(|pad| pad.cell == cell)
    }

    /// Partner of the telepad at `index`.
    #[must_use]
    pub fn partner(&self, index: usize) -> Option<&Telepad> {
        let pad = self.telepads.get(index)?;
        self.telepads.get(pad.pair_index)
    }

    /// Sends a traveller through the pad at `index` when both ends are ready,
    /// arming `cooldown` on both and returning the destination tile.
    pub fn teleport(&mut self, index: usize, now: Duration, cooldown: Duration) -> Option<CellCoord> {
        let pair_index = self.telepads.get(index)?.pair_index;
        let ready = self.telepads.get(index)?.is_ready(now)
            && self.telepads.get(pair_index)?.is_ready(now);
        if !ready {
            return None;
        }
        for pad_index in [index, pair_index] {
            if let Some(pad) = self.telepads.get_mut(pad_index) {
                pad.cooldown = Timer::start(now, cooldown);
            }
        }
        self.telepads.get(pair_index).map(|pad| pad.cell)
    }

    /// Mutable access to a generator for interaction updates.
    pub fn generator_mut(&mut self, index: usize) -> Option<&mut Generator> {
        self.generators.get_mut(index)
    }

    /// Number of generators the player has completed.
    #[must_use]
    pub fn completed_generators(&self) -> usize {
        self.generators.iter().filter(|generator| generator.completed).count()
    }

    /// Distance field over agent-walkable tiles rooted at `origin`.
    #[must_use]
    pub fn agent_field(&self, origin: CellCoord) -> DistanceField {
        DistanceField::from_origin(&self.grid, origin, Passability::Agent)
    }
}

fn pair_telepads(cells: Vec<CellCoord>) -> Vec<Telepad> {
    let paired = cells.len() - cells.len() % 2;
    cells
        .into_iter()
        .take(paired)
        .enumerate()
        .map(|(index, cell)| Telepad {
            cell,
            cooldown: Timer::elapsed(),
            pair_index: index ^ 1,
        })
        .collect()
}

/// Query functions that provide read-only access to a generated maze.
pub mod query {
    use maze_escape_core::{CellCoord, TileKind};
    use serde::Serialize;

    use super::{Generator, MazeState, Telepad};

    /// Tile kind at the provided coordinate.
    #[must_use]
    pub fn tile(maze: &MazeState, cell: CellCoord) -> TileKind {
        maze.grid.kind(cell)
    }

    /// Rows of tile glyphs, top to bottom.
    #[must_use]
    pub fn glyph_rows(maze: &MazeState) -> Vec<String> {
        (0..maze.grid.rows())
            .map(|row| {
                (0..maze.grid.columns())
                    .map(|column| maze.grid.kind(CellCoord::new(column, row)).glyph())
                    .collect()
            })
            .collect()
    }

    /// Captures a serializable snapshot of the maze layout and features.
    #[must_use]
    pub fn snapshot(maze: &MazeState) -> MazeSnapshot {
        MazeSnapshot {
            seed: maze.seed(),
            columns: maze.grid.columns(),
            rows: glyph_rows(maze),
            spawn: maze.spawn(),
            exit: maze.exit,
            generators: maze.generators.clone(),
            telepads: maze.telepads.clone(),
        }
    }

    /// Serializable description of a generated maze.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct MazeSnapshot {
        /// Seed the maze was generated from.
        pub seed: u32,
        /// Number of columns.
        pub columns: u32,
        /// Glyph rows, top to bottom.
        pub rows: Vec<String>,
        /// Spawn tile.
        pub spawn: CellCoord,
        /// Exit tile.
        pub exit: CellCoord,
        /// Generators in placement order.
        pub generators: Vec<Generator>,
        /// Telepads in creation order.
        pub telepads: Vec<Telepad>,
    }
}
