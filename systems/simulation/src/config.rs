//! Level configuration consumed once by [`crate::Simulation::new`].

use maze_escape_core::{AgentKind, Difficulty};
use maze_escape_world::{MazeConfig, MAX_DIMENSION, MIN_DIMENSION};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of generators a level may request.
pub const MAX_GENERATORS: usize = 16;

/// Largest number of agents a level may request.
pub const MAX_AGENTS: usize = 64;

/// Reasons a level configuration is rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Maze dimensions outside the supported range.
    #[error("maze dimensions {columns}x{rows} are outside {min}..={max}")]
    Dimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
        /// Smallest supported side length.
        min: u32,
        /// Largest supported side length.
        max: u32,
    },
    /// More generators than a maze can hold.
    #[error("generator count {requested} exceeds the maximum of {max}")]
    TooManyGenerators {
        /// Requested generator count.
        requested: usize,
        /// Largest supported generator count.
        max: usize,
    },
    /// Difficulty tier above the supported maximum.
    #[error("difficulty tier {requested} exceeds the maximum of {max}")]
    Difficulty {
        /// Requested tier.
        requested: u8,
        /// Highest supported tier.
        max: u8,
    },
    /// Roster larger than the simulation supports.
    #[error("roster of {requested} agents exceeds the maximum of {max}")]
    TooManyAgents {
        /// Requested agent count.
        requested: usize,
        /// Largest supported agent count.
        max: usize,
    },
}

/// Number of agents of each archetype spawned at level start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Pursuers.
    pub pursuers: usize,
    /// Stalkers.
    pub stalkers: usize,
    /// Enforcers.
    pub enforcers: usize,
    /// Bombardiers.
    pub bombardiers: usize,
}

impl RosterConfig {
    /// A roster with no agents at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            pursuers: 0,
            stalkers: 0,
            enforcers: 0,
            bombardiers: 0,
        }
    }

    /// Total number of agents.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pursuers + self.stalkers + self.enforcers + self.bombardiers
    }

    /// Requested archetypes in spawn order: pursuers first, bombardiers last.
    #[must_use]
    pub fn kinds(&self) -> Vec<AgentKind> {
        let counts = [
            (AgentKind::Pursuer, self.pursuers),
            (AgentKind::Stalker, self.stalkers),
            (AgentKind::Enforcer, self.enforcers),
            (AgentKind::Bombardier, self.bombardiers),
        ];
        counts
            .into_iter()
            .flat_map(|(kind, count)| std::iter::repeat(kind).take(count))
            .collect()
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            pursuers: 1,
            stalkers: 1,
            enforcers: 1,
            bombardiers: 1,
        }
    }
}

/// Everything needed to build a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Seed for maze generation and agent randomness.
    pub seed: u32,
    /// Number of columns, border included.
    pub columns: u32,
    /// Number of rows, border included.
    pub rows: u32,
    /// Generators to embed in walls.
    pub generators: usize,
    /// Whether a telepad pair is placed.
    pub telepads: bool,
    /// Initial difficulty tier.
    pub difficulty: u8,
    /// Agents spawned at level start.
    pub roster: RosterConfig,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let maze = MazeConfig::default();
        Self {
            seed: maze.seed,
            columns: maze.columns,
            rows: maze.rows,
            generators: maze.generator_count,
            telepads: maze.include_telepads,
            difficulty: 0,
            roster: RosterConfig::default(),
        }
    }
}

impl LevelConfig {
    /// Checks every field against the supported ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let supported = MIN_DIMENSION..=MAX_DIMENSION;
        if !supported.contains(&self.columns) || !supported.contains(&self.rows) {
            return Err(ConfigError::Dimensions {
                columns: self.columns,
                rows: self.rows,
                min: MIN_DIMENSION,
                max: MAX_DIMENSION,
            });
        }
        if self.generators > MAX_GENERATORS {
            return Err(ConfigError::TooManyGenerators {
                requested: self.generators,
                max: MAX_GENERATORS,
            });
        }
        if self.difficulty > Difficulty::MAX_TIER {
            return Err(ConfigError::Difficulty {
                requested: self.difficulty,
                max: Difficulty::MAX_TIER,
            });
        }
        if self.roster.total() > MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                requested: self.roster.total(),
                max: MAX_AGENTS,
            });
        }
        Ok(())
    }

    /// Maze generation inputs derived from the level.
    #[must_use]
    pub fn maze_config(&self) -> MazeConfig {
        MazeConfig {
            columns: self.columns,
            rows: self.rows,
            seed: self.seed,
            generator_count: self.generators,
            include_telepads: self.telepads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(LevelConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        let config = LevelConfig {
            columns: 6,
            ..LevelConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Dimensions {
                columns: 6,
                rows: 30,
                min: MIN_DIMENSION,
                max: MAX_DIMENSION,
            })
        );

        let config = LevelConfig {
            rows: 256,
            ..LevelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Dimensions { .. })));
    }

    #[test]
    fn rejects_too_many_generators() {
        let config = LevelConfig {
            generators: MAX_GENERATORS + 1,
            ..LevelConfig::default()
        };
        let error = config.validate().expect_err("too many generators");
        assert_eq!(error.to_string(), "generator count 17 exceeds the maximum of 16");
    }

    #[test]
    fn partial_level_files_fill_in_defaults() {
        let config: LevelConfig = toml::from_str(
            r#"
            seed = 42
            telepads = false

            [roster]
            pursuers = 2
            bombardiers = 0
            "#,
        )
        .expect("valid level file");

        assert_eq!(config.seed, 42);
        assert!(!config.telepads);
        assert_eq!(config.columns, LevelConfig::default().columns);
        assert_eq!(
            config.roster,
            RosterConfig {
                pursuers: 2,
                stalkers: 1,
                enforcers: 1,
                bombardiers: 0,
            }
        );
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn roster_kinds_follow_spawn_order() {
        let roster = RosterConfig {
            pursuers: 1,
            stalkers: 2,
            enforcers: 0,
            bombardiers: 1,
        };
        assert_eq!(
            roster.kinds(),
            vec![
                AgentKind::Pursuer,
                AgentKind::Stalker,
                AgentKind::Stalker,
                AgentKind::Bombardier,
            ]
        );
        assert_eq!(roster.total(), 4);
    }
}
