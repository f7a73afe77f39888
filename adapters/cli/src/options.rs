//! Command-line arguments and their translation into level configuration.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use maze_escape_core::{CellCoord, Command};
use maze_escape_system_simulation::LevelConfig;

/// Output produced once the run finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Maze drawing followed by a roster table.
    Ascii,
    /// Machine-readable report.
    Json,
}

/// Generate a maze, simulate its agents against an idle player and report
/// the outcome.
#[derive(Debug, Parser)]
#[command(name = "maze-escape", version, about)]
pub(crate) struct CliArgs {
    /// TOML file describing the level; flags below override its fields.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// Seed for maze generation and agent randomness.
    #[arg(long)]
    pub(crate) seed: Option<u32>,
    /// Number of generators embedded in the maze walls.
    #[arg(long)]
    pub(crate) generators: Option<usize>,
    /// Whether a telepad pair is placed.
    #[arg(long, value_name = "BOOL")]
    pub(crate) telepads: Option<bool>,
    /// Initial difficulty tier.
    #[arg(long)]
    pub(crate) difficulty: Option<u8>,
    /// Simulated seconds to run.
    #[arg(long, value_name = "SECONDS", default_value_t = 10.0)]
    pub(crate) duration: f64,
    /// Length of one simulation tick in milliseconds.
    #[arg(
        long,
        value_name = "MILLIS",
        default_value_t = 50,
        value_parser = clap::value_parser!(u64).range(1..=1_000)
    )]
    pub(crate) tick_ms: u64,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Ascii)]
    pub(crate) format: OutputFormat,
    /// Trap placed before the first tick; may be repeated.
    #[arg(long = "trap", value_name = "COL,ROW", value_parser = parse_cell)]
    pub(crate) traps: Vec<CellCoord>,
    /// Noise raised before the first tick; may be repeated.
    #[arg(long = "noise", value_name = "COL,ROW", value_parser = parse_cell)]
    pub(crate) noises: Vec<CellCoord>,
    /// Freezes every agent for the given number of seconds at level start.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) freeze: Option<f64>,
    /// Suppresses player-harming events.
    #[arg(long)]
    pub(crate) god_mode: bool,
    /// Log filter directives; defaults to `RUST_LOG`, then `info`.
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_level: Option<String>,
}

impl CliArgs {
    /// Level configuration from the optional file with flag overrides applied.
    pub(crate) fn level_config(&self) -> Result<LevelConfig> {
        let mut level = match &self.config {
            Some(path) => load_level(path)?,
            None => LevelConfig::default(),
        };
        if let Some(seed) = self.seed {
            level.seed = seed;
        }
        if let Some(generators) = self.generators {
            level.generators = generators;
        }
        if let Some(telepads) = self.telepads {
            level.telepads = telepads;
        }
        if let Some(difficulty) = self.difficulty {
            level.difficulty = difficulty;
        }
        Ok(level)
    }

    /// Total simulated time to run.
    pub(crate) fn duration(&self) -> Result<Duration> {
        seconds(self.duration).with_context(|| format!("invalid duration {}", self.duration))
    }

    /// Length of a single tick.
    pub(crate) fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Commands applied before the first tick.
    pub(crate) fn opening_commands(&self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        if self.god_mode {
            commands.push(Command::SetGodMode { enabled: true });
        }
        commands.extend(self.traps.iter().map(|&cell| Command::PlaceTrap { cell }));
        commands.extend(self.noises.iter().map(|&cell| Command::RaiseNoise { cell }));
        if let Some(freeze) = self.freeze {
            let duration =
                seconds(freeze).with_context(|| format!("invalid freeze length {freeze}"))?;
            commands.push(Command::Freeze { duration });
        }
        Ok(commands)
    }
}

fn seconds(value: f64) -> Result<Duration> {
    Ok(Duration::try_from_secs_f64(value)?)
}

fn load_level(path: &Path) -> Result<LevelConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    parse_level(&text).with_context(|| format!("failed to parse level file {}", path.display()))
}

fn parse_level(text: &str) -> Result<LevelConfig, toml::de::Error> {
    toml::from_str(text)
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected COL,ROW but found `{value}`"))?;
    let column = column
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    Ok(CellCoord::new(column, row))
}
