#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Escape simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative maze, and the agent systems. Adapters submit [`Command`]
//! values describing player input and global flags, the simulation executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values describing everything renderers, audio and the health system may
//! want to react to. Nothing in this crate performs work; it only names things.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev (king-move) distance between two coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Applies a signed offset, returning `None` when the result leaves the
    /// `columns` × `rows` rectangle.
    #[must_use]
    pub fn offset(self, dx: i64, dy: i64, columns: u32, rows: u32) -> Option<CellCoord> {
        let column = i64::from(self.column) + dx;
        let row = i64::from(self.row) + dy;
        if column < 0 || row < 0 || column >= i64::from(columns) || row >= i64::from(rows) {
            return None;
        }
        Some(CellCoord::new(
            u32::try_from(column).ok()?,
            u32::try_from(row).ok()?,
        ))
    }

    /// Moves `distance` tiles in the provided direction if the result stays in bounds.
    #[must_use]
    pub fn step(self, direction: Direction, distance: u32, columns: u32, rows: u32) -> Option<Self> {
        let (dx, dy) = direction.delta();
        let distance = i64::from(distance);
        self.offset(
            i64::from(dx) * distance,
            i64::from(dy) * distance,
            columns,
            rows,
        )
    }

    /// Centre of the tile expressed in continuous tile units.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32)
    }
}

/// Cardinal movement directions. The declaration order doubles as the
/// canonical neighbour iteration order used by every search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in canonical order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`, if they are adjacent.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

/// Kind of content stored in a single maze tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Solid, impassable tile.
    Wall,
    /// Open corridor tile.
    Empty,
    /// The single exit tile.
    Exit,
    /// A generator embedded in a wall next to a corridor.
    Generator,
    /// One half of a paired teleport pad.
    Telepad,
}

impl TileKind {
    /// Glyph used by text adapters and test fixtures.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Empty => '.',
            Self::Exit => 'E',
            Self::Generator => 'G',
            Self::Telepad => 'T',
        }
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Archetype of a non-player agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    /// Continuous chaser that can leap across single walls.
    Pursuer,
    /// Roaming hunter that enrages on line of sight.
    Stalker,
    /// Proximity-triggered punisher that flees after contact.
    Enforcer,
    /// Skittish artillery agent that lobs telegraphed blasts.
    Bombardier,
}

impl AgentKind {
    /// All archetypes in declaration order.
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Pursuer,
        AgentKind::Stalker,
        AgentKind::Enforcer,
        AgentKind::Bombardier,
    ];

    /// Lowercase label used by logs and text adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pursuer => "pursuer",
            Self::Stalker => "stalker",
            Self::Enforcer => "enforcer",
            Self::Bombardier => "bombardier",
        }
    }
}

/// Public behavioural state of an agent, flattened across archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorTag {
    /// Direct pursuit of the player (pursuer base state).
    Chase,
    /// Pursuer paused before jumping across a wall.
    LeapTelegraph,
    /// Passive wandering between far-away goals.
    Roam,
    /// Investigating a noise ping.
    Alert,
    /// Aggressive pursuit.
    Rage,
    /// Actively retreating from the player.
    Flee,
    /// Bombardier locking and telegraphing a blast.
    Aim,
    /// Bombardier recovering after firing.
    Cooldown,
    /// Bombardier knocked out of action.
    Disabled,
}

/// Reusable deadline pair used for every cooldown, telegraph and hazard window.
///
/// Both instants are measured as simulated time elapsed since level start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timer {
    armed_at: Duration,
    fires_at: Duration,
}

impl Timer {
    /// Arms a timer at `now` that fires after `duration`.
    #[must_use]
    pub fn start(now: Duration, duration: Duration) -> Self {
        Self {
            armed_at: now,
            fires_at: now.saturating_add(duration),
        }
    }

    /// A timer that has already fired.
    #[must_use]
    pub const fn elapsed() -> Self {
        Self {
            armed_at: Duration::ZERO,
            fires_at: Duration::ZERO,
        }
    }

    /// Instant at which the timer was armed.
    #[must_use]
    pub const fn armed_at(&self) -> Duration {
        self.armed_at
    }

    /// Instant at which the timer fires.
    #[must_use]
    pub const fn fires_at(&self) -> Duration {
        self.fires_at
    }

    /// Reports whether the deadline has been reached.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        now >= self.fires_at
    }

    /// Reports whether the window is still open.
    #[must_use]
    pub fn is_active(&self, now: Duration) -> bool {
        !self.is_ready(now)
    }

    /// Time left until the deadline, saturating at zero.
    #[must_use]
    pub fn remaining(&self, now: Duration) -> Duration {
        self.fires_at.saturating_sub(now)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::elapsed()
    }
}

/// Global difficulty tier supplied by the level configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Difficulty(u8);

impl Difficulty {
    /// Highest supported tier; larger requests are clamped.
    pub const MAX_TIER: u8 = 3;

    /// Creates a difficulty tier, clamping to [`Difficulty::MAX_TIER`].
    #[must_use]
    pub fn new(tier: u8) -> Self {
        Self(tier.min(Self::MAX_TIER))
    }

    /// Numeric tier.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.0
    }

    /// Movement speed multiplier applied to every agent.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        1.0 + 0.1 * f32::from(self.0)
    }

    /// Whether bombardiers follow up with a second, offset shot.
    #[must_use]
    pub const fn allows_follow_up_shot(&self) -> bool {
        self.0 >= 2
    }
}

/// Reasons a trap placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapRejection {
    /// The requested tile lies outside the grid.
    OutOfBounds,
    /// The requested tile cannot be walked on by agents.
    Impassable,
    /// An untriggered trap already occupies the tile.
    AlreadyTrapped,
}

/// Commands that express all permissible inputs to the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports the player's current discrete tile.
    MovePlayer {
        /// Tile occupied by the player.
        cell: CellCoord,
    },
    /// Requests placement of a trap on the provided tile.
    PlaceTrap {
        /// Tile that should receive the trap.
        cell: CellCoord,
    },
    /// Raises a noise ping that nearby agents may investigate.
    RaiseNoise {
        /// Tile the noise originates from.
        cell: CellCoord,
    },
    /// Freezes every agent for the provided duration, followed by a thaw ramp.
    Freeze {
        /// Length of the freeze measured from the current simulated time.
        duration: Duration,
    },
    /// Changes the global difficulty tier.
    SetDifficulty {
        /// New difficulty tier.
        difficulty: Difficulty,
    },
    /// Toggles god mode, which suppresses player-harming events.
    SetGodMode {
        /// Whether god mode is active.
        enabled: bool,
    },
    /// Updates interaction state on a generator.
    UpdateGenerator {
        /// Index of the generator in placement order.
        index: usize,
        /// Repair progress in the range `0.0..=1.0`.
        progress: f32,
        /// Whether the generator has been completed.
        completed: bool,
    },
}

/// Events broadcast by the simulation after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent entered a new discrete tile.
    AgentMoved {
        /// Agent that moved.
        agent: AgentId,
        /// Tile occupied before the move.
        from: CellCoord,
        /// Tile occupied after the move.
        to: CellCoord,
    },
    /// Announces that an agent's behavioural state changed.
    BehaviorChanged {
        /// Agent whose state changed.
        agent: AgentId,
        /// State before the transition.
        from: BehaviorTag,
        /// State after the transition.
        to: BehaviorTag,
    },
    /// A pursuer committed to leaping across a wall.
    LeapTelegraphed {
        /// Leaping agent.
        agent: AgentId,
        /// Tile the agent will land on.
        landing: CellCoord,
        /// Instant at which the leap resolves.
        resolves_at: Duration,
    },
    /// A pursuer completed a leap.
    AgentLeaped {
        /// Leaping agent.
        agent: AgentId,
        /// Tile the agent left.
        from: CellCoord,
        /// Tile the agent landed on.
        to: CellCoord,
    },
    /// An agent made contact with the player.
    AgentTouchedPlayer {
        /// Agent that touched the player.
        agent: AgentId,
        /// Archetype of the agent.
        kind: AgentKind,
    },
    /// An enforcer applied its punishment to the player.
    PlayerPunished {
        /// Punishing agent.
        agent: AgentId,
        /// Length of the player stun.
        stun: Duration,
    },
    /// A blast caught the player.
    PlayerHit {
        /// Agent that fired the blast.
        agent: AgentId,
        /// Length of the player stun.
        stun: Duration,
    },
    /// A bombardier locked a target tile and began telegraphing.
    BlastTelegraphed {
        /// Firing agent.
        agent: AgentId,
        /// Centre of the blast.
        target: CellCoord,
        /// Instant at which the blast resolves.
        resolves_at: Duration,
    },
    /// A blast resolved.
    BlastResolved {
        /// Firing agent.
        agent: AgentId,
        /// Centre of the blast.
        center: CellCoord,
        /// Whether the player was inside the blast.
        hit_player: bool,
        /// Other agents held in place by the blast.
        held: Vec<AgentId>,
        /// Whether the firing agent caught itself.
        self_hit: bool,
    },
    /// A bombardier was tackled by the player.
    AgentTackled {
        /// Tackled agent.
        agent: AgentId,
    },
    /// An agent teleported between paired pads.
    TelepadUsed {
        /// Teleporting agent.
        agent: AgentId,
        /// Pad the agent entered.
        from: CellCoord,
        /// Pad the agent exited.
        to: CellCoord,
    },
    /// Confirms that a trap was placed.
    TrapPlaced {
        /// Tile holding the trap.
        cell: CellCoord,
    },
    /// Reports that a trap placement request was rejected.
    TrapRejected {
        /// Tile provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: TrapRejection,
    },
    /// A trap caught an agent.
    TrapTriggered {
        /// Tile holding the trap.
        cell: CellCoord,
        /// Agent that stepped on the trap.
        agent: AgentId,
        /// Whether the stun and slow were applied.
        stunned: bool,
    },
    /// A trap expired untriggered.
    TrapExpired {
        /// Tile that held the trap.
        cell: CellCoord,
    },
    /// A noise ping was raised.
    NoiseRaised {
        /// Tile the noise originates from.
        cell: CellCoord,
    },
    /// A global freeze began.
    FreezeStarted {
        /// Instant at which the freeze ends and the thaw begins.
        until: Duration,
    },
}

/// Immutable representation of a single agent's public state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Archetype of the agent.
    pub kind: AgentKind,
    /// Continuous position measured in tile units.
    pub position: Vec2,
    /// Discrete tile currently occupied.
    pub cell: CellCoord,
    /// Tile the agent is moving toward, if any.
    pub target: Option<CellCoord>,
    /// Public behavioural state.
    pub state: BehaviorTag,
    /// Instant a pending telegraph resolves, if one is in flight.
    pub telegraph_until: Option<Duration>,
}

/// Read-only snapshot describing all agents within the maze.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for one agent.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a placed trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapSnapshot {
    /// Tile holding the trap.
    pub cell: CellCoord,
    /// Instant the trap was placed.
    pub placed_at: Duration,
    /// Instant the trap expires.
    pub expires_at: Duration,
    /// Whether an agent already sprang the trap.
    pub triggered: bool,
}
