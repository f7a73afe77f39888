#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Trap ledger and the archetype-independent hazard coupling rule.
//!
//! Every agent that walks on the floor implements [`Grounded`]. After agents
//! move each tick the simulation hands them to
//! [`HazardState::resolve_contacts`], which springs traps under them, stuns and
//! slows the victims, and forces them back to their base behaviour.

use std::time::Duration;

use maze_escape_core::{AgentId, CellCoord, Event, Timer, TrapRejection, TrapSnapshot};
use maze_escape_world::{Grid, Passability};
use tracing::debug;

/// Length of the stun applied by a sprung trap.
pub const TRAP_STUN: Duration = Duration::from_secs(2);

/// Length of the slow applied by a sprung trap.
pub const TRAP_SLOW: Duration = Duration::from_secs(5);

/// Speed multiplier while slowed.
pub const SLOW_FACTOR: f32 = 0.5;

/// Lifetime of an untriggered trap.
pub const TRAP_LIFETIME: Duration = Duration::from_secs(30);

/// Stun and slow windows carried by every grounded agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HazardStatus {
    stun: Timer,
    slow: Timer,
}

impl HazardStatus {
    /// Reports whether the agent is stunned and must not move.
    #[must_use]
    pub fn is_stunned(&self, now: Duration) -> bool {
        self.stun.is_active(now)
    }

    /// Reports whether the agent moves at reduced speed.
    #[must_use]
    pub fn is_slowed(&self, now: Duration) -> bool {
        self.slow.is_active(now)
    }

    /// Movement multiplier: zero while stunned, [`SLOW_FACTOR`] while slowed.
    #[must_use]
    pub fn speed_factor(&self, now: Duration) -> f32 {
        if self.is_stunned(now) {
            0.0
        } else if self.is_slowed(now) {
            SLOW_FACTOR
        } else {
            1.0
        }
    }

    /// Whether the agent is barred from entering an escalated state.
    #[must_use]
    pub fn escalation_locked(&self, now: Duration) -> bool {
        self.is_stunned(now)
    }

    /// Arms the trap stun and slow starting at `now`.
    pub fn apply_trap(&mut self, now: Duration) {
        self.stun = Timer::start(now, TRAP_STUN);
        self.slow = Timer::start(now, TRAP_SLOW);
    }
}

/// Agent that walks on the floor and can therefore spring traps.
pub trait Grounded {
    /// Identifier reported in trap events.
    fn agent_id(&self) -> AgentId;

    /// Tile currently occupied.
    fn cell(&self) -> CellCoord;

    /// Hazard windows carried by the agent.
    fn hazard_status(&self) -> &HazardStatus;

    /// Mutable hazard windows carried by the agent.
    fn hazard_status_mut(&mut self) -> &mut HazardStatus;

    /// Forces escalated behaviour back to the archetype's base state.
    fn reset_to_base(&mut self, now: Duration, out_events: &mut Vec<Event>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Trap {
    cell: CellCoord,
    lifetime: Timer,
    triggered: bool,
}

/// Ledger of placed traps.
#[derive(Clone, Debug, Default)]
pub struct HazardState {
    traps: Vec<Trap>,
}

impl HazardState {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a trap, reporting the outcome as an event.
    pub fn place_trap(
        &mut self,
        grid: &Grid,
        cell: CellCoord,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let rejection = if !grid.contains(cell) {
            Some(TrapRejection::OutOfBounds)
        } else if !grid.is_passable(cell, Passability::Agent) {
            Some(TrapRejection::Impassable)
        } else if self.armed_trap_at(cell, now).is_some() {
            Some(TrapRejection::AlreadyTrapped)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(?cell, ?reason, "trap rejected");
            out_events.push(Event::TrapRejected { cell, reason });
            return;
        }

        self.traps.push(Trap {
            cell,
            lifetime: Timer::start(now, TRAP_LIFETIME),
            triggered: false,
        });
        out_events.push(Event::TrapPlaced { cell });
    }

    /// Drops traps whose lifetime ended, announcing untriggered ones.
    pub fn expire(&mut self, now: Duration, out_events: &mut Vec<Event>) {
        self.traps.retain(|trap| {
            if trap.lifetime.is_active(now) {
                return true;
            }
            if !trap.triggered {
                out_events.push(Event::TrapExpired { cell: trap.cell });
            }
            false
        });
    }

    /// Springs armed traps under grounded agents.
    ///
    /// Agents are visited in the order provided; each trap catches at most one
    /// agent. An agent already inside a stun window consumes the trap without
    /// being stunned again.
    pub fn resolve_contacts<'a, A, I>(
        &mut self,
        agents: I,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) where
        A: Grounded + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut A>,
    {
        for agent in agents {
            let cell = agent.cell();
            let Some(index) = self.armed_trap_at(cell, now) else {
                continue;
            };
            self.traps[index].triggered = true;

            let stunned = !agent.hazard_status().is_stunned(now);
            if stunned {
                agent.hazard_status_mut().apply_trap(now);
                agent.reset_to_base(now, out_events);
            }
            out_events.push(Event::TrapTriggered {
                cell,
                agent: agent.agent_id(),
                stunned,
            });
        }
    }

    /// Snapshots of every trap still on the floor, in placement order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<TrapSnapshot> {
        self.traps
            .iter()
            .map(|trap| TrapSnapshot {
                cell: trap.cell,
                placed_at: trap.lifetime.armed_at(),
                expires_at: trap.lifetime.fires_at(),
                triggered: trap.triggered,
            })
            .collect()
    }

    fn armed_trap_at(&self, cell: CellCoord, now: Duration) -> Option<usize> {
        self.traps
            .iter()
            .position(|trap| trap.cell == cell && !trap.triggered && trap.lifetime.is_active(now))
    }
}
