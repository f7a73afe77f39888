//! Final-state report rendered as text or JSON.

use std::{collections::BTreeMap, fmt::Write as _};

use maze_escape_core::{AgentKind, AgentSnapshot, CellCoord, Event, TrapSnapshot};
use maze_escape_system_simulation::{query, Simulation};
use maze_escape_world::query::MazeSnapshot;
use serde::Serialize;

/// Number of events observed per event name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub(crate) struct EventTally {
    counts: BTreeMap<&'static str, usize>,
}

impl EventTally {
    /// Counts every event drained from a queue.
    pub(crate) fn record_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            *self.counts.entry(event_name(&event)).or_insert(0) += 1;
        }
    }

    /// Total number of events recorded.
    pub(crate) fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Snapshot of a finished run.
#[derive(Debug, Serialize)]
pub(crate) struct Report {
    elapsed_seconds: f64,
    maze: MazeSnapshot,
    player: CellCoord,
    agents: Vec<AgentSnapshot>,
    traps: Vec<TrapSnapshot>,
    events: EventTally,
}

impl Report {
    /// Captures the current state of the simulation.
    pub(crate) fn capture(simulation: &Simulation, events: EventTally) -> Self {
        Self {
            elapsed_seconds: query::now(simulation).as_secs_f64(),
            maze: query::maze_snapshot(simulation),
            player: query::player(simulation),
            agents: query::agent_view(simulation).into_vec(),
            traps: query::traps(simulation),
            events,
        }
    }

    /// Draws the maze with traps, the player and agents overlaid, followed by
    /// the roster and event counts.
    pub(crate) fn render_ascii(&self) -> String {
        let mut canvas: Vec<Vec<char>> = self
            .maze
            .rows
            .iter()
            .map(|row| row.chars().collect())
            .collect();
        for trap in &self.traps {
            plot(&mut canvas, trap.cell, '^');
        }
        plot(&mut canvas, self.player, '@');
        for agent in &self.agents {
            plot(&mut canvas, agent.cell, agent_glyph(agent.kind));
        }

        let mut out = String::new();
        for row in canvas {
            out.extend(row);
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "\nseed {} after {:.2}s, player at ({}, {})",
            self.maze.seed,
            self.elapsed_seconds,
            self.player.column(),
            self.player.row()
        );
        for agent in &self.agents {
            let _ = writeln!(
                out,
                "  {} #{:<2} {:<10} ({:>2}, {:>2}) {:?}",
                agent_glyph(agent.kind),
                agent.id.get(),
                agent.kind.label(),
                agent.cell.column(),
                agent.cell.row(),
                agent.state
            );
        }
        if !self.events.counts.is_empty() {
            let _ = writeln!(out, "events:");
            for (name, count) in &self.events.counts {
                let _ = writeln!(out, "  {name:<20} {count}");
            }
        }
        out
    }
}

fn plot(canvas: &mut [Vec<char>], cell: CellCoord, glyph: char) {
    if let Some(slot) = canvas
        .get_mut(cell.row() as usize)
        .and_then(|row| row.get_mut(cell.column() as usize))
    {
        *slot = glyph;
    }
}

fn agent_glyph(kind: AgentKind) -> char {
    match kind {
        AgentKind::Pursuer => 'p',
        AgentKind::Stalker => 's',
        AgentKind::Enforcer => 'e',
        AgentKind::Bombardier => 'b',
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::TimeAdvanced { .. } => "time_advanced",
        Event::AgentMoved { .. } => "agent_moved",
        Event::BehaviorChanged { .. } => "behavior_changed",
        Event::LeapTelegraphed { .. } => "leap_telegraphed",
        Event::AgentLeaped { .. } => "agent_leaped",
        Event::AgentTouchedPlayer { .. } => "agent_touched_player",
        Event::PlayerPunished { .. } => "player_punished",
        Event::PlayerHit { .. } => "player_hit",
        Event::BlastTelegraphed { .. } => "blast_telegraphed",
        Event::BlastResolved { .. } => "blast_resolved",
        Event::AgentTackled { .. } => "agent_tackled",
        Event::TelepadUsed { .. } => "telepad_used",
        Event::TrapPlaced { .. } => "trap_placed",
        Event::TrapRejected { .. } => "trap_rejected",
        Event::TrapTriggered { .. } => "trap_triggered",
        Event::TrapExpired { .. } => "trap_expired",
        Event::NoiseRaised { .. } => "noise_raised",
        Event::FreezeStarted { .. } => "freeze_started",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use maze_escape_system_simulation::{LevelConfig, RosterConfig};

    use super::*;

    fn quiet_report() -> Report {
        let simulation = Simulation::new(&LevelConfig {
            roster: RosterConfig::empty(),
            ..LevelConfig::default()
        })
        .expect("default level is valid");
        Report::capture(&simulation, EventTally::default())
    }

    #[test]
    fn tally_counts_by_event_name() {
        let mut tally = EventTally::default();
        tally.record_all([
            Event::TimeAdvanced {
                dt: Duration::from_millis(50),
            },
            Event::TimeAdvanced {
                dt: Duration::from_millis(50),
            },
            Event::NoiseRaised {
                cell: CellCoord::new(1, 1),
            },
        ]);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.counts.get("time_advanced"), Some(&2));
        assert_eq!(tally.counts.get("noise_raised"), Some(&1));
    }

    #[test]
    fn ascii_marks_the_player_at_spawn() {
        let report = quiet_report();
        let drawing = report.render_ascii();
        let second_row = drawing.lines().nth(1).expect("maze has rows");
        assert_eq!(second_row.chars().nth(1), Some('@'));
        assert!(drawing.contains("seed 1 after 0.00s"));
    }

    #[test]
    fn json_report_carries_the_maze() {
        let report = quiet_report();
        let value = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(value["maze"]["columns"], 30);
        assert_eq!(value["agents"], serde_json::json!([]));
        assert_eq!(value["events"], serde_json::json!({}));
    }
}
