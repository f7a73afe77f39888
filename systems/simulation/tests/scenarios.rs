use std::time::Duration;

use maze_escape_core::{AgentKind, BehaviorTag, CellCoord, Command, Event, TrapRejection};
use maze_escape_system_simulation::{apply, query, LevelConfig, RosterConfig, Simulation};

const DT: Duration = Duration::from_millis(20);

fn level(roster: RosterConfig) -> Simulation {
    Simulation::new(&LevelConfig {
        seed: 1,
        generators: 3,
        telepads: false,
        roster,
        ..LevelConfig::default()
    })
    .expect("level is valid")
}

fn only(kind: AgentKind) -> RosterConfig {
    let mut roster = RosterConfig::empty();
    match kind {
        AgentKind::Pursuer => roster.pursuers = 1,
        AgentKind::Stalker => roster.stalkers = 1,
        AgentKind::Enforcer => roster.enforcers = 1,
        AgentKind::Bombardier => roster.bombardiers = 1,
    }
    roster
}

fn tick(simulation: &mut Simulation) -> Vec<Event> {
    let mut events = Vec::new();
    apply(simulation, Command::Tick { dt: DT }, &mut events);
    events
}

#[test]
fn pursuer_closes_in_on_an_idle_player() {
    let mut simulation = level(only(AgentKind::Pursuer));
    let field = query::player_field(&simulation).clone();
    let distance = |cell: CellCoord| field.reachable_distance(cell).expect("reachable");

    let start = query::agent_view(&simulation).into_vec()[0];
    assert_eq!(start.state, BehaviorTag::Chase);
    assert!(start.cell.column() >= 20 && start.cell.row() >= 20);

    let mut previous_distance = distance(start.cell);
    let mut previous_target = start.target;
    let initial_distance = previous_distance;

    while query::now(&simulation) < Duration::from_secs(5) {
        let _ = tick(&mut simulation);
        let snapshot = query::agent_view(&simulation).into_vec()[0];
        let current = distance(snapshot.cell);
        assert!(current <= previous_distance, "pursuer backed off");

        if current > 0 && snapshot.target != previous_target {
            if let Some(target) = snapshot.target {
                assert!(
                    distance(target) < current,
                    "recomputed target {target:?} is not closer than {:?}",
                    snapshot.cell
                );
            }
        }
        previous_distance = current;
        previous_target = snapshot.target;
    }

    assert!(
        previous_distance + 8 <= initial_distance,
        "pursuer only advanced from {initial_distance} to {previous_distance}"
    );
}

#[test]
fn freeze_stops_every_agent_until_it_thaws() {
    let mut simulation = level(RosterConfig::default());
    let mut events = Vec::new();
    apply(
        &mut simulation,
        Command::Freeze {
            duration: Duration::from_secs(2),
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::FreezeStarted {
            until: Duration::from_secs(2)
        }]
    );

    let before = query::agent_view(&simulation).into_vec();
    while query::now(&simulation) < Duration::from_millis(1_900) {
        let events = tick(&mut simulation);
        assert!(events
            .iter()
            .all(|event| !matches!(event, Event::AgentMoved { .. })));
    }
    let during = query::agent_view(&simulation).into_vec();
    for (frozen, original) in during.iter().zip(&before) {
        assert_eq!(frozen.position, original.position);
        assert_eq!(frozen.target, None);
    }

    while query::now(&simulation) < Duration::from_secs(5) {
        let _ = tick(&mut simulation);
    }
    let after = query::agent_view(&simulation).into_vec();
    assert!(after
        .iter()
        .zip(&before)
        .any(|(thawed, original)| thawed.position != original.position));
}

#[test]
fn god_mode_suppresses_player_harm_but_not_reactions() {
    let mut simulation = level(only(AgentKind::Enforcer));
    let enforcer = query::agent_view(&simulation).into_vec()[0];
    let mut events = Vec::new();
    apply(&mut simulation, Command::SetGodMode { enabled: true }, &mut events);
    apply(
        &mut simulation,
        Command::MovePlayer { cell: enforcer.cell },
        &mut events,
    );

    let events = tick(&mut simulation);
    assert!(events.iter().all(|event| !matches!(
        event,
        Event::AgentTouchedPlayer { .. } | Event::PlayerPunished { .. } | Event::PlayerHit { .. }
    )));
    assert!(events.contains(&Event::BehaviorChanged {
        agent: enforcer.id,
        from: BehaviorTag::Roam,
        to: BehaviorTag::Flee,
    }));
}

#[test]
fn enforcer_contact_is_reported_without_god_mode() {
    let mut simulation = level(only(AgentKind::Enforcer));
    let enforcer = query::agent_view(&simulation).into_vec()[0];
    let mut events = Vec::new();
    apply(
        &mut simulation,
        Command::MovePlayer { cell: enforcer.cell },
        &mut events,
    );

    let events = tick(&mut simulation);
    assert!(events.contains(&Event::AgentTouchedPlayer {
        agent: enforcer.id,
        kind: AgentKind::Enforcer,
    }));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::PlayerPunished { agent, .. } if *agent == enforcer.id)));
}

#[test]
fn noise_sends_a_roaming_stalker_to_investigate() {
    let mut simulation = level(only(AgentKind::Stalker));
    let stalker = query::agent_view(&simulation).into_vec()[0];
    let noise = query::maze(&simulation).spawn();

    let mut events = Vec::new();
    apply(&mut simulation, Command::RaiseNoise { cell: noise }, &mut events);
    assert_eq!(events, vec![Event::NoiseRaised { cell: noise }]);

    let events = tick(&mut simulation);
    assert!(events.contains(&Event::BehaviorChanged {
        agent: stalker.id,
        from: BehaviorTag::Roam,
        to: BehaviorTag::Alert,
    }));
}

#[test]
fn traps_are_rejected_on_walls_and_duplicates() {
    let mut simulation = level(RosterConfig::empty());
    let spawn = query::maze(&simulation).spawn();
    let mut events = Vec::new();

    apply(
        &mut simulation,
        Command::PlaceTrap {
            cell: CellCoord::new(0, 0),
        },
        &mut events,
    );
    apply(&mut simulation, Command::PlaceTrap { cell: spawn }, &mut events);
    apply(&mut simulation, Command::PlaceTrap { cell: spawn }, &mut events);
    apply(
        &mut simulation,
        Command::PlaceTrap {
            cell: CellCoord::new(400, 2),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![
            Event::TrapRejected {
                cell: CellCoord::new(0, 0),
                reason: TrapRejection::Impassable,
            },
            Event::TrapPlaced { cell: spawn },
            Event::TrapRejected {
                cell: spawn,
                reason: TrapRejection::AlreadyTrapped,
            },
            Event::TrapRejected {
                cell: CellCoord::new(400, 2),
                reason: TrapRejection::OutOfBounds,
            },
        ]
    );
    assert_eq!(query::traps(&simulation).len(), 1);
}

#[test]
fn untriggered_traps_expire() {
    let mut simulation = level(RosterConfig::empty());
    let spawn = query::maze(&simulation).spawn();
    let mut events = Vec::new();
    apply(&mut simulation, Command::PlaceTrap { cell: spawn }, &mut events);

    let mut expired = false;
    for _ in 0..31 {
        let mut events = Vec::new();
        apply(
            &mut simulation,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        expired |= events.contains(&Event::TrapExpired { cell: spawn });
    }
    assert!(expired);
    assert!(query::traps(&simulation).is_empty());
}
