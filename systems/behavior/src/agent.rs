//! Agent aggregate: a [`Body`] paired with an archetype [`Brain`].

use std::time::Duration;

use maze_escape_core::{AgentId, AgentKind, AgentSnapshot, BehaviorTag, CellCoord, Event};
use maze_escape_system_hazard::{Grounded, HazardStatus};
use maze_escape_system_movement::SpeedModifiers;
use maze_escape_world::MazeState;
use tracing::trace;

use crate::{
    body::Body, bombardier::BombardierBrain, enforcer::EnforcerBrain, pursuer::PursuerBrain,
    stalker::StalkerBrain, Effect, TickContext,
};

/// Archetype-specific decision state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Brain {
    /// Relentless chaser.
    Pursuer(PursuerBrain),
    /// Line-of-sight hunter.
    Stalker(StalkerBrain),
    /// Territorial punisher.
    Enforcer(EnforcerBrain),
    /// Ranged blaster.
    Bombardier(BombardierBrain),
}

impl Brain {
    fn for_kind(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Pursuer => Self::Pursuer(PursuerBrain::new()),
            AgentKind::Stalker => Self::Stalker(StalkerBrain::new()),
            AgentKind::Enforcer => Self::Enforcer(EnforcerBrain::new()),
            AgentKind::Bombardier => Self::Bombardier(BombardierBrain::new()),
        }
    }

    fn tag(&self) -> BehaviorTag {
        match self {
            Self::Pursuer(brain) => brain.tag(),
            Self::Stalker(brain) => brain.tag(),
            Self::Enforcer(brain) => brain.tag(),
            Self::Bombardier(brain) => brain.tag(),
        }
    }

    fn telegraph_until(&self) -> Option<Duration> {
        match self {
            Self::Pursuer(brain) => brain.telegraph_until(),
            Self::Bombardier(brain) => brain.telegraph_until(),
            Self::Stalker(_) | Self::Enforcer(_) => None,
        }
    }

    fn allows_motion(&self) -> bool {
        match self {
            Self::Pursuer(brain) => brain.allows_motion(),
            Self::Bombardier(brain) => brain.allows_motion(),
            Self::Stalker(_) | Self::Enforcer(_) => true,
        }
    }

    fn speed(&self, maze: &MazeState) -> f32 {
        match self {
            Self::Pursuer(brain) => brain.speed(maze),
            Self::Stalker(brain) => brain.speed(),
            Self::Enforcer(brain) => brain.speed(),
            Self::Bombardier(brain) => brain.speed(),
        }
    }

    fn reset_to_base(&mut self) {
        match self {
            Self::Pursuer(brain) => brain.reset_to_base(),
            Self::Stalker(brain) => brain.reset_to_base(),
            Self::Enforcer(brain) => brain.reset_to_base(),
            Self::Bombardier(brain) => brain.reset_to_base(),
        }
    }
}

/// Autonomous adversary roaming the maze.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub(crate) body: Body,
    brain: Brain,
}

impl Agent {
    pub(crate) fn new(id: AgentId, kind: AgentKind, cell: CellCoord, maze: &MazeState) -> Self {
        Self {
            body: Body::new(id, kind, cell, maze),
            brain: Brain::for_kind(kind),
        }
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.body.id()
    }

    /// Archetype.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.body.kind()
    }

    /// Shared physical state.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Public behavioural state.
    #[must_use]
    pub fn state(&self) -> BehaviorTag {
        self.brain.tag()
    }

    /// Captures the agent's public state.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.body.id(),
            kind: self.body.kind(),
            position: self.body.position(),
            cell: self.body.cell(),
            target: self.body.target(),
            state: self.brain.tag(),
            telegraph_until: self.brain.telegraph_until(),
        }
    }

    /// Runs one tick: contact detection, archetype decisions, movement and
    /// the stall rule.
    pub(crate) fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        effects: &mut Vec<Effect>,
        out_events: &mut Vec<Event>,
    ) {
        let now = ctx.now;
        if ctx.frozen {
            self.body.motion.set_target(None);
            let _ = self.body.resolve_stall(false, now, ctx.maze, ctx.rng);
            return;
        }

        let before = self.brain.tag();
        let touching = self.body.cell() == ctx.player;
        let contact_began = touching && !self.body.in_contact;
        self.body.in_contact = touching;

        let body = &mut self.body;
        match &mut self.brain {
            Brain::Pursuer(brain) => brain.update(body, ctx, contact_began, out_events),
            Brain::Stalker(brain) => brain.update(body, ctx, contact_began, out_events),
            Brain::Enforcer(brain) => brain.update(body, ctx, contact_began, out_events),
            Brain::Bombardier(brain) => {
                brain.update(body, ctx, touching, effects, out_events);
            }
        }

        let free_to_move = self.body.is_free(now) && self.brain.allows_motion() && ctx.thaw > 0.0;
        if free_to_move {
            let modifiers = SpeedModifiers {
                thaw: ctx.thaw,
                slow: self.body.hazard.speed_factor(now),
                difficulty: ctx.difficulty.speed_multiplier(),
            };
            let speed = self.brain.speed(ctx.maze) * modifiers.factor();
            let _ = self.body.advance(speed, ctx.dt, out_events);
        }
        let _ = self.body.resolve_stall(free_to_move, now, ctx.maze, ctx.rng);

        self.report_transition(before, out_events);
    }

    fn report_transition(&self, before: BehaviorTag, out_events: &mut Vec<Event>) {
        let after = self.brain.tag();
        if before != after {
            trace!(agent = ?self.body.id(), ?before, ?after, "behavior changed");
            out_events.push(Event::BehaviorChanged {
                agent: self.body.id(),
                from: before,
                to: after,
            });
        }
    }
}

impl Grounded for Agent {
    fn agent_id(&self) -> AgentId {
        self.body.id()
    }

    fn cell(&self) -> CellCoord {
        self.body.cell()
    }

    fn hazard_status(&self) -> &HazardStatus {
        &self.body.hazard
    }

    fn hazard_status_mut(&mut self) -> &mut HazardStatus {
        &mut self.body.hazard
    }

    fn reset_to_base(&mut self, _now: Duration, out_events: &mut Vec<Event>) {
        let before = self.brain.tag();
        self.brain.reset_to_base();
        if before != self.brain.tag() {
            self.body.aim_at(None);
            self.body.force_replan();
        }
        self.report_transition(before, out_events);
    }
}
