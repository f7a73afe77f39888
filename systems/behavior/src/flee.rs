//! Retreat steering shared by fleeing archetypes, including telepad escapes.

use std::time::Duration;

use maze_escape_core::{CellCoord, Event};
use maze_escape_system_movement::{ascent_step, find_path};
use maze_escape_world::Passability;

use crate::{body::Body, TickContext};

/// Cooldown armed on both pads of a pair whenever an agent teleports.
pub const TELEPAD_COOLDOWN: Duration = Duration::from_secs(4);

/// How much farther from the player the far pad must be before an agent
/// bothers to route through a telepad.
const TELEPAD_ESCAPE_GAIN: u32 = 4;

/// Picks the next tile for a fleeing agent.
///
/// An agent standing on a worthwhile pad teleports immediately and gets no
/// target this cycle. Otherwise it heads for the nearest worthwhile pad it can
/// reach before the player, and failing that climbs the player's distance
/// field.
pub(crate) fn flee_step(
    body: &mut Body,
    ctx: &mut TickContext<'_>,
    out_events: &mut Vec<Event>,
) -> Option<CellCoord> {
    let cell = body.cell();
    let own_distance = ctx.player_field.reachable_distance(cell).unwrap_or(0);

    if let Some(index) = ctx.maze.telepad_at(cell) {
        if escape_is_worthwhile(ctx, index, own_distance) {
            if let Some(destination) = ctx.maze.teleport(index, ctx.now, TELEPAD_COOLDOWN) {
                body.teleport(destination, ctx.now);
                out_events.push(Event::TelepadUsed {
                    agent: body.id(),
                    from: cell,
                    to: destination,
                });
                return None;
            }
        }
    }

    if let Some(next) = telepad_route(ctx, cell, own_distance) {
        return Some(next);
    }

    ascent_step(ctx.player_field, ctx.maze.grid(), cell, Passability::Agent)
}

fn escape_is_worthwhile(ctx: &TickContext<'_>, index: usize, own_distance: u32) -> bool {
    let Some(pad) = ctx.maze.telepads().get(index) else {
        return false;
    };
    let Some(partner) = ctx.maze.partner(index) else {
        return false;
    };
    if !pad.is_ready(ctx.now) || !partner.is_ready(ctx.now) {
        return false;
    }
    ctx.player_field
        .reachable_distance(partner.cell)
        .is_some_and(|distance| distance >= own_distance + TELEPAD_ESCAPE_GAIN)
}

fn telepad_route(ctx: &TickContext<'_>, cell: CellCoord, own_distance: u32) -> Option<CellCoord> {
    let mut best: Option<Vec<CellCoord>> = None;
    for (index, pad) in ctx.maze.telepads().iter().enumerate() {
        if pad.cell == cell || !escape_is_worthwhile(ctx, index, own_distance) {
            continue;
        }
        let Some(player_distance) = ctx.player_field.reachable_distance(pad.cell) else {
            continue;
        };
        let Some(route) = find_path(ctx.maze.grid(), cell, pad.cell, Passability::Agent) else {
            continue;
        };
        if route.len() as u32 >= player_distance {
            continue;
        }
        if best.as_ref().map_or(true, |current| route.len() < current.len()) {
            best = Some(route);
        }
    }
    best.and_then(|route| route.first().copied())
}
