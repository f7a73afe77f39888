//! Continuous-position integrator shared by every agent.

use std::time::Duration;

use glam::Vec2;
use maze_escape_core::CellCoord;

/// Length of the ramp from standstill back to full speed after a freeze.
pub const THAW_WINDOW: Duration = Duration::from_millis(1_500);

/// Speed multiplier during the thaw that follows a freeze ending at
/// `freeze_until`. Zero while frozen, ramping linearly to one.
#[must_use]
pub fn thaw_factor(now: Duration, freeze_until: Duration) -> f32 {
    if now < freeze_until {
        return 0.0;
    }
    let since = now - freeze_until;
    (since.as_secs_f32() / THAW_WINDOW.as_secs_f32()).clamp(0.0, 1.0)
}

/// Multipliers applied on top of an agent's base speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedModifiers {
    /// Global thaw ramp in `0.0..=1.0`.
    pub thaw: f32,
    /// Hazard slow factor; one when the agent is not slowed.
    pub slow: f32,
    /// Difficulty multiplier.
    pub difficulty: f32,
}

impl SpeedModifiers {
    /// Product of every multiplier.
    #[must_use]
    pub fn factor(&self) -> f32 {
        self.thaw * self.slow * self.difficulty
    }
}

impl Default for SpeedModifiers {
    fn default() -> Self {
        Self {
            thaw: 1.0,
            slow: 1.0,
            difficulty: 1.0,
        }
    }
}

/// Result of advancing a [`Motion`] by one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Advance {
    /// Discrete tile change caused by the step, as `(from, to)`.
    pub crossed: Option<(CellCoord, CellCoord)>,
    /// Whether the target was reached and cleared during the step.
    pub arrived: bool,
}

/// Continuous position gliding toward a discrete target tile.
///
/// The discrete tile always follows the rounded continuous position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    position: Vec2,
    cell: CellCoord,
    target: Option<CellCoord>,
}

impl Motion {
    /// Places a motion at rest on the centre of `cell`.
    #[must_use]
    pub fn at(cell: CellCoord) -> Self {
        Self {
            position: cell.center(),
            cell,
            target: None,
        }
    }

    /// Continuous position in tile units.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Discrete tile currently occupied.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Tile being approached, if any.
    #[must_use]
    pub fn target(&self) -> Option<CellCoord> {
        self.target
    }

    /// Replaces the current target.
    pub fn set_target(&mut self, target: Option<CellCoord>) {
        self.target = target;
    }

    /// Moves instantly onto `cell`, dropping any target.
    pub fn teleport(&mut self, cell: CellCoord) {
        self.position = cell.center();
        self.cell = cell;
        self.target = None;
    }

    /// Advances toward the target by `speed × dt` tile units.
    ///
    /// The motion arrives when the remaining distance does not exceed this
    /// tick's step; it then snaps onto the target tile.
    pub fn advance(&mut self, speed: f32, dt: Duration) -> Advance {
        let Some(target) = self.target else {
            return Advance::default();
        };

        let step = (speed * dt.as_secs_f32()).max(0.0);
        let goal = target.center();
        let offset = goal - self.position;
        let remaining = offset.length();

        let mut arrived = false;
        if remaining <= step {
            self.position = goal;
            self.target = None;
            arrived = true;
        } else if step > 0.0 {
            self.position += offset / remaining * step;
        }

        let previous = self.cell;
        self.cell = rounded_cell(self.position);
        let crossed = (previous != self.cell).then_some((previous, self.cell));
        Advance { crossed, arrived }
    }
}

fn rounded_cell(position: Vec2) -> CellCoord {
    let rounded = position.round().max(Vec2::ZERO);
    CellCoord::new(rounded.x as u32, rounded.y as u32)
}
