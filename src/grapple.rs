//! Grapple tether and swing.
//!
//! The tether is a rigid distance constraint: while engaged the physics
//! backend holds the character at exactly the tether length from the anchor,
//! so the character swings like a pendulum. The controller only decides when
//! to engage/release, how long the tether is, and which forces to add.

use bevy::prelude::*;

use crate::config::{CharacterConfig, MIN_TETHER_LENGTH};
use crate::intent::{Reel, TickInput};

/// Multiplier applied to `swing_force` for lateral swing thrust.
pub const SWING_FORCE_SCALE: f32 = 10.0;

/// An engaged tether.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct Tether {
    /// World point the tether is fixed to.
    pub anchor: Vec2,
    /// Current tether length, within [`MIN_TETHER_LENGTH`, `grapple_range`].
    pub distance: f32,
}

/// Command for the physics backend's distance constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TetherCommand {
    /// Create the constraint.
    Engage { anchor: Vec2, distance: f32 },
    /// Change the constraint length.
    SetDistance(f32),
    /// Remove the constraint.
    Release,
}

/// Command for the rope renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RopeCommand {
    /// Show the rope between two points.
    Show { start: Vec2, end: Vec2 },
    /// Hide the rope.
    Hide,
}

/// Rope line for the host to draw.
///
/// Updated by the controller systems every tick; the crate draws nothing itself.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct RopeVisual {
    pub visible: bool,
    pub start: Vec2,
    pub end: Vec2,
}

impl RopeVisual {
    /// Apply a rope command.
    pub fn apply(&mut self, command: RopeCommand) {
        match command {
            RopeCommand::Show { start, end } => {
                self.visible = true;
                self.start = start;
                self.end = end;
            }
            RopeCommand::Hide => self.visible = false,
        }
    }
}

/// Everything a grapple update asks of the collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrappleOutput {
    pub tether: Option<TetherCommand>,
    pub rope: Option<RopeCommand>,
    /// Continuous force to add this tick.
    pub force: Vec2,
}

/// New tether length after reeling for `dt`, clamped to the valid range.
pub fn reel_distance(distance: f32, reel: Reel, speed: f32, dt: f32, range: f32) -> f32 {
    let next = match reel {
        Reel::None => distance,
        Reel::In => distance - speed * dt,
        Reel::Out => distance + speed * dt,
    };
    next.clamp(MIN_TETHER_LENGTH, range)
}

/// Constant lateral swing force for a horizontal input.
pub fn swing_force(input_x: f32, swing_force: f32) -> Vec2 {
    if input_x == 0.0 {
        Vec2::ZERO
    } else {
        Vec2::new(input_x.signum() * swing_force * SWING_FORCE_SCALE, 0.0)
    }
}

/// Advance the grapple by one tick.
///
/// `hit` is the grapple probe result for this tick (only present on a press).
pub fn update_grapple(
    tether: &mut Option<Tether>,
    input: &TickInput,
    hit: Option<Vec2>,
    position: Vec2,
    config: &CharacterConfig,
    dt: f32,
) -> GrappleOutput {
    let mut output = GrappleOutput::default();
    let mut engaged_now = false;

    match (*tether, hit) {
        (None, Some(anchor)) if input.grapple_pressed => {
            let distance = position
                .distance(anchor)
                .clamp(MIN_TETHER_LENGTH, config.grapple_range);
            *tether = Some(Tether { anchor, distance });
            engaged_now = true;
            debug!("grapple engaged at {anchor} with length {distance}");
        }
        (None, None) if input.grapple_pressed => {
            debug!("grapple missed");
        }
        (Some(_), _) if input.grapple_released => {
            *tether = None;
            output.tether = Some(TetherCommand::Release);
            output.rope = Some(RopeCommand::Hide);
            debug!("grapple released");
            return output;
        }
        _ => {}
    }

    let Some(current) = tether.as_mut() else {
        return output;
    };

    output.force += swing_force(input.axis.x, config.swing_force);

    let reeled = reel_distance(
        current.distance,
        input.reel,
        config.reel_speed,
        dt,
        config.grapple_range,
    );
    let toward_anchor = (current.anchor - position).normalize_or_zero();
    match input.reel {
        Reel::In => output.force += toward_anchor * config.reel_force,
        Reel::Out => output.force -= toward_anchor * config.reel_force,
        Reel::None => {}
    }
    let length_changed = reeled != current.distance;
    current.distance = reeled;

    output.tether = if engaged_now {
        Some(TetherCommand::Engage {
            anchor: current.anchor,
            distance: current.distance,
        })
    } else if length_changed {
        Some(TetherCommand::SetDistance(current.distance))
    } else {
        None
    };
    output.rope = Some(RopeCommand::Show {
        start: position,
        end: current.anchor,
    });

    output
}
