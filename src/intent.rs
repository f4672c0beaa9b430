//! Control intent components.
//!
//! Intents represent what the player (or any other driver) wants the character
//! to do. The host writes held-button states and axes; the controller derives
//! press/release edges itself, once per tick.

use bevy::prelude::*;

/// Desired control state for a character.
///
/// Set held states every frame from your input source; the controller turns
/// them into press/release edges when it samples the intent.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_controller::prelude::*;
///
/// let mut intent = ControlIntent::new();
/// intent.set_axis(Vec2::new(1.0, 0.0));
/// intent.set_jump(true);
///
/// let input = intent.sample();
/// assert!(input.jump_pressed);
///
/// // Still held on the next tick: no new edge.
/// let input = intent.sample();
/// assert!(input.jump_held);
/// assert!(!input.jump_pressed);
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct ControlIntent {
    /// Movement axes, each in [-1, 1]. `x` drives walking and swinging, both
    /// axes drive the dash direction.
    pub axis: Vec2,
    /// Grapple aim direction in world space (unit vector).
    pub aim: Vec2,
    /// Jump button held.
    pub jump: bool,
    /// Dash button held.
    pub dash: bool,
    /// Grapple button held.
    pub grapple: bool,
    /// Reel-in button held.
    pub reel_in: bool,
    /// Reel-out button held.
    pub reel_out: bool,

    // Previous tick's held states, for edge detection.
    pub(crate) jump_prev: bool,
    pub(crate) dash_prev: bool,
    pub(crate) grapple_prev: bool,
}

impl Default for ControlIntent {
    fn default() -> Self {
        Self {
            axis: Vec2::ZERO,
            aim: Vec2::X,
            jump: false,
            dash: false,
            grapple: false,
            reel_in: false,
            reel_out: false,
            jump_prev: false,
            dash_prev: false,
            grapple_prev: false,
        }
    }
}

impl ControlIntent {
    /// Create a new empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axes, each clamped to [-1, 1].
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set the grapple aim direction. Zero-length directions are ignored.
    pub fn set_aim(&mut self, direction: Vec2) {
        let normalized = direction.normalize_or_zero();
        if normalized != Vec2::ZERO {
            self.aim = normalized;
        }
    }

    /// Set whether the jump button is held.
    pub fn set_jump(&mut self, held: bool) {
        self.jump = held;
    }

    /// Set whether the dash button is held.
    pub fn set_dash(&mut self, held: bool) {
        self.dash = held;
    }

    /// Set whether the grapple button is held.
    pub fn set_grapple(&mut self, held: bool) {
        self.grapple = held;
    }

    /// Set the reel buttons.
    pub fn set_reel(&mut self, reel_in: bool, reel_out: bool) {
        self.reel_in = reel_in;
        self.reel_out = reel_out;
    }

    /// Release every button and zero the axes.
    pub fn clear(&mut self) {
        self.axis = Vec2::ZERO;
        self.jump = false;
        self.dash = false;
        self.grapple = false;
        self.reel_in = false;
        self.reel_out = false;
    }

    /// Whether the grapple button went down since the last sample.
    pub fn grapple_just_pressed(&self) -> bool {
        self.grapple && !self.grapple_prev
    }

    /// Snapshot this tick's input and advance edge detection.
    pub fn sample(&mut self) -> TickInput {
        let input = self.peek();
        self.jump_prev = self.jump;
        self.dash_prev = self.dash;
        self.grapple_prev = self.grapple;
        input
    }

    /// Snapshot this tick's input without advancing edge detection.
    pub fn peek(&self) -> TickInput {
        TickInput {
            axis: self.axis,
            aim: self.aim,
            jump_held: self.jump,
            jump_pressed: self.jump && !self.jump_prev,
            dash_pressed: self.dash && !self.dash_prev,
            grapple_pressed: self.grapple && !self.grapple_prev,
            grapple_released: !self.grapple && self.grapple_prev,
            reel: Reel::from_buttons(self.reel_in, self.reel_out),
        }
    }
}

/// Direction the grapple tether is being reeled.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reel {
    #[default]
    None,
    /// Shorten the tether.
    In,
    /// Lengthen the tether.
    Out,
}

impl Reel {
    /// Both buttons held cancel out.
    pub fn from_buttons(reel_in: bool, reel_out: bool) -> Self {
        match (reel_in, reel_out) {
            (true, false) => Self::In,
            (false, true) => Self::Out,
            _ => Self::None,
        }
    }
}

/// Input for a single controller tick, with edges already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInput {
    /// Movement axes in [-1, 1].
    pub axis: Vec2,
    /// Grapple aim direction (unit vector).
    pub aim: Vec2,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub dash_pressed: bool,
    pub grapple_pressed: bool,
    pub grapple_released: bool,
    pub reel: Reel,
}

impl TickInput {
    /// Input with only a horizontal axis set.
    pub fn walking(x: f32) -> Self {
        Self {
            axis: Vec2::new(x, 0.0),
            aim: Vec2::X,
            ..default()
        }
    }
}
