//! Character configuration.
//!
//! This module defines the tuning values for a platformer character and the
//! kinematic constants derived from them (acceleration rates, gravity and jump
//! speed). Configurations are validated once, when the controller is created.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Errors raised when a [`CharacterConfig`] cannot drive a controller.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{field}` must be a positive duration, got {value}")]
    NonPositiveDuration { field: &'static str, value: f32 },

    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("`{field}` must be negative (a downward speed), got {value}")]
    NotDownward { field: &'static str, value: f32 },

    #[error("`wall_jump_direction` must be a unit vector, got {0}")]
    WallJumpDirectionNotUnit(Vec2),

    #[error("`grapple_range` must be at least the minimum tether length {min}, got {value}")]
    GrappleRangeTooShort { min: f32, value: f32 },

    #[error("failed to parse character config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Shortest tether the grapple can be reeled in to.
pub const MIN_TETHER_LENGTH: f32 = 1.0;

/// Tuning values for a platformer character.
///
/// Timings are in seconds, distances in world units. Use
/// [`CharacterConfig::motion_profile`] to obtain the derived constants; it
/// rejects values that would divide by zero.
///
/// # Example
///
/// ```rust
/// use platformer_controller::prelude::*;
///
/// let config = CharacterConfig::default().with_jump_apex(3.0, 0.5);
/// let profile = config.motion_profile().unwrap();
/// assert_eq!(profile.gravity, -24.0);
/// assert_eq!(profile.jump_speed, 12.0);
/// ```
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    // === Horizontal ===
    /// Top horizontal speed reachable from input.
    pub max_speed: f32,
    /// Time to reach `max_speed` from rest.
    pub acceleration_time: f32,
    /// Time to stop from `max_speed` without input.
    pub deceleration_time: f32,

    // === Dash ===
    /// Maximum (and spawn) number of dash charges.
    pub dash_charges: u32,
    /// Distance covered by one dash.
    pub dash_distance: f32,
    /// Duration of one dash.
    pub dash_duration: f32,

    // === Vertical ===
    /// Peak height of a jump from rest.
    pub apex_height: f32,
    /// Time to reach the jump peak.
    pub apex_time: f32,
    /// Lowest vertical velocity allowed while falling (negative).
    pub max_fall_speed: f32,

    // === Walls ===
    /// Speed of a wall jump along `wall_jump_direction`.
    pub wall_jump_force: f32,
    /// Lowest vertical velocity allowed while sliding down a wall (negative).
    pub wall_slide_speed: f32,
    /// Unit direction of a wall jump off a wall on the left.
    /// The horizontal part is mirrored away from the wall.
    pub wall_jump_direction: Vec2,
    /// Length of the wall probe ray along the facing direction.
    pub wall_probe_distance: f32,

    // === Ground probe ===
    /// Downward offset from the character position to the probe box center.
    pub ground_probe_offset: f32,
    /// Full size of the ground probe box.
    pub ground_probe_size: Vec2,

    // === Grapple ===
    /// Maximum grapple ray length and tether length.
    pub grapple_range: f32,
    /// Base lateral swing force. Applied scaled by [`SWING_FORCE_SCALE`](crate::grapple::SWING_FORCE_SCALE).
    pub swing_force: f32,
    /// Tether length change per second while reeling.
    pub reel_speed: f32,
    /// Force pulling toward (or pushing away from) the anchor while reeling.
    pub reel_force: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            acceleration_time: 0.25,
            deceleration_time: 0.15,

            dash_charges: 1,
            dash_distance: 5.0,
            dash_duration: 0.2,

            apex_height: 3.0,
            apex_time: 0.5,
            max_fall_speed: -20.0,

            wall_jump_force: 8.0,
            wall_slide_speed: -2.0,
            wall_jump_direction: Vec2::new(0.6, 0.8),
            wall_probe_distance: 0.6,

            ground_probe_offset: 0.5,
            ground_probe_size: Vec2::new(0.4, 0.1),

            grapple_range: 10.0,
            swing_force: 5.0,
            reel_speed: 4.0,
            reel_force: 2.0,
        }
    }
}

impl CharacterConfig {
    /// Parse a configuration from RON. Missing fields take their default values.
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field the controller divides by or clamps against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("acceleration_time", self.acceleration_time),
            ("deceleration_time", self.deceleration_time),
            ("apex_time", self.apex_time),
            ("dash_duration", self.dash_duration),
        ] {
            // `!(value > 0.0)` also rejects NaN
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveDuration { field, value });
            }
        }

        for (field, value) in [
            ("max_speed", self.max_speed),
            ("apex_height", self.apex_height),
            ("dash_distance", self.dash_distance),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if !(self.max_fall_speed < 0.0) {
            return Err(ConfigError::NotDownward {
                field: "max_fall_speed",
                value: self.max_fall_speed,
            });
        }
        if !(self.wall_slide_speed <= 0.0) {
            return Err(ConfigError::NotDownward {
                field: "wall_slide_speed",
                value: self.wall_slide_speed,
            });
        }

        if (self.wall_jump_direction.length() - 1.0).abs() > 1.0e-3 {
            return Err(ConfigError::WallJumpDirectionNotUnit(
                self.wall_jump_direction,
            ));
        }

        if !(self.grapple_range >= MIN_TETHER_LENGTH) {
            return Err(ConfigError::GrappleRangeTooShort {
                min: MIN_TETHER_LENGTH,
                value: self.grapple_range,
            });
        }

        Ok(())
    }

    /// Validate the config and derive its kinematic constants.
    pub fn motion_profile(&self) -> Result<MotionProfile, ConfigError> {
        self.validate()?;
        Ok(MotionProfile {
            acceleration_rate: self.max_speed / self.acceleration_time,
            deceleration_rate: self.max_speed / self.deceleration_time,
            gravity: -2.0 * self.apex_height / (self.apex_time * self.apex_time),
            jump_speed: 2.0 * self.apex_height / self.apex_time,
            dash_speed: self.dash_distance / self.dash_duration,
        })
    }

    /// Create a config with snappier acceleration and a higher jump.
    pub fn player() -> Self {
        Self {
            acceleration_time: 0.1,
            deceleration_time: 0.08,
            apex_height: 3.5,
            apex_time: 0.4,
            ..default()
        }
    }

    /// Set the horizontal movement parameters.
    pub fn with_movement(mut self, max_speed: f32, acceleration_time: f32, deceleration_time: f32) -> Self {
        self.max_speed = max_speed;
        self.acceleration_time = acceleration_time;
        self.deceleration_time = deceleration_time;
        self
    }

    /// Set the jump apex height and time to apex.
    pub fn with_jump_apex(mut self, height: f32, time: f32) -> Self {
        self.apex_height = height;
        self.apex_time = time;
        self
    }

    /// Set the maximum fall speed (stored as a negative floor).
    pub fn with_max_fall_speed(mut self, speed: f32) -> Self {
        self.max_fall_speed = -speed.abs();
        self
    }

    /// Set the dash parameters.
    pub fn with_dash(mut self, charges: u32, distance: f32, duration: f32) -> Self {
        self.dash_charges = charges;
        self.dash_distance = distance;
        self.dash_duration = duration;
        self
    }

    /// Set the wall jump force and direction. The direction is normalized.
    pub fn with_wall_jump(mut self, force: f32, direction: Vec2) -> Self {
        self.wall_jump_force = force;
        self.wall_jump_direction = direction.normalize_or_zero();
        self
    }

    /// Set the wall slide speed (stored as a negative floor).
    pub fn with_wall_slide_speed(mut self, speed: f32) -> Self {
        self.wall_slide_speed = -speed.abs();
        self
    }

    /// Set the ground probe box.
    pub fn with_ground_probe(mut self, offset: f32, size: Vec2) -> Self {
        self.ground_probe_offset = offset;
        self.ground_probe_size = size;
        self
    }

    /// Set the grapple range and swing force.
    pub fn with_grapple(mut self, range: f32, swing_force: f32) -> Self {
        self.grapple_range = range;
        self.swing_force = swing_force;
        self
    }
}

/// Kinematic constants derived from a [`CharacterConfig`].
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// Horizontal speed gained per second at full input.
    pub acceleration_rate: f32,
    /// Horizontal speed lost per second without input.
    pub deceleration_rate: f32,
    /// Vertical acceleration while airborne (negative).
    pub gravity: f32,
    /// Initial vertical speed of a jump.
    pub jump_speed: f32,
    /// Constant speed of a dash.
    pub dash_speed: f32,
}
