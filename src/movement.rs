//! Horizontal and vertical motion.
//!
//! Horizontal speed accelerates toward the input direction and decays to zero
//! without input. Vertical speed follows a constant gravity derived from the
//! jump apex, so a jump from rest peaks at `apex_height` after `apex_time`.

use crate::config::{CharacterConfig, MotionProfile};
use crate::controller::CharacterState;
use crate::state::Facing;

/// Accelerate horizontal velocity along `input` and clamp to `max_speed`.
#[inline]
pub fn accelerate(velocity_x: f32, input: f32, rate: f32, max_speed: f32, dt: f32) -> f32 {
    (velocity_x + rate * input * dt).clamp(-max_speed, max_speed)
}

/// Decay horizontal velocity toward zero without crossing it.
#[inline]
pub fn decelerate(velocity_x: f32, rate: f32, dt: f32) -> f32 {
    if velocity_x > 0.0 {
        (velocity_x - rate * dt).max(0.0)
    } else if velocity_x < 0.0 {
        (velocity_x + rate * dt).min(0.0)
    } else {
        0.0
    }
}

/// Update facing and horizontal velocity from the horizontal input axis.
///
/// Facing changes only on non-zero input. While dashing, input is ignored and
/// the velocity decays like it does without input.
pub fn apply_horizontal(
    state: &mut CharacterState,
    input: f32,
    config: &CharacterConfig,
    profile: &MotionProfile,
    dt: f32,
) {
    if let Some(facing) = Facing::from_input(input) {
        state.facing = facing;
    }

    state.velocity.x = if input != 0.0 && !state.dash.is_active() {
        accelerate(
            state.velocity.x,
            input,
            profile.acceleration_rate,
            config.max_speed,
            dt,
        )
    } else {
        decelerate(state.velocity.x, profile.deceleration_rate, dt)
    };
}

/// Start a jump if grounded and the jump button is held.
///
/// Returns whether a jump started. Grounded is cleared immediately so gravity
/// applies in the same tick.
pub fn apply_jump(state: &mut CharacterState, jump_held: bool, profile: &MotionProfile) -> bool {
    if state.grounded && jump_held {
        state.velocity.y = profile.jump_speed;
        state.grounded = false;
        true
    } else {
        false
    }
}

/// Apply gravity and the fall speed floor while airborne; cancel vertical
/// velocity while grounded.
pub fn apply_vertical(
    state: &mut CharacterState,
    config: &CharacterConfig,
    profile: &MotionProfile,
    dt: f32,
) {
    if state.grounded {
        state.velocity.y = 0.0;
    } else {
        state.velocity.y =
            (state.velocity.y + profile.gravity * dt).max(config.max_fall_speed);
    }
}
