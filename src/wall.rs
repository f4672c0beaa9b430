//! Wall slide and wall jump.

use crate::config::CharacterConfig;
use crate::controller::CharacterState;

/// Wall jump off the wall in the facing direction.
///
/// Fires on a jump press while touching a wall and airborne. The horizontal
/// part of `wall_jump_direction` is mirrored to push away from the wall.
/// Clears `touching_wall` so the jump cannot repeat before the next probe.
pub fn try_wall_jump(state: &mut CharacterState, jump_pressed: bool, config: &CharacterConfig) -> bool {
    if !(jump_pressed && state.touching_wall && !state.grounded) {
        return false;
    }

    let away = -state.facing.sign();
    state.velocity.x = config.wall_jump_direction.x * config.wall_jump_force * away;
    state.velocity.y = config.wall_jump_direction.y * config.wall_jump_force;
    state.touching_wall = false;
    true
}

/// Slow a fall along a wall to at most `wall_slide_speed`.
pub fn clamp_wall_slide(state: &mut CharacterState, config: &CharacterConfig) {
    if state.touching_wall && !state.grounded && state.velocity.y < 0.0 {
        state.velocity.y = state.velocity.y.max(config.wall_slide_speed);
    }
}
