//! Dash ability.
//!
//! A dash is a constant-velocity burst covering `dash_distance` in
//! `dash_duration`. It consumes one charge; charges refill on landing and on
//! pickups, never over time.

use bevy::prelude::*;

use crate::state::Facing;

/// Remaining dash time below which the dash is considered finished.
/// Absorbs float drift from repeated `timer -= dt`.
const TIMER_EPSILON: f32 = 1.0e-5;

/// Dash resource and timing state.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct DashState {
    active: bool,
    timer: f32,
    velocity: Vec2,
    charges: u32,
    max_charges: u32,
}

impl DashState {
    /// A fresh dash state with all charges available.
    pub fn new(max_charges: u32) -> Self {
        Self {
            active: false,
            timer: 0.0,
            velocity: Vec2::ZERO,
            charges: max_charges,
            max_charges,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds left in the current dash (0 when not dashing).
    #[inline]
    pub fn remaining_time(&self) -> f32 {
        self.timer
    }

    /// Velocity held for the duration of the current dash.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    #[inline]
    pub fn charges(&self) -> u32 {
        self.charges
    }

    #[inline]
    pub fn max_charges(&self) -> u32 {
        self.max_charges
    }

    /// Restore every charge.
    pub fn refill(&mut self) {
        self.charges = self.max_charges;
    }

    /// Start a dash if a charge is available and no dash is running.
    ///
    /// Returns the dash velocity when a dash started.
    pub fn try_start(&mut self, axis: Vec2, facing: Facing, speed: f32, duration: f32) -> Option<Vec2> {
        if self.active || self.charges == 0 {
            return None;
        }

        self.charges -= 1;
        self.active = true;
        self.timer = duration;
        self.velocity = resolve_direction(axis, facing) * speed;
        Some(self.velocity)
    }

    /// Count down the dash timer. Returns whether the dash is still running.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }

        self.timer -= dt;
        if self.timer <= TIMER_EPSILON {
            self.active = false;
            self.timer = 0.0;
        }
        self.active
    }
}

/// Direction of a dash: the normalized input, or the facing direction when
/// the input is exactly zero.
pub fn resolve_direction(axis: Vec2, facing: Facing) -> Vec2 {
    if axis == Vec2::ZERO {
        facing.unit()
    } else {
        axis.normalize()
    }
}
