//! Behavior states and state marker components.
//!
//! The behavior state is a classification of physical facts (grounded,
//! horizontal velocity, death). It is recomputed every tick by [`classify`]
//! and never set directly.
//!
//! The marker components mirror controller state for queries. They are
//! added/removed by the controller systems after every tick.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Horizontal facing of a character.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Facing implied by a horizontal input, or `None` when the input is zero.
    pub fn from_input(input: f32) -> Option<Self> {
        if input < 0.0 {
            Some(Self::Left)
        } else if input > 0.0 {
            Some(Self::Right)
        } else {
            None
        }
    }

    /// `-1.0` for left, `1.0` for right.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Unit vector pointing in the facing direction.
    #[inline]
    pub fn unit(self) -> Vec2 {
        Vec2::new(self.sign(), 0.0)
    }
}

/// Coarse behavior of a character, derived from its physical state.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    Idle,
    Walking,
    Jumping,
    /// Terminal. No transition leaves this state.
    Dead,
}

/// Classify the next behavior state.
///
/// Precedence:
/// 1. dead if `is_dead` or the prior state is dead;
/// 2. from idle/walking: airborne is jumping, otherwise walking/idle by `velocity_x`;
/// 3. from jumping: grounded lands into walking/idle, airborne stays jumping.
pub fn classify(
    prior: BehaviorState,
    grounded: bool,
    velocity_x: f32,
    is_dead: bool,
) -> BehaviorState {
    if is_dead {
        return BehaviorState::Dead;
    }

    let moving_or_idle = if velocity_x != 0.0 {
        BehaviorState::Walking
    } else {
        BehaviorState::Idle
    };

    match prior {
        BehaviorState::Dead => BehaviorState::Dead,
        BehaviorState::Idle | BehaviorState::Walking if !grounded => BehaviorState::Jumping,
        BehaviorState::Idle | BehaviorState::Walking => moving_or_idle,
        BehaviorState::Jumping if grounded => moving_or_idle,
        BehaviorState::Jumping => BehaviorState::Jumping,
    }
}

/// Sent when a character's behavior state changes.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorChanged {
    pub entity: Entity,
    pub previous: BehaviorState,
    pub current: BehaviorState,
}

/// Marker component indicating the character is grounded.
///
/// Mutually exclusive with [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the wall probe hit a wall in the facing direction.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Side of the wall relative to the character.
    pub side: Facing,
}

impl TouchingWall {
    /// Create a new wall touch state.
    pub fn new(side: Facing) -> Self {
        Self { side }
    }

    /// Check if the wall is on the left side.
    pub fn is_left(&self) -> bool {
        self.side == Facing::Left
    }

    /// Check if the wall is on the right side.
    pub fn is_right(&self) -> bool {
        self.side == Facing::Right
    }
}

/// Marker component present while a dash is in progress.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Dashing;

/// Marker component present while the grapple tether is engaged.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct Grappling {
    /// World point the tether is fixed to.
    pub anchor: Vec2,
}

/// Marker component present once the character has died.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Dead;
