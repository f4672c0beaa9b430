//! The character controller.
//!
//! [`CharacterController`] is the central hub for a character: it owns the
//! mutable [`CharacterState`] and exposes the three entry points the host
//! drives: [`CharacterController::new`] at spawn, [`CharacterController::tick`]
//! once per fixed step, and [`CharacterController::on_trigger_overlap`] when
//! the character's trigger touches something.

use bevy::prelude::*;

use crate::config::{CharacterConfig, ConfigError, MotionProfile};
use crate::dash::DashState;
use crate::detection::{ProbeBox, ProbeFilters, ProbeResults};
use crate::grapple::{self, RopeCommand, RopeVisual, Tether, TetherCommand};
use crate::intent::{ControlIntent, TickInput};
use crate::movement;
use crate::pickup::Pickup;
use crate::state::{classify, BehaviorState, Facing};
use crate::wall;

/// Mutable per-character state, owned by [`CharacterController`].
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct CharacterState {
    /// Last position read from the physics world.
    pub(crate) position: Vec2,
    /// Authoritative velocity, written back to the physics world every tick.
    pub(crate) velocity: Vec2,
    pub(crate) facing: Facing,
    pub(crate) behavior: BehaviorState,
    pub(crate) previous_behavior: BehaviorState,
    pub(crate) grounded: bool,
    pub(crate) touching_wall: bool,
    /// Side of the last wall probe. Facing may change later in the same tick.
    pub(crate) wall_side: Facing,
    pub(crate) dash: DashState,
    pub(crate) tether: Option<Tether>,
    pub(crate) is_dead: bool,
}

impl CharacterState {
    /// State of a freshly spawned character.
    pub fn spawn(config: &CharacterConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            behavior: BehaviorState::Idle,
            previous_behavior: BehaviorState::Idle,
            grounded: false,
            touching_wall: false,
            wall_side: Facing::Right,
            dash: DashState::new(config.dash_charges),
            tether: None,
            is_dead: false,
        }
    }
}

/// What one tick asks of the physics and rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Velocity to commit to the body.
    pub velocity: Vec2,
    /// Continuous force to add this tick.
    pub force: Vec2,
    /// Distance constraint change, if any.
    pub tether: Option<TetherCommand>,
    /// Rope visual change, if any.
    pub rope: Option<RopeCommand>,
    /// Behavior transition as (previous, current), if the state changed.
    pub transition: Option<(BehaviorState, BehaviorState)>,
}

/// Platformer character controller component.
///
/// # Example
///
/// ```rust
/// use platformer_controller::prelude::*;
///
/// let mut controller = CharacterController::new(CharacterConfig::default()).unwrap();
/// let probes = ProbeResults {
///     grounded: true,
///     ..Default::default()
/// };
/// let output = controller.tick(0.1, &TickInput::walking(1.0), &probes);
/// assert!((output.velocity.x - 2.0).abs() < 1e-5);
/// assert_eq!(controller.behavior(), BehaviorState::Idle);
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(ControlIntent, ProbeResults, ProbeFilters, RopeVisual)]
pub struct CharacterController {
    config: CharacterConfig,
    profile: MotionProfile,
    state: CharacterState,
}

impl CharacterController {
    /// Validate the config and spawn a controller at rest.
    pub fn new(config: CharacterConfig) -> Result<Self, ConfigError> {
        let profile = config.motion_profile()?;
        Ok(Self {
            config,
            profile,
            state: CharacterState::spawn(&config),
        })
    }

    /// Advance the controller by one fixed step.
    pub fn tick(&mut self, dt: f32, input: &TickInput, probes: &ProbeResults) -> TickOutput {
        let Self {
            config,
            profile,
            state,
        } = self;

        // Probes
        state.position = probes.position;
        state.grounded = probes.grounded;
        state.touching_wall = probes.touching_wall;
        state.wall_side = probes.wall_side;
        if state.tether.is_some() {
            state.velocity = probes.body_velocity;
        }

        // Behavior state
        state.previous_behavior = state.behavior;
        state.behavior = classify(
            state.behavior,
            state.grounded,
            state.velocity.x,
            state.is_dead,
        );

        // Wall jump
        let dashing_at_start = state.dash.is_active();
        if !dashing_at_start && wall::try_wall_jump(state, input.jump_pressed, config) {
            debug!("wall jump off {:?} wall", state.facing);
        }

        // Horizontal and dash
        movement::apply_horizontal(state, input.axis.x, config, profile, dt);
        if input.dash_pressed {
            if let Some(velocity) = state.dash.try_start(
                input.axis,
                state.facing,
                profile.dash_speed,
                config.dash_duration,
            ) {
                debug!(
                    "dash started with velocity {velocity}, {} charges left",
                    state.dash.charges()
                );
            }
        }
        let dashed = state.dash.is_active();
        if dashed {
            state.velocity = state.dash.velocity();
            state.dash.advance(dt);
        }

        // Vertical
        if !dashed {
            movement::apply_jump(state, input.jump_held, profile);
            movement::apply_vertical(state, config, profile, dt);
            wall::clamp_wall_slide(state, config);
        }

        if state.grounded {
            state.dash.refill();
        }

        // Grapple
        let grapple = grapple::update_grapple(
            &mut state.tether,
            input,
            probes.grapple_hit.map(|hit| hit.point),
            state.position,
            config,
            dt,
        );

        let transition = (state.behavior != state.previous_behavior)
            .then_some((state.previous_behavior, state.behavior));

        TickOutput {
            velocity: state.velocity,
            force: grapple.force,
            tether: grapple.tether,
            rope: grapple.rope,
            transition,
        }
    }

    /// React to the character's trigger overlapping another object.
    ///
    /// Only active pickups are consumed: dash charges refill and the call
    /// returns `true`. The caller deactivates the pickup and schedules its
    /// respawn.
    pub fn on_trigger_overlap(&mut self, pickup: Option<&Pickup>) -> bool {
        match pickup {
            Some(pickup) if pickup.is_active() => {
                self.state.dash.refill();
                true
            }
            _ => false,
        }
    }

    /// Mark the character dead. Death is permanent for this controller;
    /// respawning means replacing the component.
    pub fn kill(&mut self) {
        self.state.is_dead = true;
    }

    // === Observers ===

    #[inline]
    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    #[inline]
    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    #[inline]
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    /// Whether horizontal velocity is non-zero.
    #[inline]
    pub fn is_walking(&self) -> bool {
        self.state.velocity.x != 0.0
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.state.grounded
    }

    #[inline]
    pub fn is_touching_wall(&self) -> bool {
        self.state.touching_wall
    }

    /// Side of the wall reported by the last wall probe.
    #[inline]
    pub fn wall_side(&self) -> Facing {
        self.state.wall_side
    }

    #[inline]
    pub fn facing(&self) -> Facing {
        self.state.facing
    }

    #[inline]
    pub fn behavior(&self) -> BehaviorState {
        self.state.behavior
    }

    #[inline]
    pub fn previous_behavior(&self) -> BehaviorState {
        self.state.previous_behavior
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.state.is_dead
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.state.velocity
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    #[inline]
    pub fn is_dashing(&self) -> bool {
        self.state.dash.is_active()
    }

    #[inline]
    pub fn remaining_dash_charges(&self) -> u32 {
        self.state.dash.charges()
    }

    #[inline]
    pub fn is_grappling(&self) -> bool {
        self.state.tether.is_some()
    }

    #[inline]
    pub fn tether(&self) -> Option<Tether> {
        self.state.tether
    }

    /// Ground probe box at the last known position, for debug drawing.
    pub fn ground_probe_box(&self) -> ProbeBox {
        ProbeBox::ground(&self.config, self.state.position)
    }
}
