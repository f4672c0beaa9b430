//! # `platformer_controller`
//!
//! A 2D platformer character controller with physics backend abstraction.
//!
//! This crate provides a kinematic character controller that:
//! - Accelerates and decelerates toward the input direction
//! - Derives gravity and jump speed from a desired apex height and time
//! - Dashes a fixed distance in a fixed time, gated by refillable charges
//! - Slides down and jumps off walls
//! - Swings from a grapple anchor on a rigid tether, with reel in/out
//! - Classifies behavior (idle/walking/jumping/dead) from physical facts
//! - Abstracts the physics backend (Rapier2D included behind `rapier2d`)
//!
//! ## Architecture
//!
//! Each tick runs in four phases:
//! 1. Sensors fill [`ProbeResults`](detection::ProbeResults) (ground box,
//!    wall ray along facing, grapple ray on press)
//! 2. [`CharacterController::tick`](controller::CharacterController::tick)
//!    turns intent and probes into a velocity, forces and tether commands
//! 3. The backend commits the velocity, forces and constraint
//! 4. Trigger overlaps refill dash charges and schedule pickup respawns
//!
//! The controller itself does not depend on Bevy's scheduling and can be
//! driven directly:
//!
//! ```rust
//! use platformer_controller::prelude::*;
//!
//! let mut controller = CharacterController::new(CharacterConfig::default()).unwrap();
//! let mut intent = ControlIntent::new();
//! intent.set_jump(true);
//!
//! let probes = ProbeResults {
//!     grounded: true,
//!     ..Default::default()
//! };
//! let output = controller.tick(1.0 / 60.0, &intent.sample(), &probes);
//! assert!(output.velocity.y > 0.0);
//! ```

use std::marker::PhantomData;

use bevy::prelude::*;

pub mod backend;
pub mod config;
pub mod controller;
pub mod dash;
pub mod detection;
pub mod grapple;
pub mod intent;
pub mod movement;
pub mod pickup;
pub mod schedule;
pub mod state;
pub mod systems;
pub mod wall;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::PlatformerPhysicsBackend;
    pub use crate::config::{CharacterConfig, ConfigError, MotionProfile};
    pub use crate::controller::{CharacterController, TickOutput};
    pub use crate::detection::{
        ProbeBox, ProbeFilter, ProbeFilters, ProbeResults, RayHit, SpatialQuery,
    };
    pub use crate::grapple::{RopeCommand, RopeVisual, Tether, TetherCommand};
    pub use crate::intent::{ControlIntent, Reel, TickInput};
    pub use crate::pickup::{Pickup, PickupCollected, PickupRespawned, TriggerOverlap};
    pub use crate::schedule::SimulationClock;
    pub use crate::state::{
        Airborne, BehaviorChanged, BehaviorState, Dashing, Dead, Facing, Grappling, Grounded,
        TouchingWall,
    };
    pub use crate::{PlatformerControllerPlugin, PlatformerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::Rapier2dBackend;
}

/// System sets of the controller, chained in this order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformerSet {
    /// Clock advance, pickup respawns, backend cleanup.
    Preparation,
    /// Backend probes fill `ProbeResults`.
    Sensors,
    /// Controllers tick and commit to the backend.
    Motion,
    /// Trigger overlaps are handled.
    Triggers,
    /// Marker components are synced.
    Finalize,
}

/// Main plugin for the platformer controller.
///
/// This plugin is generic over a physics backend `B` which provides the
/// physics operations (velocity, forces, distance constraint) and, through
/// its own plugin, the probe systems.
///
/// # Examples
///
/// With the Rapier2D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(PlatformerControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct PlatformerControllerPlugin<B: backend::PlatformerPhysicsBackend> {
    _marker: PhantomData<B>,
}

impl<B: backend::PlatformerPhysicsBackend> Default for PlatformerControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<B: backend::PlatformerPhysicsBackend> Plugin for PlatformerControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::CharacterController>();
        app.register_type::<intent::ControlIntent>();
        app.register_type::<detection::ProbeResults>();
        app.register_type::<detection::ProbeFilters>();
        app.register_type::<grapple::RopeVisual>();
        app.register_type::<pickup::Pickup>();
        app.register_type::<schedule::SimulationClock>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::Dashing>();
        app.register_type::<state::Grappling>();
        app.register_type::<state::Dead>();

        app.init_resource::<schedule::SimulationClock>();
        app.init_resource::<pickup::PickupRespawns>();

        app.add_event::<state::BehaviorChanged>();
        app.add_event::<pickup::TriggerOverlap>();
        app.add_event::<pickup::PickupCollected>();
        app.add_event::<pickup::PickupRespawned>();

        app.configure_sets(
            FixedUpdate,
            (
                PlatformerSet::Preparation,
                PlatformerSet::Sensors,
                PlatformerSet::Motion,
                PlatformerSet::Triggers,
                PlatformerSet::Finalize,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::advance_clock::<B>, pickup::respawn_pickups)
                .chain()
                .in_set(PlatformerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::tick_controllers::<B>.in_set(PlatformerSet::Motion),
        );
        app.add_systems(
            FixedUpdate,
            pickup::handle_trigger_overlaps.in_set(PlatformerSet::Triggers),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(PlatformerSet::Finalize),
        );
    }
}
