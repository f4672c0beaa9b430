//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement to
//! drive platformer characters. The controller only needs a narrow contract:
//! read position and velocity, write velocity, add forces, and manage one
//! distance constraint per character.
//!
//! Environment probes are not part of this trait. A backend plugin runs its
//! own sensor systems in [`PlatformerSet::Sensors`](crate::PlatformerSet)
//! that fill [`ProbeResults`](crate::detection::ProbeResults), usually by
//! wrapping its query pipeline in a [`SpatialQuery`](crate::detection::SpatialQuery)
//! and calling [`sense`](crate::detection::sense).

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the platformer
/// controller. For an example implementation, see the `rapier` module's
/// `Rapier2dBackend`.
pub trait PlatformerPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Get the current velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Add a continuous force to an entity for the next physics step.
    fn apply_force(world: &mut World, entity: Entity, force: Vec2);

    /// Hold `entity` at exactly `distance` from `anchor`.
    fn enable_distance_constraint(world: &mut World, entity: Entity, anchor: Vec2, distance: f32);

    /// Remove the distance constraint of `entity`, if any.
    fn disable_distance_constraint(world: &mut World, entity: Entity);

    /// Change the length of the distance constraint of `entity`.
    fn set_constraint_distance(world: &mut World, entity: Entity, distance: f32);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
