//! Core controller systems.
//!
//! These systems drive [`CharacterController`]s from their intents and probe
//! results. They are generic over the physics backend so any engine can sit
//! underneath.

use bevy::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::controller::CharacterController;
use crate::detection::{sense, ProbeFilters, ProbeResults, SpatialQuery};
use crate::grapple::{RopeVisual, TetherCommand};
use crate::intent::{ControlIntent, TickInput};
use crate::schedule::SimulationClock;
use crate::state::{
    Airborne, BehaviorChanged, Dashing, Dead, Grappling, Grounded, TouchingWall,
};

/// Advance the simulation clock by one fixed step.
pub fn advance_clock<B: PlatformerPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    if let Some(mut clock) = world.get_resource_mut::<SimulationClock>() {
        clock.advance(dt);
    }
}

/// Run the ground, wall and grapple probes against a spatial query stored
/// as a resource.
///
/// Backends whose query pipeline lives in a resource can add this system to
/// [`PlatformerSet::Sensors`](crate::PlatformerSet) instead of writing their own.
pub fn update_probes<B, Q>(world: &mut World)
where
    B: PlatformerPhysicsBackend,
    Q: SpatialQuery + Resource,
{
    let entities: Vec<(Entity, CharacterController, ProbeFilters, TickInput)> = world
        .query::<(Entity, &CharacterController, &ProbeFilters, &ControlIntent)>()
        .iter(world)
        .map(|(e, controller, filters, intent)| (e, controller.clone(), *filters, intent.peek()))
        .collect();

    for (entity, controller, filters, input) in entities {
        let position = B::get_position(world, entity);
        let body_velocity = B::get_velocity(world, entity);

        let Some(query) = world.get_resource::<Q>() else {
            warn!("spatial query resource missing, probes not updated");
            return;
        };
        let probes = sense(query, &controller, &filters, position, body_velocity, &input);

        if let Some(mut results) = world.get_mut::<ProbeResults>(entity) {
            *results = probes;
        }
    }
}

/// Tick every controller and hand its output to the backend.
pub fn tick_controllers<B: PlatformerPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let mut query = world.query::<(
        Entity,
        &mut CharacterController,
        &mut ControlIntent,
        &ProbeResults,
        &mut RopeVisual,
    )>();

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<CharacterController>>()
        .iter(world)
        .collect();

    for entity in entities {
        let output = {
            let Ok((_, mut controller, mut intent, probes, mut rope)) = query.get_mut(world, entity)
            else {
                continue;
            };
            let input = intent.sample();
            let output = controller.tick(dt, &input, probes);
            if let Some(command) = output.rope {
                rope.apply(command);
            }
            output
        };

        B::set_velocity(world, entity, output.velocity);
        if output.force != Vec2::ZERO {
            B::apply_force(world, entity, output.force);
        }

        match output.tether {
            Some(TetherCommand::Engage { anchor, distance }) => {
                B::enable_distance_constraint(world, entity, anchor, distance);
            }
            Some(TetherCommand::SetDistance(distance)) => {
                B::set_constraint_distance(world, entity, distance);
            }
            Some(TetherCommand::Release) => {
                B::disable_distance_constraint(world, entity);
            }
            None => {}
        }

        if let Some((previous, current)) = output.transition {
            world.send_event(BehaviorChanged {
                entity,
                previous,
                current,
            });
        }
    }
}

/// Sync state marker components with the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
        Has<Dashing>,
        Option<&Grappling>,
        Has<Dead>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, wall, has_dashing, grappling, has_dead) in
        &q_controllers
    {
        let mut entity_commands = commands.entity(entity);

        // Sync Grounded/Airborne
        if controller.is_grounded() {
            if !has_grounded {
                entity_commands.insert(Grounded);
            }
            if has_airborne {
                entity_commands.remove::<Airborne>();
            }
        } else {
            if !has_airborne {
                entity_commands.insert(Airborne);
            }
            if has_grounded {
                entity_commands.remove::<Grounded>();
            }
        }

        // Sync TouchingWall, keeping the side up to date
        match (controller.is_touching_wall(), wall) {
            (true, Some(wall)) if wall.side == controller.wall_side() => {}
            (true, _) => {
                entity_commands.insert(TouchingWall::new(controller.wall_side()));
            }
            (false, Some(_)) => {
                entity_commands.remove::<TouchingWall>();
            }
            (false, None) => {}
        }

        if controller.is_dashing() != has_dashing {
            if has_dashing {
                entity_commands.remove::<Dashing>();
            } else {
                entity_commands.insert(Dashing);
            }
        }

        match (controller.tether(), grappling) {
            (Some(tether), Some(marker)) if marker.anchor == tether.anchor => {}
            (Some(tether), _) => {
                entity_commands.insert(Grappling {
                    anchor: tether.anchor,
                });
            }
            (None, Some(_)) => {
                entity_commands.remove::<Grappling>();
            }
            (None, None) => {}
        }

        if controller.is_dead() != has_dead {
            if has_dead {
                entity_commands.remove::<Dead>();
            } else {
                entity_commands.insert(Dead);
            }
        }
    }
}
