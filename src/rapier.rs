//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::controller::CharacterController;
use crate::detection::{sense, ProbeBox, ProbeFilter, ProbeFilters, ProbeResults, RayHit, SpatialQuery};
use crate::intent::ControlIntent;
use crate::pickup::{handle_trigger_overlaps, Pickup, TriggerOverlap};
use crate::PlatformerSet;

/// Rapier2D physics backend for the platformer controller.
///
/// Velocity goes straight to [`Velocity`], forces are accumulated in
/// [`ControllerForce`] and flushed into [`ExternalForce`] once per step, and
/// the grapple tether is an [`ImpulseJoint`] to a fixed anchor body. Probes
/// are run by dedicated systems that receive the Rapier context as a system
/// parameter.
pub struct Rapier2dBackend;

impl PlatformerPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
        // Flushed into ExternalForce by apply_controller_forces.
        if let Some(mut accumulator) = world.get_mut::<ControllerForce>(entity) {
            accumulator.pending += force;
        }
    }

    fn enable_distance_constraint(world: &mut World, entity: Entity, anchor: Vec2, distance: f32) {
        Self::disable_distance_constraint(world, entity);

        let anchor_body = world
            .spawn((
                TetherAnchorBody,
                RigidBody::Fixed,
                Transform::from_translation(anchor.extend(0.0)),
            ))
            .id();

        // Coupled linear axes limit the distance between the anchors.
        let joint = GenericJointBuilder::new(JointAxesMask::empty())
            .coupled_axes(JointAxesMask::LIN_AXES)
            .limits(JointAxis::LinX, [distance, distance])
            .build();

        let Ok(mut character) = world.get_entity_mut(entity) else {
            world.despawn(anchor_body);
            return;
        };
        character.insert((
            ImpulseJoint::new(anchor_body, TypedJoint::GenericJoint(joint)),
            TetherAnchor(anchor_body),
        ));
    }

    fn disable_distance_constraint(world: &mut World, entity: Entity) {
        let Ok(mut character) = world.get_entity_mut(entity) else {
            return;
        };
        let anchor = character.take::<TetherAnchor>();
        character.remove::<ImpulseJoint>();
        if let Some(TetherAnchor(anchor_body)) = anchor {
            world.despawn(anchor_body);
        }
    }

    fn set_constraint_distance(world: &mut World, entity: Entity, distance: f32) {
        let Some(mut joint) = world.get_mut::<ImpulseJoint>(entity) else {
            return;
        };
        if let TypedJoint::GenericJoint(generic) = &mut joint.data {
            generic.set_limits(JointAxis::LinX, [distance, distance]);
        }
    }
}

/// The fixed body a character's tether is attached to.
#[derive(Component, Debug, Clone, Copy)]
pub struct TetherAnchor(pub Entity);

/// Marker for bodies spawned as tether anchors.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct TetherAnchorBody;

/// Forces the controller added this step, and the forces it added to
/// [`ExternalForce`] last step.
///
/// External user forces on the same body are preserved: last step's
/// contribution is subtracted before the new one is added.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ControllerForce {
    pending: Vec2,
    applied: Vec2,
}

/// Plugin that sets up Rapier2D-specific systems for the platformer controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(PlatformerSet::Preparation),
        );

        app.add_systems(FixedUpdate, rapier_probes.in_set(PlatformerSet::Sensors));

        app.add_systems(
            FixedUpdate,
            forward_collision_events
                .in_set(PlatformerSet::Triggers)
                .before(handle_trigger_overlaps),
        );

        app.add_systems(
            FixedUpdate,
            (apply_controller_forces, sync_pickup_colliders).in_set(PlatformerSet::Finalize),
        );
    }
}

/// [`SpatialQuery`] over a Rapier context, ignoring one body and all sensors.
struct RapierProbe<'a, 'w> {
    context: &'a RapierContext<'w>,
    exclude: Entity,
}

impl RapierProbe<'_, '_> {
    fn filter(&self, filter: ProbeFilter) -> QueryFilter<'static> {
        QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::from_bits_truncate(filter.memberships),
                Group::from_bits_truncate(filter.filters),
            ))
    }
}

impl SpatialQuery for RapierProbe<'_, '_> {
    fn overlap_box(&self, probe: ProbeBox, filter: ProbeFilter) -> bool {
        let half = probe.half_size();
        let shape = Collider::cuboid(half.x, half.y);
        self.context
            .query_pipeline
            .intersection_with_shape(
                self.context.colliders,
                self.context.rigidbody_set,
                probe.center,
                0.0,
                &shape,
                self.filter(filter),
            )
            .is_some()
    }

    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: ProbeFilter,
    ) -> Option<RayHit> {
        self.context
            .cast_ray(origin, direction, max_distance, true, self.filter(filter))
            .map(|(hit_entity, toi)| {
                RayHit::new(toi, origin + direction * toi, Some(hit_entity))
            })
    }
}

/// Rapier-specific probe system: ground box, wall ray and grapple ray.
fn rapier_probes(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &CharacterController,
        &ProbeFilters,
        &ControlIntent,
        Option<&Velocity>,
        &mut ProbeResults,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, controller, filters, intent, velocity, mut results) in
        &mut q_controllers
    {
        let probe = RapierProbe {
            context: &context,
            exclude: entity,
        };
        let position = transform.translation().xy();
        let body_velocity = velocity.map(|v| v.linvel).unwrap_or(Vec2::ZERO);

        *results = sense(
            &probe,
            controller,
            filters,
            position,
            body_velocity,
            &intent.peek(),
        );
    }
}

/// Turn Rapier collision starts involving a character into [`TriggerOverlap`]s.
pub fn forward_collision_events(
    mut collisions: EventReader<CollisionEvent>,
    characters: Query<(), With<CharacterController>>,
    mut overlaps: EventWriter<TriggerOverlap>,
) {
    for event in collisions.read() {
        let &CollisionEvent::Started(a, b, _) = event else {
            continue;
        };
        if characters.contains(a) {
            overlaps.write(TriggerOverlap {
                character: a,
                other: b,
            });
        }
        if characters.contains(b) {
            overlaps.write(TriggerOverlap {
                character: b,
                other: a,
            });
        }
    }
}

/// Disable the collider of inactive pickups so they can't be touched again
/// until they respawn.
pub fn sync_pickup_colliders(
    mut commands: Commands,
    q_pickups: Query<(Entity, &Pickup, Has<ColliderDisabled>), Changed<Pickup>>,
) {
    for (entity, pickup, disabled) in &q_pickups {
        match (pickup.is_active(), disabled) {
            (true, true) => {
                commands.entity(entity).remove::<ColliderDisabled>();
            }
            (false, false) => {
                commands.entity(entity).insert(ColliderDisabled);
            }
            _ => {}
        }
    }
}

/// Remove last step's controller forces from [`ExternalForce`].
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForce)>) {
    for (mut ext_force, mut accumulator) in &mut q {
        ext_force.force -= accumulator.applied;
        accumulator.applied = Vec2::ZERO;
    }
}

/// Add this step's controller forces to [`ExternalForce`].
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut ControllerForce)>) {
    for (mut ext_force, mut accumulator) in &mut q {
        let force = std::mem::take(&mut accumulator.pending);
        ext_force.force += force;
        accumulator.applied = force;
    }
}

/// Bundle for creating a platformer character with Rapier2D physics.
///
/// The controller integrates its own gravity and writes the velocity every
/// step, so the body ignores Rapier's gravity. Collision events are enabled
/// so pickups can be collected.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
/// use platformer_controller::rapier::Rapier2dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) -> Result {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(CharacterConfig::player())?,
///         Rapier2dCharacterBundle::rotation_locked(),
///         Collider::cuboid(0.4, 0.5),
///     ));
///     Ok(())
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `gravity_scale`: 0.0
/// - `active_events`: [`ActiveEvents::COLLISION_EVENTS`]
/// - `locked_axes`: empty for [`Rapier2dCharacterBundle::new()`]
#[derive(Bundle)]
pub struct Rapier2dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Written by the controller every step.
    pub velocity: Velocity,
    /// Swing and reel forces land here.
    pub external_force: ExternalForce,
    pub controller_force: ControllerForce,
    /// Use [`LockedAxes::ROTATION_LOCKED`] for simple platformers.
    pub locked_axes: LockedAxes,
    pub gravity_scale: GravityScale,
    pub active_events: ActiveEvents,
}

impl Default for Rapier2dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dCharacterBundle {
    /// Create a new character bundle with rotation enabled.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            controller_force: ControllerForce::default(),
            locked_axes: LockedAxes::empty(),
            gravity_scale: GravityScale(0.0),
            active_events: ActiveEvents::COLLISION_EVENTS,
        }
    }

    /// Create a character bundle with rotation locked.
    ///
    /// This is the most common configuration for 2D platformers.
    pub fn rotation_locked() -> Self {
        Self {
            locked_axes: LockedAxes::ROTATION_LOCKED,
            ..Self::new()
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
