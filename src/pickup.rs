//! Dash-refill pickups.
//!
//! A character touching an active [`Pickup`] gets its dash charges back. The
//! pickup goes inactive and is reactivated after its respawn delay by the
//! [`PickupRespawns`] queue.

use std::time::Duration;

use bevy::prelude::*;

use crate::controller::CharacterController;
use crate::schedule::{SimulationClock, TaskQueue};

/// Default delay before a collected pickup reappears, in seconds.
pub const DEFAULT_RESPAWN_DELAY: f32 = 3.0;

/// A collectible that refills dash charges.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct Pickup {
    active: bool,
    respawn_delay: f32,
}

impl Default for Pickup {
    fn default() -> Self {
        Self::new(DEFAULT_RESPAWN_DELAY)
    }
}

impl Pickup {
    /// An active pickup that respawns `respawn_delay` seconds after collection.
    pub fn new(respawn_delay: f32) -> Self {
        Self {
            active: true,
            respawn_delay: respawn_delay.max(0.0),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn respawn_delay(&self) -> f32 {
        self.respawn_delay
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Sent by the host (or a physics backend) when a character's trigger starts
/// overlapping another entity.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOverlap {
    pub character: Entity,
    pub other: Entity,
}

/// Sent when a character collected a pickup.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupCollected {
    pub character: Entity,
    pub pickup: Entity,
}

/// Sent when a collected pickup became active again.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupRespawned {
    pub pickup: Entity,
}

/// Pending pickup reactivations.
#[derive(Resource, Debug, Default)]
pub struct PickupRespawns {
    queue: TaskQueue<Entity>,
}

impl PickupRespawns {
    /// Schedule `pickup` to reactivate `delay` seconds after `now`.
    pub fn schedule(&mut self, now: Duration, delay: f32, pickup: Entity) {
        let delay = Duration::try_from_secs_f32(delay).unwrap_or_default();
        self.queue.schedule(now, delay, pickup);
    }

    /// Number of pickups waiting to respawn.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pickups due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<Entity> {
        self.queue.drain_due(now)
    }
}

/// Route trigger overlaps to the controllers and collect pickups.
pub fn handle_trigger_overlaps(
    mut overlaps: EventReader<TriggerOverlap>,
    mut characters: Query<&mut CharacterController>,
    mut pickups: Query<&mut Pickup>,
    clock: Res<SimulationClock>,
    mut respawns: ResMut<PickupRespawns>,
    mut collected: EventWriter<PickupCollected>,
) {
    for overlap in overlaps.read() {
        let Ok(mut controller) = characters.get_mut(overlap.character) else {
            continue;
        };
        let mut pickup = pickups.get_mut(overlap.other).ok();

        if !controller.on_trigger_overlap(pickup.as_deref()) {
            continue;
        }

        if let Some(pickup) = pickup.as_mut() {
            pickup.deactivate();
            respawns.schedule(clock.elapsed(), pickup.respawn_delay(), overlap.other);
            debug!(
                "{} collected pickup {}, respawning in {}s",
                overlap.character,
                overlap.other,
                pickup.respawn_delay()
            );
        }
        collected.write(PickupCollected {
            character: overlap.character,
            pickup: overlap.other,
        });
    }
}

/// Reactivate pickups whose respawn delay has elapsed.
pub fn respawn_pickups(
    clock: Res<SimulationClock>,
    mut respawns: ResMut<PickupRespawns>,
    mut pickups: Query<&mut Pickup>,
    mut respawned: EventWriter<PickupRespawned>,
) {
    for entity in respawns.take_due(clock.elapsed()) {
        // Despawned pickups simply drop out of the queue.
        let Ok(mut pickup) = pickups.get_mut(entity) else {
            continue;
        };
        pickup.activate();
        respawned.write(PickupRespawned { pickup: entity });
    }
}
