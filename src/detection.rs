//! Environment probes.
//!
//! The controller never talks to a physics world directly. Each tick it is
//! fed a [`ProbeResults`] computed by [`sense`] from any [`SpatialQuery`]
//! implementation (the Rapier backend provides one, tests provide mocks).

use bevy::prelude::*;

use crate::config::CharacterConfig;
use crate::controller::CharacterController;
use crate::intent::TickInput;
use crate::state::Facing;

/// Collision group filter for a probe, as (memberships, filters) bit masks.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeFilter {
    pub memberships: u32,
    pub filters: u32,
}

impl ProbeFilter {
    /// Interacts with every group.
    pub const ALL: Self = Self {
        memberships: u32::MAX,
        filters: u32::MAX,
    };

    pub const fn new(memberships: u32, filters: u32) -> Self {
        Self {
            memberships,
            filters,
        }
    }

    /// Whether a collider in `groups` passes this filter.
    pub fn accepts(&self, groups: u32) -> bool {
        self.filters & groups != 0
    }
}

impl Default for ProbeFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// Collision filters used by the three probes of a character.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ProbeFilters {
    pub ground: ProbeFilter,
    pub wall: ProbeFilter,
    pub grapple: ProbeFilter,
}

/// Result of a ray cast.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RayHit {
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if known).
    pub entity: Option<Entity>,
}

impl RayHit {
    /// Create a hit result.
    pub fn new(distance: f32, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            point,
            entity,
        }
    }
}

/// An axis-aligned probe box.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ProbeBox {
    pub center: Vec2,
    /// Full size (not half extents).
    pub size: Vec2,
}

impl ProbeBox {
    /// Ground probe box of a character standing at `position`.
    pub fn ground(config: &CharacterConfig, position: Vec2) -> Self {
        Self {
            center: position + Vec2::NEG_Y * config.ground_probe_offset,
            size: config.ground_probe_size,
        }
    }

    #[inline]
    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_size()
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_size()
    }

    /// Whether this box overlaps another axis-aligned box.
    pub fn overlaps(&self, other: &ProbeBox) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
    }
}

/// Spatial queries a physics world must answer for the controller.
pub trait SpatialQuery {
    /// Whether any collider passing `filter` overlaps the box.
    fn overlap_box(&self, probe: ProbeBox, filter: ProbeFilter) -> bool;

    /// First hit along a ray. `direction` is normalized.
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        filter: ProbeFilter,
    ) -> Option<RayHit>;
}

/// Probe results fed to the controller each tick.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ProbeResults {
    /// Character position read from the physics world.
    pub position: Vec2,
    /// Velocity reported by the physics world. Adopted only while grappling,
    /// so the constraint's redirection of momentum is kept.
    pub body_velocity: Vec2,
    /// Ground probe overlapped something.
    pub grounded: bool,
    /// Wall probe hit something in the facing direction.
    pub touching_wall: bool,
    /// Side the wall probe was cast toward.
    pub wall_side: Facing,
    /// Grapple ray hit, only cast on the tick the grapple is pressed.
    #[reflect(ignore)]
    pub grapple_hit: Option<RayHit>,
}

/// Run the ground, wall and grapple probes for one character.
pub fn sense<Q: SpatialQuery + ?Sized>(
    query: &Q,
    controller: &CharacterController,
    filters: &ProbeFilters,
    position: Vec2,
    body_velocity: Vec2,
    input: &TickInput,
) -> ProbeResults {
    let config = controller.config();

    let grounded = query.overlap_box(ProbeBox::ground(config, position), filters.ground);

    let wall_side = controller.facing();
    let touching_wall = query
        .cast_ray(
            position,
            wall_side.unit(),
            config.wall_probe_distance,
            filters.wall,
        )
        .is_some();

    let grapple_hit = if input.grapple_pressed && !controller.is_grappling() {
        let aim = input.aim.normalize_or_zero();
        if aim == Vec2::ZERO {
            None
        } else {
            query.cast_ray(position, aim, config.grapple_range, filters.grapple)
        }
    } else {
        None
    };

    ProbeResults {
        position,
        body_velocity,
        grounded,
        touching_wall,
        wall_side,
        grapple_hit,
    }
}
