//! Integration tests for the platformer controller.
//!
//! These tests run the full plugin schedule against a small in-memory physics
//! backend: a flat floor, an optional wall and an optional ceiling. Each test
//! produces PROOF through explicit position/velocity/marker checks.

use bevy::prelude::*;
use platformer_controller::prelude::*;
use platformer_controller::systems::update_probes;

const DT: f32 = 1.0 / 60.0;
const HALF_HEIGHT: f32 = 0.5;
const HALF_WIDTH: f32 = 0.4;

// ==================== Mock Backend ====================

/// Body state owned by the mock physics world.
#[derive(Component, Debug, Default, Clone, Copy)]
struct MockBody {
    position: Vec2,
    velocity: Vec2,
    force: Vec2,
    constraint: Option<(Vec2, f32)>,
}

/// Level geometry answering the controller's probes.
#[derive(Resource, Debug, Clone, Copy)]
struct Level {
    floor: f32,
    wall_x: Option<f32>,
    ceiling: Option<f32>,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            floor: 0.0,
            wall_x: None,
            ceiling: None,
        }
    }
}

impl SpatialQuery for Level {
    fn overlap_box(&self, probe: ProbeBox, _filter: ProbeFilter) -> bool {
        probe.min().y <= self.floor
    }

    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        _filter: ProbeFilter,
    ) -> Option<RayHit> {
        let mut best: Option<f32> = None;
        let mut consider = |t: f32| {
            if (0.0..=max_distance).contains(&t) && best.is_none_or(|b| t < b) {
                best = Some(t);
            }
        };
        if let Some(wall_x) = self.wall_x {
            if direction.x != 0.0 {
                consider((wall_x - origin.x) / direction.x);
            }
        }
        if let Some(ceiling) = self.ceiling {
            if direction.y != 0.0 {
                consider((ceiling - origin.y) / direction.y);
            }
        }
        best.map(|t| RayHit::new(t, origin + direction * t, None))
    }
}

struct MockBackend;

impl PlatformerPhysicsBackend for MockBackend {
    fn plugin() -> impl Plugin {
        MockBackendPlugin
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<MockBody>(entity)
            .map(|b| b.position)
            .unwrap_or(Vec2::ZERO)
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<MockBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.force += force;
        }
    }

    fn enable_distance_constraint(world: &mut World, entity: Entity, anchor: Vec2, distance: f32) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.constraint = Some((anchor, distance));
        }
    }

    fn disable_distance_constraint(world: &mut World, entity: Entity) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            body.constraint = None;
        }
    }

    fn set_constraint_distance(world: &mut World, entity: Entity, distance: f32) {
        if let Some(mut body) = world.get_mut::<MockBody>(entity) {
            if let Some((_, current)) = body.constraint.as_mut() {
                *current = distance;
            }
        }
    }
}

struct MockBackendPlugin;

impl Plugin for MockBackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Level>();
        app.add_systems(
            FixedUpdate,
            clear_forces.in_set(PlatformerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            update_probes::<MockBackend, Level>.in_set(PlatformerSet::Sensors),
        );
        app.add_systems(FixedUpdate, integrate.in_set(PlatformerSet::Finalize));
    }
}

fn clear_forces(mut q: Query<&mut MockBody>) {
    for mut body in &mut q {
        body.force = Vec2::ZERO;
    }
}

/// Move bodies by their velocity, then resolve the floor, the wall and the
/// distance constraint.
fn integrate(level: Res<Level>, mut q: Query<&mut MockBody>) {
    for mut body in &mut q {
        let velocity = body.velocity;
        body.position += velocity * DT;

        if body.position.y < level.floor + HALF_HEIGHT {
            body.position.y = level.floor + HALF_HEIGHT;
            body.velocity.y = body.velocity.y.max(0.0);
        }
        if let Some(wall_x) = level.wall_x {
            if body.position.x > wall_x - HALF_WIDTH {
                body.position.x = wall_x - HALF_WIDTH;
                body.velocity.x = body.velocity.x.min(0.0);
            }
        }
        if let Some((anchor, distance)) = body.constraint {
            let radial = (body.position - anchor).normalize_or_zero();
            body.position = anchor + radial * distance;
            let outward = body.velocity.dot(radial);
            body.velocity -= radial * outward;
        }
    }
}

// ==================== Helpers ====================

fn create_test_app(level: Level) -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(PlatformerControllerPlugin::<MockBackend>::default());
    app.insert_resource(level);

    app.finish();
    app.cleanup();
    app
}

fn spawn_character(app: &mut App, position: Vec2) -> Entity {
    spawn_character_with_config(app, position, CharacterConfig::default())
}

fn spawn_character_with_config(app: &mut App, position: Vec2, config: CharacterConfig) -> Entity {
    app.world_mut()
        .spawn((
            CharacterController::new(config).unwrap(),
            MockBody {
                position,
                ..default()
            },
        ))
        .id()
}

/// Run one fixed step.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn controller(app: &App, entity: Entity) -> &CharacterController {
    app.world().get::<CharacterController>(entity).unwrap()
}

fn body(app: &App, entity: Entity) -> MockBody {
    *app.world().get::<MockBody>(entity).unwrap()
}

fn intent(app: &mut App, entity: Entity) -> Mut<'_, ControlIntent> {
    app.world_mut().get_mut::<ControlIntent>(entity).unwrap()
}

fn standing(app: &mut App) -> Entity {
    spawn_character(app, Vec2::new(0.0, HALF_HEIGHT))
}

// ==================== Ground Detection Tests ====================

mod ground_detection {
    use super::*;

    #[test]
    fn standing_character_is_grounded_and_idle() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);

        tick(&mut app);

        let c = controller(&app, character);
        println!(
            "PROOF: grounded={}, behavior={:?}, velocity={:?}",
            c.is_grounded(),
            c.behavior(),
            c.velocity()
        );
        assert!(c.is_grounded());
        assert_eq!(c.behavior(), BehaviorState::Idle);
        assert_eq!(body(&app, character).velocity, Vec2::ZERO);
        assert!(app.world().get::<Grounded>(character).is_some());
        assert!(app.world().get::<Airborne>(character).is_none());
    }

    #[test]
    fn character_in_the_air_is_airborne_and_jumping() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 10.0));

        tick(&mut app);

        let c = controller(&app, character);
        assert!(!c.is_grounded());
        assert_eq!(c.behavior(), BehaviorState::Jumping);
        assert!(app.world().get::<Airborne>(character).is_some());
        assert!(app.world().get::<Grounded>(character).is_none());
        assert!(body(&app, character).velocity.y < 0.0);
    }

    #[test]
    fn falling_character_lands() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 5.0));

        run_frames(&mut app, 120);

        let c = controller(&app, character);
        println!(
            "PROOF: position={:?}, behavior={:?}",
            body(&app, character).position,
            c.behavior()
        );
        assert!(c.is_grounded());
        assert_eq!(c.behavior(), BehaviorState::Idle);
        // Grounded as soon as the probe box touches the floor.
        let y = body(&app, character).position.y;
        assert!(y >= HALF_HEIGHT && y <= HALF_HEIGHT + 0.06);
    }

    #[test]
    fn fall_speed_is_capped() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 500.0));

        run_frames(&mut app, 120);

        let velocity = body(&app, character).velocity;
        assert!(!controller(&app, character).is_grounded());
        assert!((velocity.y - -20.0).abs() < 1e-4);
    }
}

// ==================== Walking Tests ====================

mod walking {
    use super::*;

    #[test]
    fn walking_reaches_max_speed() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);

        intent(&mut app, character).set_axis(Vec2::X);
        tick(&mut app);
        let first = body(&app, character).velocity.x;
        // 20 u/s² for one 1/60 s step
        assert!((first - 20.0 * DT).abs() < 1e-4);

        run_frames(&mut app, 30);
        let c = controller(&app, character);
        assert_eq!(c.velocity().x, 5.0);
        assert_eq!(c.behavior(), BehaviorState::Walking);
        assert!(body(&app, character).position.x > 0.0);
    }

    #[test]
    fn releasing_input_decelerates_to_idle() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);

        intent(&mut app, character).set_axis(Vec2::X);
        run_frames(&mut app, 30);
        intent(&mut app, character).set_axis(Vec2::ZERO);
        run_frames(&mut app, 20);

        let c = controller(&app, character);
        assert_eq!(c.velocity().x, 0.0);
        assert_eq!(c.behavior(), BehaviorState::Idle);
        assert_eq!(c.facing(), Facing::Right);
    }

    #[test]
    fn behavior_changes_are_reported() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);

        intent(&mut app, character).set_axis(Vec2::NEG_X);
        run_frames(&mut app, 3);

        let events: Vec<BehaviorChanged> = app
            .world()
            .resource::<Events<BehaviorChanged>>()
            .iter_current_update_events()
            .copied()
            .collect();
        println!("PROOF: events={events:?}");
        assert_eq!(
            events,
            vec![BehaviorChanged {
                entity: character,
                previous: BehaviorState::Idle,
                current: BehaviorState::Walking,
            }]
        );
        assert_eq!(controller(&app, character).facing(), Facing::Left);
    }
}

// ==================== Jump Tests ====================

mod jumping {
    use super::*;

    #[test]
    fn jump_reaches_apex_height() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);

        intent(&mut app, character).set_jump(true);
        tick(&mut app);
        intent(&mut app, character).set_jump(false);

        let mut max_y = body(&app, character).position.y;
        for _ in 0..90 {
            tick(&mut app);
            max_y = max_y.max(body(&app, character).position.y);
        }

        let height = max_y - HALF_HEIGHT;
        println!("PROOF: apex height={height}");
        assert!((height - 3.0).abs() < 0.25);
        assert!(controller(&app, character).is_grounded());
    }

    #[test]
    fn jump_requires_ground() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 10.0));

        intent(&mut app, character).set_jump(true);
        tick(&mut app);

        assert!(body(&app, character).velocity.y < 0.0);
    }
}

// ==================== Wall Tests ====================

mod walls {
    use super::*;

    fn wall_level() -> Level {
        Level {
            wall_x: Some(2.0),
            ..default()
        }
    }

    #[test]
    fn touching_wall_marker_records_side() {
        let mut app = create_test_app(wall_level());
        let character = spawn_character(&mut app, Vec2::new(1.6, HALF_HEIGHT));

        tick(&mut app);

        let wall = app.world().get::<TouchingWall>(character).copied();
        println!("PROOF: wall={wall:?}");
        assert!(controller(&app, character).is_touching_wall());
        assert!(wall.is_some_and(|w| w.is_right()));
    }

    #[test]
    fn turning_away_keeps_the_sensed_wall_side() {
        let mut app = create_test_app(wall_level());
        let character = spawn_character(&mut app, Vec2::new(1.6, HALF_HEIGHT));
        tick(&mut app);

        intent(&mut app, character).set_axis(Vec2::NEG_X);
        tick(&mut app);

        let wall = app.world().get::<TouchingWall>(character).copied();
        let controller = controller(&app, character);
        println!(
            "PROOF: facing={:?} touching={} wall={wall:?}",
            controller.facing(),
            controller.is_touching_wall()
        );
        assert_eq!(controller.facing(), Facing::Left);
        assert!(controller.is_touching_wall());
        assert!(wall.is_some_and(|w| w.is_right()));

        tick(&mut app);
        assert!(app.world().get::<TouchingWall>(character).is_none());
    }

    #[test]
    fn wall_slide_limits_fall_speed() {
        let mut app = create_test_app(wall_level());
        let character = spawn_character(&mut app, Vec2::new(1.6, 50.0));

        run_frames(&mut app, 60);

        let velocity = body(&app, character).velocity;
        println!("PROOF: sliding velocity={velocity:?}");
        assert!(controller(&app, character).is_touching_wall());
        assert!(velocity.y >= -2.0 - 1e-5);
        assert!(velocity.y < 0.0);
    }

    #[test]
    fn wall_jump_pushes_away_from_wall() {
        let mut app = create_test_app(wall_level());
        let character = spawn_character(&mut app, Vec2::new(1.6, 50.0));
        run_frames(&mut app, 5);

        intent(&mut app, character).set_jump(true);
        tick(&mut app);

        let velocity = body(&app, character).velocity;
        println!("PROOF: wall jump velocity={velocity:?}");
        assert!(velocity.x < 0.0);
        assert!(velocity.y > 0.0);
    }
}

// ==================== Dash Tests ====================

mod dashing {
    use super::*;

    #[test]
    fn dash_spends_a_charge_in_the_air() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 50.0));

        intent(&mut app, character).set_dash(true);
        tick(&mut app);

        let c = controller(&app, character);
        assert!(c.is_dashing());
        assert_eq!(c.remaining_dash_charges(), 0);
        assert_eq!(body(&app, character).velocity, Vec2::new(25.0, 0.0));
        assert!(app.world().get::<Dashing>(character).is_some());
    }

    #[test]
    fn dash_covers_dash_distance() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 50.0));

        intent(&mut app, character).set_dash(true);
        let mut ticks = 0;
        loop {
            tick(&mut app);
            ticks += 1;
            if !controller(&app, character).is_dashing() || ticks > 100 {
                break;
            }
        }

        let position = body(&app, character).position;
        println!("PROOF: dash ticks={ticks}, position={position:?}");
        assert_eq!(ticks, 12);
        assert!((position.x - 5.0).abs() < 1e-3);
        assert!((position.y - 50.0).abs() < 1e-3);
        assert!(app.world().get::<Dashing>(character).is_none());
    }

    #[test]
    fn no_dash_without_charges() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 100.0));

        intent(&mut app, character).set_dash(true);
        run_frames(&mut app, 20);
        intent(&mut app, character).set_dash(false);
        tick(&mut app);
        intent(&mut app, character).set_dash(true);
        tick(&mut app);

        assert!(!controller(&app, character).is_dashing());
    }

    #[test]
    fn landing_refills_charges() {
        let mut app = create_test_app(Level::default());
        let character = spawn_character(&mut app, Vec2::new(0.0, 2.0));

        intent(&mut app, character).set_axis(Vec2::new(0.0, -1.0));
        intent(&mut app, character).set_dash(true);
        tick(&mut app);
        assert_eq!(controller(&app, character).remaining_dash_charges(), 0);

        run_frames(&mut app, 60);
        assert_eq!(controller(&app, character).remaining_dash_charges(), 1);
    }
}

// ==================== Pickup Tests ====================

mod pickups {
    use super::*;

    fn dashed_character(app: &mut App) -> Entity {
        let character = spawn_character(app, Vec2::new(0.0, 500.0));
        intent(app, character).set_dash(true);
        tick(app);
        intent(app, character).set_dash(false);
        character
    }

    #[test]
    fn pickup_refills_and_respawns() {
        let mut app = create_test_app(Level::default());
        let character = dashed_character(&mut app);
        let pickup = app.world_mut().spawn(Pickup::default()).id();
        assert_eq!(controller(&app, character).remaining_dash_charges(), 0);

        app.world_mut().send_event(TriggerOverlap {
            character,
            other: pickup,
        });
        tick(&mut app);

        println!(
            "PROOF: charges={}, pickup active={}",
            controller(&app, character).remaining_dash_charges(),
            app.world().get::<Pickup>(pickup).unwrap().is_active()
        );
        assert_eq!(controller(&app, character).remaining_dash_charges(), 1);
        assert!(!app.world().get::<Pickup>(pickup).unwrap().is_active());
        let collected = app.world().resource::<Events<PickupCollected>>();
        assert_eq!(collected.len(), 1);

        run_frames(&mut app, 170);
        assert!(!app.world().get::<Pickup>(pickup).unwrap().is_active());

        run_frames(&mut app, 15);
        assert!(app.world().get::<Pickup>(pickup).unwrap().is_active());
        let respawned = app.world().resource::<Events<PickupRespawned>>();
        assert_eq!(respawned.len(), 1);
    }

    #[test]
    fn inactive_pickup_is_ignored() {
        let mut app = create_test_app(Level::default());
        let character = dashed_character(&mut app);
        let mut inactive = Pickup::default();
        inactive.deactivate();
        let pickup = app.world_mut().spawn(inactive).id();

        app.world_mut().send_event(TriggerOverlap {
            character,
            other: pickup,
        });
        tick(&mut app);

        assert_eq!(controller(&app, character).remaining_dash_charges(), 0);
        assert!(app.world().resource::<Events<PickupCollected>>().is_empty());
    }

    #[test]
    fn overlap_with_non_pickup_is_ignored() {
        let mut app = create_test_app(Level::default());
        let character = dashed_character(&mut app);
        let rock = app.world_mut().spawn(Transform::default()).id();

        app.world_mut().send_event(TriggerOverlap {
            character,
            other: rock,
        });
        tick(&mut app);

        assert_eq!(controller(&app, character).remaining_dash_charges(), 0);
    }
}

// ==================== Grapple Tests ====================

mod grapple {
    use super::*;

    fn ceiling_level() -> Level {
        Level {
            ceiling: Some(8.0),
            ..default()
        }
    }

    fn hanging_character(app: &mut App) -> Entity {
        let character = spawn_character(app, Vec2::new(0.0, 3.0));
        {
            let mut intent = intent(app, character);
            intent.set_aim(Vec2::Y);
            intent.set_grapple(true);
        }
        tick(app);
        character
    }

    #[test]
    fn grapple_engages_on_ceiling_hit() {
        let mut app = create_test_app(ceiling_level());
        let character = hanging_character(&mut app);

        let b = body(&app, character);
        let rope = *app.world().get::<RopeVisual>(character).unwrap();
        println!("PROOF: constraint={:?}, rope={rope:?}", b.constraint);

        let (anchor, distance) = b.constraint.unwrap();
        assert_eq!(anchor, Vec2::new(0.0, 8.0));
        assert!((distance - 5.0).abs() < 1e-4);
        assert!(controller(&app, character).is_grappling());
        assert!(rope.visible);
        assert_eq!(rope.end, anchor);
        assert_eq!(
            app.world().get::<Grappling>(character).map(|g| g.anchor),
            Some(anchor)
        );
    }

    #[test]
    fn grapple_misses_out_of_range() {
        let mut app = create_test_app(Level {
            ceiling: Some(30.0),
            ..default()
        });
        let character = hanging_character(&mut app);

        assert!(body(&app, character).constraint.is_none());
        assert!(!controller(&app, character).is_grappling());
        assert!(!app.world().get::<RopeVisual>(character).unwrap().visible);
    }

    #[test]
    fn reeling_in_shortens_the_tether() {
        let mut app = create_test_app(ceiling_level());
        let character = hanging_character(&mut app);

        intent(&mut app, character).set_reel(true, false);
        run_frames(&mut app, 30);

        let (_, distance) = body(&app, character).constraint.unwrap();
        println!("PROOF: tether length after reel in={distance}");
        assert!(distance < 4.0);
        assert!(distance >= 1.0);
        assert!(body(&app, character).force.y > 0.0);
    }

    #[test]
    fn swing_input_applies_lateral_force() {
        let mut app = create_test_app(ceiling_level());
        let character = hanging_character(&mut app);

        intent(&mut app, character).set_axis(Vec2::X);
        tick(&mut app);

        assert_eq!(body(&app, character).force, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn releasing_grapple_removes_constraint_and_rope() {
        let mut app = create_test_app(ceiling_level());
        let character = hanging_character(&mut app);

        intent(&mut app, character).set_grapple(false);
        tick(&mut app);

        assert!(body(&app, character).constraint.is_none());
        assert!(!controller(&app, character).is_grappling());
        assert!(!app.world().get::<RopeVisual>(character).unwrap().visible);
        assert!(app.world().get::<Grappling>(character).is_none());
    }
}

// ==================== Death Tests ====================

mod death {
    use super::*;

    #[test]
    fn killed_character_is_dead_for_good() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);
        tick(&mut app);

        app.world_mut()
            .get_mut::<CharacterController>(character)
            .unwrap()
            .kill();
        intent(&mut app, character).set_axis(Vec2::X);
        run_frames(&mut app, 10);

        assert_eq!(controller(&app, character).behavior(), BehaviorState::Dead);
        assert!(app.world().get::<Dead>(character).is_some());
    }

    #[test]
    fn replacing_the_controller_clears_the_dead_marker() {
        let mut app = create_test_app(Level::default());
        let character = standing(&mut app);

        app.world_mut()
            .get_mut::<CharacterController>(character)
            .unwrap()
            .kill();
        tick(&mut app);
        assert!(app.world().get::<Dead>(character).is_some());

        app.world_mut()
            .entity_mut(character)
            .insert(CharacterController::new(CharacterConfig::default()).unwrap());
        run_frames(&mut app, 3);

        let dead = app.world().get::<Dead>(character).is_some();
        println!(
            "PROOF: is_dead={} dead marker={dead}",
            controller(&app, character).is_dead()
        );
        assert!(!controller(&app, character).is_dead());
        assert!(!dead);
        assert_ne!(controller(&app, character).behavior(), BehaviorState::Dead);
    }
}
