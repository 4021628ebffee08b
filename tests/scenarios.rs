//! Scenario tests for the motion controller.
//!
//! These tests drive the full plugin through a deterministic in-memory backend.
//! Sensor data is written by hand so every tick's inputs are known exactly.
//! Each test produces PROOF through explicit velocity/position/state checks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use motion_controller::backend::NoOpBackendPlugin;
use motion_controller::prelude::*;

const DT: f32 = 1.0 / 60.0;

/// Body state owned by the test backend. Nothing integrates it.
#[derive(Component, Default)]
struct TestBody {
    velocity: Vec3,
    force: Vec3,
    capsule: Option<CapsuleShape>,
}

struct TestBackend;

impl CharacterPhysicsBackend for TestBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.force += force;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn translate(world: &mut World, entity: Entity, offset: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += offset;
        }
    }

    fn get_capsule(world: &World, entity: Entity) -> Option<CapsuleShape> {
        world.get::<TestBody>(entity).and_then(|b| b.capsule)
    }
}

/// Create a minimal test app with the controller on the test backend.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(MotionControllerPlugin::<TestBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    // Fixed ticks are driven by hand only.
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a character standing at y=1 with a 0.5/0.5 capsule (bottom at y=0).
fn spawn_character(app: &mut App) -> Entity {
    spawn_character_with_config(app, MotionConfig::default())
}

fn spawn_character_with_config(app: &mut App, config: MotionConfig) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_xyz(0.0, 1.0, 0.0),
            MotionController::new(),
            config,
            TestBody {
                capsule: Some(CapsuleShape::default()),
                ..default()
            },
        ))
        .id()
}

/// Run one fixed tick.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        tick(app);
    }
}

/// Report a contact at the feet this tick and every tick after.
fn stand_on(app: &mut App, entity: Entity, body: Option<SupportBody>) {
    let mut sensor = app.world_mut().get_mut::<GroundSensor>(entity).unwrap();
    sensor.contacts = vec![ContactPoint {
        position: Vec3::new(0.0, 0.0, 0.0),
        body,
    }];
    sensor.landing = None;
}

fn lift_off(app: &mut App, entity: Entity) {
    app.world_mut()
        .get_mut::<GroundSensor>(entity)
        .unwrap()
        .clear();
}

fn set_stick(app: &mut App, entity: Entity, stick: Vec2) {
    app.world_mut()
        .get_mut::<MotionInput>(entity)
        .unwrap()
        .set_stick(stick);
}

fn velocity(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<TestBody>(entity).unwrap().velocity
}

fn set_velocity(app: &mut App, entity: Entity, velocity: Vec3) {
    app.world_mut().get_mut::<TestBody>(entity).unwrap().velocity = velocity;
}

fn controller(app: &App, entity: Entity) -> &MotionController {
    app.world().get::<MotionController>(entity).unwrap()
}

// ==================== Grounding ====================

mod grounding {
    use super::*;

    #[test]
    fn contact_at_feet_grounds_character() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        tick(&mut app);

        // PROOF: grounded by contact, ground position recorded
        let controller = controller(&app, character);
        assert!(controller.is_grounded(), "contact below threshold should ground");
        assert_eq!(controller.ground_contact().source, GroundSource::Contact);
        assert_eq!(controller.ground_position(), Vec3::new(0.0, 1.0, 0.0));
        println!("PROOF: state={:?}", controller.state());
    }

    #[test]
    fn side_contact_does_not_ground() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        // Threshold is 0 + 0.5 * 0.9 = 0.45; a contact at the capsule's equator is a wall.
        app.world_mut()
            .get_mut::<GroundSensor>(character)
            .unwrap()
            .contacts = vec![ContactPoint::fixed(Vec3::new(0.5, 1.0, 0.0))];
        tick(&mut app);

        assert!(controller(&app, character).is_airborne());
    }

    #[test]
    fn grounding_is_lost_when_contact_ends() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        tick(&mut app);
        assert!(controller(&app, character).is_grounded());

        lift_off(&mut app, character);
        tick(&mut app);

        // PROOF: no contact this tick means airborne, no hysteresis
        assert!(controller(&app, character).is_airborne());
    }

    #[test]
    fn predicted_landing_grounds_character() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        app.world_mut()
            .get_mut::<GroundSensor>(character)
            .unwrap()
            .landing = Some(CollisionData::new(1.05, Vec3::Y, Vec3::ZERO, None));
        tick(&mut app);

        let controller = controller(&app, character);
        assert!(controller.is_grounded());
        assert_eq!(controller.ground_contact().source, GroundSource::Predicted);
    }

    #[test]
    fn gravity_is_applied_every_tick_outside_climbing() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        run_ticks(&mut app, 3);

        // PROOF: three ticks of simulated gravity reached the backend
        let force = app.world().get::<TestBody>(character).unwrap().force;
        assert!((force.y + 3.0 * 20.0).abs() < 1e-4, "force={force}");
    }

    #[test]
    fn state_markers_follow_state() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        tick(&mut app);
        app.update();
        assert!(app.world().get::<Grounded>(character).is_some());
        assert!(app.world().get::<Airborne>(character).is_none());

        lift_off(&mut app, character);
        tick(&mut app);
        app.update();
        assert!(app.world().get::<Airborne>(character).is_some());
        assert!(app.world().get::<Grounded>(character).is_none());
    }
}

// ==================== Jumping ====================

mod jumping {
    use super::*;

    #[test]
    fn jump_waits_for_ground_dwell() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        let config = MotionConfig::default();

        stand_on(&mut app, character, None);
        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_jump_held(true);

        // Landing tick plus 11 grounded ticks stays below the 0.2 s dwell.
        run_ticks(&mut app, 12);
        assert_eq!(velocity(&app, character).y, 0.0, "jumped before dwell elapsed");

        run_ticks(&mut app, 2);

        // PROOF: launched with jump_speed once the dwell passed
        let v = velocity(&app, character);
        assert!((v.y - config.jump_speed).abs() < 1e-5, "v={v}");
        println!("PROOF: jump launched, vy={}", v.y);
    }

    #[test]
    fn jump_tick_plans_as_airborne() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        run_ticks(&mut app, 20);

        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_jump_held(true);
        tick(&mut app);

        let controller = controller(&app, character);
        assert!(controller.jumped());
        assert!(controller.is_airborne());
        assert_eq!(controller.time_grounded(), 0.0);
    }

    #[test]
    fn momentum_carries_into_air_control() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        run_ticks(&mut app, 20);

        set_velocity(&mut app, character, Vec3::new(4.0, 0.0, 0.0));
        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_jump_held(true);
        tick(&mut app);

        // Launch keeps horizontal velocity and retains 80% as momentum.
        assert!(velocity(&app, character).abs_diff_eq(Vec3::new(4.0, 6.0, 0.0), 1e-5));
        assert!(controller(&app, character)
            .jump_momentum()
            .abs_diff_eq(Vec3::new(3.2, 0.0, 0.0), 1e-5));

        // In the air, stick forward: desired = (0, 0, -6) * 0.3 + momentum.
        lift_off(&mut app, character);
        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_jump_held(false);
        set_stick(&mut app, character, Vec2::Y);
        tick(&mut app);

        // PROOF: change (-0.8, 0, -1.8) is within the air clamp of 3
        let v = velocity(&app, character);
        assert!(v.abs_diff_eq(Vec3::new(3.2, 6.0, -1.8), 1e-4), "v={v}");
    }
}

// ==================== Movement ====================

mod movement {
    use super::*;

    #[test]
    fn stick_forward_moves_along_camera_forward() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        set_stick(&mut app, character, Vec2::Y);
        tick(&mut app);

        // PROOF: default camera looks down -Z, run speed 6
        let v = velocity(&app, character);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.0, -6.0), 1e-4), "v={v}");
        assert!(controller(&app, character)
            .facing_direction()
            .abs_diff_eq(Vec3::NEG_Z, 1e-4));
    }

    #[test]
    fn linked_camera_rotates_input() {
        let mut app = create_test_app();
        let camera = app
            .world_mut()
            .spawn(GlobalTransform::from(Transform::default().looking_to(Vec3::X, Vec3::Y)))
            .id();
        let character = spawn_character(&mut app);
        app.world_mut().entity_mut(character).insert(CameraLink(camera));

        stand_on(&mut app, character, None);
        set_stick(&mut app, character, Vec2::Y);
        tick(&mut app);

        // PROOF: forward on the stick is the camera's +X heading
        let v = velocity(&app, character);
        assert!(v.abs_diff_eq(Vec3::new(6.0, 0.0, 0.0), 1e-4), "v={v}");
    }

    #[test]
    fn ground_change_is_clamped_per_tick() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        set_velocity(&mut app, character, Vec3::new(0.0, 0.0, 8.0));
        set_stick(&mut app, character, Vec2::Y);
        tick(&mut app);

        // Desired -6, current +8: the change of -14 is clamped to -10.
        let v = velocity(&app, character);
        assert!((v.z + 2.0).abs() < 1e-4, "v={v}");
    }

    #[test]
    fn idle_on_ground_slows_down() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        set_velocity(&mut app, character, Vec3::new(5.0, 0.0, 0.0));
        tick(&mut app);

        let v = velocity(&app, character);
        assert!((v.x - 4.0).abs() < 1e-5, "v={v}");
        assert!(!controller(&app, character).is_moving());
    }

    #[test]
    fn kinematic_platform_velocity_is_added() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        let platform = app.world_mut().spawn_empty().id();

        stand_on(
            &mut app,
            character,
            Some(SupportBody {
                entity: platform,
                kind: BodyKind::Kinematic,
                velocity: Vec3::new(2.0, 0.0, 0.0),
                translation: Vec3::new(0.0, -0.5, 0.0),
            }),
        );
        set_stick(&mut app, character, Vec2::Y);
        tick(&mut app);

        // PROOF: motion is platform-relative
        let v = velocity(&app, character);
        assert!(v.abs_diff_eq(Vec3::new(2.0, 0.0, -6.0), 1e-4), "v={v}");

        let support = controller(&app, character).ground_contact().support.unwrap();
        assert_eq!(support.body, platform);
        assert!(support.offset.abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-6));
    }

    #[test]
    fn dynamic_support_lends_no_velocity() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        let crate_body = app.world_mut().spawn_empty().id();

        stand_on(
            &mut app,
            character,
            Some(SupportBody {
                entity: crate_body,
                kind: BodyKind::Dynamic,
                velocity: Vec3::new(3.0, 0.0, 0.0),
                translation: Vec3::ZERO,
            }),
        );
        tick(&mut app);

        assert_eq!(
            controller(&app, character).ground_contact().support_velocity,
            Vec3::ZERO
        );
    }
}

// ==================== Avoidance ====================

mod avoidance {
    use super::*;

    #[test]
    fn airborne_wall_drops_horizontal_velocity() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        set_velocity(&mut app, character, Vec3::new(5.0, -1.0, 0.0));
        app.world_mut().get_mut::<WallSensor>(character).unwrap().hit =
            Some(CollisionData::new(1.0, Vec3::NEG_X, Vec3::new(2.0, 1.0, 0.0), None));
        tick(&mut app);

        // PROOF: only the vertical component survives
        assert_eq!(velocity(&app, character), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(controller(&app, character).velocity(), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn grounded_ignores_wall_probe() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        stand_on(&mut app, character, None);
        set_stick(&mut app, character, Vec2::Y);
        app.world_mut().get_mut::<WallSensor>(character).unwrap().hit =
            Some(CollisionData::new(1.0, Vec3::Z, Vec3::new(0.0, 1.0, -1.0), None));
        tick(&mut app);

        assert!(velocity(&app, character).z < -5.9);
    }
}

// ==================== Climbing ====================

mod climbing {
    use super::*;

    #[test]
    fn climbing_translates_and_suppresses_gravity() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        let config = MotionConfig::default();

        set_velocity(&mut app, character, Vec3::new(1.0, -3.0, 0.0));
        app.world_mut()
            .get_mut::<MotionController>(character)
            .unwrap()
            .set_climb_mode(true);
        set_stick(&mut app, character, Vec2::Y);
        run_ticks(&mut app, 10);

        // PROOF: velocity held at zero, position moved by climb speed
        let body = app.world().get::<TestBody>(character).unwrap();
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.force, Vec3::ZERO);
        let y = app.world().get::<Transform>(character).unwrap().translation.y;
        assert!((y - (1.0 + 10.0 * config.climb_speed * DT)).abs() < 1e-4, "y={y}");

        app.update();
        assert!(app.world().get::<Climbing>(character).is_some());
        let signals = app.world().get::<AnimationSignals>(character).unwrap();
        assert!(signals.is_climbing);
        assert_eq!(signals.horizontal_speed, 0.0);
    }

    #[test]
    fn climbing_down_onto_ground_exits() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        app.world_mut()
            .get_mut::<MotionController>(character)
            .unwrap()
            .set_climb_mode(true);
        tick(&mut app);
        assert!(controller(&app, character).is_climbing());

        stand_on(&mut app, character, None);
        set_stick(&mut app, character, Vec2::NEG_Y);
        set_velocity(&mut app, character, Vec3::new(0.0, -1.0, 0.5));
        tick(&mut app);

        let controller = controller(&app, character);
        assert!(controller.is_grounded());
        assert!(!controller.is_moving());
        assert_eq!(velocity(&app, character), Vec3::ZERO);
        assert_eq!(app.world().get::<TestBody>(character).unwrap().force, Vec3::ZERO);
    }
}

// ==================== Actions ====================

mod actions {
    use super::*;

    fn equip_counter(app: &mut App, entity: Entity) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        app.world_mut()
            .entity_mut(entity)
            .insert(ActionSlot::new(move |_: Entity| {
                counter.fetch_add(1, Ordering::Relaxed);
            }));
        count
    }

    #[test]
    fn held_action_fires_each_tick() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        let count = equip_counter(&mut app, character);

        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_action_held(true);
        run_ticks(&mut app, 3);

        assert_eq!(count.load(Ordering::Relaxed), 3);
        assert!(controller(&app, character).is_attacking());
    }

    #[test]
    fn climbing_suppresses_action() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        let count = equip_counter(&mut app, character);

        app.world_mut()
            .get_mut::<MotionController>(character)
            .unwrap()
            .set_climb_mode(true);
        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_action_held(true);
        tick(&mut app);

        assert_eq!(count.load(Ordering::Relaxed), 0);
        assert!(!controller(&app, character).is_attacking());
    }

    #[test]
    fn missing_action_is_inert() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);

        app.world_mut()
            .get_mut::<MotionInput>(character)
            .unwrap()
            .set_action_held(true);
        tick(&mut app);

        assert!(!controller(&app, character).is_attacking());
    }
}

// ==================== Configuration ====================

mod configuration {
    use super::*;

    #[test]
    fn invalid_config_leaves_controller_inert() {
        let mut app = create_test_app();
        let character =
            spawn_character_with_config(&mut app, MotionConfig::default().with_run_speed(-1.0));

        stand_on(&mut app, character, None);
        set_stick(&mut app, character, Vec2::Y);
        run_ticks(&mut app, 3);

        // PROOF: faulted, nothing was written to the body
        let controller = controller(&app, character);
        assert!(matches!(
            controller.fault(),
            Some(ConfigError::NonPositive { name: "run_speed", .. })
        ));
        assert_eq!(velocity(&app, character), Vec3::ZERO);
        assert_eq!(app.world().get::<TestBody>(character).unwrap().force, Vec3::ZERO);
    }

    #[test]
    fn missing_collider_is_reported() {
        let mut app = create_test_app();
        let character = spawn_character(&mut app);
        app.world_mut().get_mut::<TestBody>(character).unwrap().capsule = None;

        tick(&mut app);

        assert_eq!(
            controller(&app, character).fault(),
            Some(&ConfigError::MissingCollider)
        );
    }
}
