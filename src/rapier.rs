//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::avoidance::{WallSensor, predict_wall_contact};
use crate::backend::CharacterPhysicsBackend;
use crate::collision::{BodyKind, CollisionData, ContactPoint, SupportBody};
use crate::config::{CapsuleShape, MotionConfig};
use crate::controller::MotionController;
use crate::detection::{GroundSensor, Ray, predict_landing};
use crate::{BackendSensors, MotionControllerSet};

/// Rapier3D physics backend for the motion controller.
///
/// This backend uses `bevy_rapier3d` for velocity and force access. Contact
/// gathering and raycasting are handled by dedicated Rapier systems that
/// receive `RapierContext` as a system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        // Accumulate on the controller; handed to ExternalForce by apply_controller_forces.
        if let Some(mut controller) = world.get_mut::<MotionController>(entity) {
            controller.add_force(force);
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation())
            })
            .unwrap_or(Vec3::ZERO)
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .or_else(|| {
                world.get::<GlobalTransform>(entity).map(|t| {
                    let (_, rotation, _) = t.to_scale_rotation_translation();
                    rotation
                })
            })
            .unwrap_or(Quat::IDENTITY)
    }

    fn translate(world: &mut World, entity: Entity, offset: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += offset;
        }
    }

    fn get_capsule(world: &World, entity: Entity) -> Option<CapsuleShape> {
        world.get::<Collider>(entity).and_then(collider_capsule)
    }
}

/// Plugin that sets up Rapier3D-specific systems for the motion controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        // Phase 1: Preparation - Clear forces from previous tick, classify new bodies
        app.add_systems(
            FixedUpdate,
            (clear_controller_forces, tag_body_kinds).in_set(MotionControllerSet::Preparation),
        );

        // Phase 2: Sensors - contacts and the landing ray
        app.add_systems(
            FixedUpdate,
            rapier_ground_sensors
                .in_set(MotionControllerSet::Sensors)
                .in_set(BackendSensors),
        );

        // Phase 5: Probes - wall ray along the planned velocity
        app.add_systems(
            FixedUpdate,
            rapier_wall_probes.in_set(MotionControllerSet::Probes),
        );

        // Phase 8: Final Application - Apply accumulated forces to physics
        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(MotionControllerSet::FinalApplication),
        );
    }
}

/// Capsule dimensions of a Rapier collider, if it is a capsule.
pub fn collider_capsule(collider: &Collider) -> Option<CapsuleShape> {
    let capsule = collider.as_capsule()?;
    // For capsule_y(half_height, radius) the segment endpoints are at y = ±half_height
    let segment = capsule.segment();
    let half_height = (segment.a() - segment.b()).length() / 2.0;
    Some(CapsuleShape {
        radius: capsule.radius(),
        half_height,
    })
}

/// Map a Rapier rigid body type onto the controller's [`BodyKind`].
pub fn body_kind(body: &RigidBody) -> BodyKind {
    match body {
        RigidBody::Fixed => BodyKind::Static,
        RigidBody::KinematicPositionBased | RigidBody::KinematicVelocityBased => {
            BodyKind::Kinematic
        }
        RigidBody::Dynamic => BodyKind::Dynamic,
    }
}

/// Tag bodies with their [`BodyKind`] when they are registered or change type.
pub fn tag_body_kinds(
    mut commands: Commands,
    q_bodies: Query<(Entity, &RigidBody), Changed<RigidBody>>,
) {
    for (entity, body) in &q_bodies {
        commands.entity(entity).insert(body_kind(body));
    }
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(
    context: &RapierContext,
    ray: &Ray,
    exclude_entity: Entity,
) -> Option<CollisionData> {
    // Create filter to exclude the casting entity
    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors();

    context
        .cast_ray_and_get_normal(
            ray.origin,
            ray.direction.as_vec3(),
            ray.max_distance,
            true, // solid = true for solid hits
            filter,
        )
        .map(|(hit_entity, hit)| {
            CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
        })
}

/// Describe the body behind a contact.
fn support_body(
    q_bodies: &Query<(Option<&BodyKind>, Option<&Velocity>, &GlobalTransform)>,
    entity: Entity,
) -> Option<SupportBody> {
    let (kind, velocity, transform) = q_bodies.get(entity).ok()?;
    Some(SupportBody {
        entity,
        kind: kind.copied().unwrap_or_default(),
        velocity: velocity.map(|v| v.linvel).unwrap_or(Vec3::ZERO),
        translation: transform.translation(),
    })
}

/// Fill each character's [`GroundSensor`] from Rapier's contact graph and the
/// predictive landing ray.
fn rapier_ground_sensors(
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    mut q_controllers: Query<(
        Entity,
        &Transform,
        Option<&Velocity>,
        &MotionController,
        &mut GroundSensor,
    )>,
    q_bodies: Query<(Option<&BodyKind>, Option<&Velocity>, &GlobalTransform)>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let dt = time.timestep().as_secs_f32();

    for (entity, transform, velocity, controller, mut sensor) in &mut q_controllers {
        sensor.clear();
        if !controller.is_active() {
            continue;
        }

        for pair in context.contact_pairs_with(entity) {
            if !pair.has_any_active_contact() {
                continue;
            }
            for manifold in pair.manifolds() {
                let other = [manifold.rigid_body1(), manifold.rigid_body2()]
                    .into_iter()
                    .flatten()
                    .find(|&body| body != entity);
                let body = other.and_then(|other| support_body(&q_bodies, other));
                for contact in manifold.solver_contacts() {
                    sensor.contacts.push(ContactPoint {
                        position: contact.point(),
                        body,
                    });
                }
            }
        }

        let velocity = velocity.map(|v| v.linvel).unwrap_or(Vec3::ZERO);
        sensor.landing = predict_landing(
            transform.translation,
            velocity,
            dt,
            controller.capsule().bottom_offset(),
            |ray| rapier_raycast(&context, ray, entity),
        );
    }
}

/// Fill each airborne character's [`WallSensor`] from a ray along its planned
/// horizontal velocity.
fn rapier_wall_probes(
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    mut q_controllers: Query<(
        Entity,
        &Transform,
        &Velocity,
        &MotionConfig,
        &MotionController,
        &mut WallSensor,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let dt = time.timestep().as_secs_f32();

    for (entity, transform, velocity, config, controller, mut sensor) in &mut q_controllers {
        sensor.hit = None;
        if !controller.is_active() || !controller.is_airborne() {
            continue;
        }
        sensor.hit = predict_wall_contact(
            transform.translation,
            velocity.linvel,
            dt,
            config.wall_check_distance,
            |ray| rapier_raycast(&context, ray, entity),
        );
    }
}

/// Remove the force the controller applied last tick.
///
/// This system runs at the START of each tick. It:
/// 1. Subtracts the force we applied last tick from ExternalForce
/// 2. Clears the accumulator for the new tick
///
/// This ensures that external user forces are preserved while our forces
/// are isolated between ticks.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut MotionController)>) {
    for (mut ext_force, mut controller) in &mut q {
        let force_to_subtract = controller.prepare_new_frame();
        ext_force.force -= force_to_subtract;
    }
}

/// Apply controller forces at the end of each tick.
///
/// This system runs AFTER all controller systems. It:
/// 1. Applies the accumulated force to ExternalForce
/// 2. Stores what we applied for next tick's subtraction
pub fn apply_controller_forces(mut q: Query<(&mut ExternalForce, &mut MotionController)>) {
    for (mut ext_force, mut controller) in &mut q {
        let force_to_apply = controller.finalize_frame();
        ext_force.force += force_to_apply;
    }
}

/// Bundle for creating a character with Rapier3D physics.
///
/// This bundle provides the Rapier3D components a motion controller entity
/// needs: a dynamic body with locked rotation, velocity tracking, external
/// force for simulated gravity, and engine gravity switched off.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use motion_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         MotionController::new(),
///         MotionConfig::player(),
///         Rapier3dCharacterBundle::new(),
///         Collider::capsule_y(0.5, 0.5),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], the model turns instead of the body
/// - `gravity_scale`: 0.0, gravity comes from [`MotionConfig::simulated_gravity`]
/// - `damping`: zero, stopping is handled by the controller
/// - `friction`: zero, so ground contact does not fight the planner
/// - `sleeping`: disabled, so contacts are reported every tick
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Accumulated forces. Controller systems add to this.
    pub external_force: ExternalForce,
    pub locked_axes: LockedAxes,
    pub gravity_scale: GravityScale,
    pub damping: Damping,
    pub friction: Friction,
    pub sleeping: Sleeping,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Create a new character bundle with the defaults listed above.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            sleeping: Sleeping::disabled(),
        }
    }

    /// Set the damping coefficients for velocity reduction.
    ///
    /// Linear damping also slows airborne motion, which the controller does
    /// not compensate for.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set the surface friction of the character.
    pub fn with_friction(mut self, coefficient: f32) -> Self {
        self.friction.coefficient = coefficient;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
