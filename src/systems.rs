//! Core controller systems.
//!
//! The fixed-tick systems move data between the physics backend and
//! [`MotionController`]. They are exclusive and generic over the backend: each
//! one snapshots the components it needs, asks the controller for a decision,
//! then writes the result back through `B`.
//!
//! The frame systems at the bottom only refresh cosmetic outputs.

use bevy::prelude::*;

use crate::action::ActionSlot;
use crate::avoidance::WallSensor;
use crate::backend::CharacterPhysicsBackend;
use crate::collision::CollisionData;
use crate::config::MotionConfig;
use crate::controller::{MotionController, PlanOutcome};
use crate::detection::GroundSensor;
use crate::intent::{CameraFrame, CameraLink, MotionInput};
use crate::presentation::{AnimationSignals, CameraTarget, CharacterModel, camera_target_offset};
use crate::state::{Airborne, Climbing, Grounded, MotionState};

/// Validate configuration and capture the collider shape of new controllers.
///
/// Runs until every controller has been initialized once. A faulted controller
/// is logged and left inert; it is not retried.
pub fn initialize_controllers<B: CharacterPhysicsBackend>(world: &mut World) {
    let pending: Vec<(Entity, MotionConfig)> = world
        .query::<(Entity, &MotionConfig, &MotionController)>()
        .iter(world)
        .filter(|(_, _, controller)| !controller.initialized)
        .map(|(e, config, _)| (e, *config))
        .collect();

    for (entity, config) in pending {
        let capsule = B::get_capsule(world, entity);
        let Some(mut controller) = world.get_mut::<MotionController>(entity) else {
            continue;
        };
        match controller.initialize(&config, capsule) {
            Ok(()) => debug!(
                "motion controller ready on {entity}: capsule {:?}",
                controller.capsule()
            ),
            Err(err) => error!("motion controller on {entity} disabled: {err}"),
        }
    }
}

/// Copy each linked camera's forward vector into its character's [`CameraFrame`].
pub fn sync_camera_frames(
    mut q_characters: Query<(&CameraLink, &mut CameraFrame)>,
    q_cameras: Query<&GlobalTransform>,
) {
    for (link, mut frame) in &mut q_characters {
        if let Ok(camera) = q_cameras.get(link.0) {
            frame.forward = camera.forward().as_vec3();
        }
    }
}

/// Resolve this tick's ground contact from the backend's [`GroundSensor`].
pub fn update_ground_detection<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, MotionConfig)> = world
        .query::<(Entity, &MotionConfig, &MotionController)>()
        .iter(world)
        .filter(|(_, _, controller)| controller.is_active())
        .map(|(e, config, _)| (e, *config))
        .collect();

    let mut query = world.query::<(&GroundSensor, &mut MotionController)>();
    for (entity, config) in entities {
        let position = B::get_position(world, entity);
        if let Ok((sensor, mut controller)) = query.get_mut(world, entity) {
            controller.detect_ground(&config, position, sensor);
        }
    }
}

/// Run the state machine: climb mode, gravity, landing and jumping.
pub fn resolve_transitions<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, MotionConfig, MotionInput)> = world
        .query::<(Entity, &MotionConfig, &MotionInput, &MotionController)>()
        .iter(world)
        .filter(|(_, _, _, controller)| controller.is_active())
        .map(|(e, config, input, _)| (e, *config, input.sanitized()))
        .collect();

    let dt = B::get_fixed_timestep(world);

    for (entity, config, input) in entities {
        let position = B::get_position(world, entity);
        let velocity = B::get_velocity(world, entity);

        let commands = {
            let Some(mut controller) = world.get_mut::<MotionController>(entity) else {
                continue;
            };
            let previous = controller.state();
            let commands = controller.resolve_transitions(&config, &input, position, velocity, dt);
            if controller.jumped() {
                debug!("{entity} jumped");
            } else if previous != controller.state() && controller.is_grounded() {
                match controller.ground_contact().support {
                    Some(support) => trace!(
                        "{entity} landed on {} ({:?}) at offset {}",
                        support.body,
                        support.kind,
                        support.offset
                    ),
                    None => trace!("{entity} landed"),
                }
            }
            commands
        };

        if let Some(velocity) = commands.velocity {
            B::set_velocity(world, entity, velocity);
        }
        if commands.translation != Vec3::ZERO {
            B::translate(world, entity, commands.translation);
        }
        if commands.force != Vec3::ZERO {
            B::apply_force(world, entity, commands.force);
        }
    }
}

/// Plan and apply the camera-relative velocity change, or damp to a stop.
pub fn apply_movement<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, MotionConfig, MotionInput, CameraFrame)> = world
        .query::<(
            Entity,
            &MotionConfig,
            &MotionInput,
            &CameraFrame,
            &MotionController,
        )>()
        .iter(world)
        .filter(|(.., controller)| controller.is_active())
        .map(|(e, config, input, camera, _)| (e, *config, input.sanitized(), camera.sanitized()))
        .collect();

    for (entity, config, input, camera) in entities {
        let velocity = B::get_velocity(world, entity);
        let rotation = B::get_rotation(world, entity);

        let outcome = {
            let Some(mut controller) = world.get_mut::<MotionController>(entity) else {
                continue;
            };
            controller.plan(&config, &input, &camera, velocity, rotation)
        };

        match outcome {
            PlanOutcome::Move { change } => B::apply_velocity_change(world, entity, change),
            PlanOutcome::Stop { velocity } => B::set_velocity(world, entity, velocity),
            PlanOutcome::Idle => {}
        }
    }
}

/// Veto horizontal motion toward an imminent wall, then record the final
/// velocity of the tick.
pub fn apply_contact_avoidance<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, Option<CollisionData>)> = world
        .query::<(Entity, &WallSensor, &MotionController)>()
        .iter(world)
        .filter(|(_, _, controller)| controller.is_active())
        .map(|(e, sensor, _)| (e, sensor.hit))
        .collect();

    for (entity, wall) in entities {
        let velocity = B::get_velocity(world, entity);
        let veto = world
            .get::<MotionController>(entity)
            .and_then(|controller| controller.avoid_walls(velocity, wall.as_ref()));

        if let (Some(velocity), Some(hit)) = (veto, wall) {
            trace!(
                "{entity} wall ahead at {} (normal {}), dropping horizontal velocity",
                hit.point,
                hit.normal
            );
            B::set_velocity(world, entity, velocity);
        }

        let velocity = B::get_velocity(world, entity);
        if let Some(mut controller) = world.get_mut::<MotionController>(entity) {
            controller.velocity = velocity;
        }
    }
}

/// Fire the character's action while the action button is held.
///
/// Climbing suppresses actions.
pub fn perform_actions(
    mut q_controllers: Query<(
        Entity,
        &MotionInput,
        &mut MotionController,
        Option<&mut ActionSlot>,
    )>,
) {
    for (entity, input, mut controller, slot) in &mut q_controllers {
        if !controller.is_active() {
            continue;
        }
        controller.attacking = input.action_held
            && !controller.is_climbing()
            && slot.is_some_and(|mut slot| slot.perform(entity));
    }
}

/// Keep the [`Grounded`], [`Airborne`] and [`Climbing`] markers in sync with
/// the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &MotionController,
        Has<Grounded>,
        Has<Airborne>,
        Has<Climbing>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, has_climbing) in &q_controllers {
        match controller.state() {
            MotionState::Grounded if !has_grounded => {
                commands
                    .entity(entity)
                    .insert(Grounded)
                    .remove::<(Airborne, Climbing)>();
            }
            MotionState::Airborne if !has_airborne => {
                commands
                    .entity(entity)
                    .insert(Airborne)
                    .remove::<(Grounded, Climbing)>();
            }
            MotionState::Climbing if !has_climbing => {
                commands
                    .entity(entity)
                    .insert(Climbing)
                    .remove::<(Grounded, Airborne)>();
            }
            _ => {}
        }
    }
}

/// Publish [`AnimationSignals`] for the animation driver.
pub fn sync_animation_signals(mut q: Query<(&MotionController, &mut AnimationSignals)>) {
    for (controller, mut signals) in &mut q {
        signals.set_if_neq(AnimationSignals::from_controller(controller));
    }
}

/// Rotate the visual model to the smoothed facing.
///
/// The facing only changes on moving ticks, so an idle model keeps its last
/// heading.
pub fn sync_model_facing(
    q_controllers: Query<(&MotionController, &CharacterModel)>,
    mut q_models: Query<&mut Transform, Without<MotionController>>,
) {
    for (controller, model) in &q_controllers {
        if let Ok(mut transform) = q_models.get_mut(model.0) {
            transform.rotation = controller.facing();
        }
    }
}

/// Move the camera target to damp vertical camera motion during jumps.
pub fn update_camera_targets(
    q_controllers: Query<(
        &MotionController,
        &MotionConfig,
        &GlobalTransform,
        &CameraTarget,
    )>,
    mut q_targets: Query<&mut Transform, Without<MotionController>>,
) {
    for (controller, config, transform, target) in &q_controllers {
        let Ok(mut target_transform) = q_targets.get_mut(target.0) else {
            continue;
        };
        let height = transform.translation().y;
        if let Some(offset) =
            camera_target_offset(controller, config, height, target_transform.translation)
        {
            target_transform.translation = offset;
        }
    }
}
