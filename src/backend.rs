//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the motion controller. Backends own two jobs:
//!
//! - Body access: reading and writing velocity, position and forces through
//!   the methods below.
//! - Sensing: filling the [`GroundSensor`](crate::detection::GroundSensor)
//!   during [`MotionControllerSet::Sensors`](crate::MotionControllerSet) and the
//!   [`WallSensor`](crate::avoidance::WallSensor) during
//!   [`MotionControllerSet::Probes`](crate::MotionControllerSet), using systems
//!   added by the backend's plugin.

use bevy::prelude::*;

use crate::config::CapsuleShape;

/// Trait for physics backend implementations.
///
/// For an example implementation, see the `rapier` module's `Rapier3dBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend's sensor systems.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Apply an instantaneous velocity change, independent of mass.
    fn apply_velocity_change(world: &mut World, entity: Entity, change: Vec3) {
        let velocity = Self::get_velocity(world, entity);
        Self::set_velocity(world, entity, velocity + change);
    }

    /// Apply a continuous force over this physics step.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3);

    /// Get the current world position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Get the current world rotation of an entity.
    fn get_rotation(world: &World, entity: Entity) -> Quat;

    /// Move an entity kinematically, bypassing forces.
    fn translate(world: &mut World, entity: Entity, offset: Vec3);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.timestep().as_secs_f32())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }

    /// Get the capsule shape of an entity's collider, if it has one.
    fn get_capsule(world: &World, entity: Entity) -> Option<CapsuleShape>;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
