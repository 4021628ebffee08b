//! Velocity planner.
//!
//! Maps camera-relative stick input to the velocity change requested from the
//! physics engine. Directions follow Bevy's convention: `-Z` is forward, `+X`
//! is right, `+Y` is up.

use bevy::prelude::*;

use crate::config::MotionConfig;

/// Rotation about the vertical axis that turns world forward (`-Z`) onto the
/// camera's horizontal heading.
///
/// A camera looking straight up or down has no heading; identity is used. So
/// does a non-finite forward vector.
pub fn camera_yaw(camera_forward: Vec3) -> Quat {
    let flat = Vec3::new(camera_forward.x, 0.0, camera_forward.z);
    if !flat.is_finite() || flat.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z))
}

/// Convert a stick vector into a horizontal world-space direction relative to
/// the camera, independent of the character's facing.
pub fn stick_to_worldspace(stick: Vec2, camera_forward: Vec3) -> Vec3 {
    camera_yaw(camera_forward) * Vec3::new(stick.x, 0.0, -stick.y)
}

/// Move the current direction toward the target by a fixed fraction.
///
/// The fraction is applied per tick, not per second.
pub fn smooth_direction(current: Vec3, target: Vec3, smoothing: f32) -> Vec3 {
    current.lerp(target, smoothing)
}

/// Desired velocity for a movement direction, expressed through the body's
/// rotation and scaled by the run speed on the horizontal axes.
pub fn moving_velocity(direction: Vec3, body_rotation: Quat, run_speed: f32) -> Vec3 {
    let mut velocity = body_rotation * direction;
    velocity.x *= run_speed;
    velocity.z *= run_speed;
    velocity
}

/// Reduce horizontal responsiveness in the air and carry the launch momentum.
pub fn adjust_for_airborne(desired: Vec3, air_control: f32, jump_momentum: Vec3) -> Vec3 {
    let mut adjusted = desired;
    adjusted.x *= air_control;
    adjusted.z *= air_control;
    adjusted + jump_momentum
}

/// Velocity change that moves the support-relative velocity toward `desired`.
///
/// Each horizontal axis is clamped to `±max_change` independently, so the
/// horizontal magnitude can reach `√2 · max_change` on a diagonal. The vertical
/// component is always zero; gravity and jumping own it.
pub fn delta_velocity(desired: Vec3, velocity: Vec3, support_velocity: Vec3, max_change: f32) -> Vec3 {
    let relative = velocity - support_velocity;
    let change = desired - relative;
    Vec3::new(
        change.x.clamp(-max_change, max_change),
        0.0,
        change.z.clamp(-max_change, max_change),
    )
}

/// Damp horizontal velocity toward zero, leaving the vertical component alone.
pub fn stopping_velocity(velocity: Vec3, smoothing: f32) -> Vec3 {
    velocity.lerp(Vec3::new(0.0, velocity.y, 0.0), smoothing)
}

/// Body and support state the planner works from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanContext {
    pub velocity: Vec3,
    pub body_rotation: Quat,
    pub support_velocity: Vec3,
    pub jump_momentum: Vec3,
    pub grounded: bool,
}

/// Desired velocity before clamping: run speed on the ground, reduced air
/// control plus momentum in the air.
pub fn desired_velocity(config: &MotionConfig, direction: Vec3, ctx: &PlanContext) -> Vec3 {
    let desired = moving_velocity(direction, ctx.body_rotation, config.run_speed);
    if ctx.grounded {
        desired
    } else {
        adjust_for_airborne(desired, config.air_control, ctx.jump_momentum)
    }
}

/// Clamped velocity change to request from the physics engine this tick.
pub fn velocity_change(config: &MotionConfig, direction: Vec3, ctx: &PlanContext) -> Vec3 {
    let max_change = if ctx.grounded {
        config.ground_max_velocity_change
    } else {
        config.air_max_velocity_change
    };
    delta_velocity(
        desired_velocity(config, direction, ctx),
        ctx.velocity,
        ctx.support_velocity,
        max_change,
    )
}
