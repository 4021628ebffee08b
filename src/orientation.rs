//! Character facing.
//!
//! Facing is derived from the smoothed movement direction but smoothed on its
//! own, so the visual turn rate is independent of how fast velocity changes.

use bevy::prelude::*;

/// Yaw rotation that points forward (`-Z`) along `direction`.
///
/// Returns `None` when `direction` has no horizontal component.
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z)))
}

/// Step the facing toward the movement direction by a fixed fraction per tick.
///
/// The facing is kept when the direction is degenerate.
pub fn update_facing(current: Quat, direction: Vec3, smoothing: f32) -> Quat {
    match look_rotation(direction) {
        Some(target) => current.lerp(target, smoothing),
        None => current,
    }
}

/// Forward vector of a facing rotation.
#[inline]
pub fn facing_vector(rotation: Quat) -> Vec3 {
    rotation * Vec3::NEG_Z
}
