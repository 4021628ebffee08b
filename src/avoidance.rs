//! Contact avoidance.
//!
//! While airborne, a ray is cast ahead of the character from where it will be
//! next tick. If a wall is that close, horizontal velocity is dropped for this
//! tick so the character falls along the wall instead of pressing into it.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::detection::Ray;

/// Forward probe result written by the physics backend after planning.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WallSensor {
    /// Wall hit within range of the probe this tick.
    pub hit: Option<CollisionData>,
}

/// Forward ray offset by the displacement of this tick.
///
/// Returns `None` when there is no horizontal motion to probe along.
pub fn wall_probe(position: Vec3, velocity: Vec3, dt: f32, max_distance: f32) -> Option<Ray> {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    let direction = Dir3::new(horizontal).ok()?;
    Some(Ray {
        origin: position + velocity * dt,
        direction,
        max_distance,
    })
}

/// Cast the wall probe and keep the hit only when it is strictly within range.
pub fn predict_wall_contact(
    position: Vec3,
    velocity: Vec3,
    dt: f32,
    max_distance: f32,
    cast: impl FnOnce(&Ray) -> Option<CollisionData>,
) -> Option<CollisionData> {
    let ray = wall_probe(position, velocity, dt, max_distance)?;
    cast(&ray).filter(|hit| hit.distance < max_distance)
}

/// Velocity after the wall veto. Vertical motion is never affected.
pub fn apply_wall_veto(velocity: Vec3, wall: Option<&CollisionData>) -> Vec3 {
    match wall {
        Some(_) => Vec3::new(0.0, velocity.y, 0.0),
        None => velocity,
    }
}
