//! Collision query results.
//!
//! These structures hold what the physics backend reports back to the
//! controller: raycast hits and per-tick contact points.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// How a physical body is driven.
///
/// Attached to bodies when they are registered with the physics engine, so the
/// grounding detector never has to probe a body's capabilities.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub enum BodyKind {
    /// Never moves.
    #[default]
    Static,
    /// Moved by explicit position or velocity control, not by forces.
    Kinematic,
    /// Freely simulated by the physics engine.
    Dynamic,
}

/// The body behind a contact point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportBody {
    pub entity: Entity,
    pub kind: BodyKind,
    /// Linear velocity of the body this tick.
    pub velocity: Vec3,
    /// World translation of the body this tick.
    pub translation: Vec3,
}

/// A single contact point between the character and another collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// World position of the contact.
    pub position: Vec3,
    /// Body owning the other collider. `None` for bare static geometry.
    pub body: Option<SupportBody>,
}

impl ContactPoint {
    /// A contact against bare static geometry.
    pub fn fixed(position: Vec3) -> Self {
        Self {
            position,
            body: None,
        }
    }

    /// A contact against a registered body.
    pub fn with_body(position: Vec3, body: SupportBody) -> Self {
        Self {
            position,
            body: Some(body),
        }
    }
}
