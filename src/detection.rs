//! Grounding detector.
//!
//! The physics backend fills a [`GroundSensor`] every tick with the contact
//! points touching the character and the result of the predictive landing ray.
//! [`detect_ground`] turns that raw data into a [`GroundContact`]. Grounding is
//! not sticky: a character is only grounded on ticks where a qualifying contact
//! or a predicted landing was reported.

use bevy::prelude::*;

use crate::collision::{BodyKind, CollisionData, ContactPoint, SupportBody};
use crate::config::CapsuleShape;

/// A ray to be cast by the physics backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Dir3,
    pub max_distance: f32,
}

/// Raw sensor data written by the physics backend each tick.
#[derive(Component, Debug, Clone, Default)]
pub struct GroundSensor {
    /// Contact points between the character and other colliders this tick.
    pub contacts: Vec<ContactPoint>,
    /// Ground hit of the landing ray, present only when the character will
    /// reach it before the next tick (see [`predict_landing`]).
    pub landing: Option<CollisionData>,
}

impl GroundSensor {
    /// Forget everything reported last tick.
    pub fn clear(&mut self) {
        self.contacts.clear();
        self.landing = None;
    }
}

/// What confirmed the ground this tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundSource {
    /// Nothing did; the character is falling.
    #[default]
    None,
    /// A contact point near the base of the capsule.
    Contact,
    /// The landing ray predicted touchdown before the next tick.
    Predicted,
}

/// Back-reference to the body currently supporting the character.
///
/// Recomputed every tick. The character is never parented to its support.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SupportRelation {
    pub body: Entity,
    pub kind: BodyKind,
    /// Character position minus the support body's translation.
    pub offset: Vec3,
}

impl SupportRelation {
    pub fn new(body: &SupportBody, character_position: Vec3) -> Self {
        Self {
            body: body.entity,
            kind: body.kind,
            offset: character_position - body.translation,
        }
    }
}

/// Ground state resolved for the current tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundContact {
    /// Velocity of the supporting surface. Carries over until overwritten.
    pub support_velocity: Vec3,
    /// Whether the character is supported this tick.
    pub is_grounded: bool,
    pub source: GroundSource,
    pub support: Option<SupportRelation>,
}

impl GroundContact {
    /// No support this tick, keeping the last known support velocity.
    pub fn unsupported(support_velocity: Vec3) -> Self {
        Self {
            support_velocity,
            ..default()
        }
    }
}

/// Height below which a contact point counts as ground.
///
/// Contacts must lie within `fraction` of a radius above the lowest point of
/// the capsule, which rejects contacts on the sides and top.
pub fn ground_threshold(center: Vec3, capsule: &CapsuleShape, fraction: f32) -> f32 {
    capsule.bottom_y(center) + capsule.radius * fraction
}

/// First contact strictly below `threshold`. Contacts are not aggregated.
pub fn find_ground_contact(contacts: &[ContactPoint], threshold: f32) -> Option<&ContactPoint> {
    contacts.iter().find(|contact| contact.position.y < threshold)
}

/// Support velocity after standing on `body`.
///
/// Kinematic platforms lend their velocity so movement is platform-relative.
/// Dynamic bodies give zero to avoid two free bodies feeding back into each
/// other. Static geometry leaves the previous value untouched.
pub fn classify_support(body: Option<&SupportBody>, previous: Vec3) -> Vec3 {
    match body.map(|b| (b.kind, b.velocity)) {
        Some((BodyKind::Kinematic, velocity)) => velocity,
        Some((BodyKind::Dynamic, _)) => Vec3::ZERO,
        Some((BodyKind::Static, _)) | None => previous,
    }
}

/// Downward ray covering the distance the capsule bottom travels this tick.
///
/// Returns `None` unless the character is descending.
pub fn landing_probe(origin: Vec3, velocity: Vec3, dt: f32, foot_offset: f32) -> Option<Ray> {
    if velocity.y >= 0.0 {
        return None;
    }
    Some(Ray {
        origin,
        direction: Dir3::NEG_Y,
        max_distance: foot_offset + velocity.y.abs() * dt,
    })
}

/// Predict whether the character touches down before the next tick.
///
/// `cast` performs the raycast; it is only called when the character is
/// descending. The hit is returned when the distance from the capsule bottom
/// to the ground is within one tick of travel, catching fast falls that would
/// otherwise tunnel through thin geometry between physics steps.
pub fn predict_landing(
    origin: Vec3,
    velocity: Vec3,
    dt: f32,
    foot_offset: f32,
    cast: impl FnOnce(&Ray) -> Option<CollisionData>,
) -> Option<CollisionData> {
    let ray = landing_probe(origin, velocity, dt, foot_offset)?;
    let reach = velocity.y.abs() * dt;
    cast(&ray).filter(|hit| hit.distance - foot_offset <= reach)
}

/// Resolve this tick's ground state from raw sensor data.
pub fn detect_ground(
    center: Vec3,
    capsule: &CapsuleShape,
    contact_fraction: f32,
    previous_support: Vec3,
    sensor: &GroundSensor,
) -> GroundContact {
    let threshold = ground_threshold(center, capsule, contact_fraction);

    if let Some(contact) = find_ground_contact(&sensor.contacts, threshold) {
        return GroundContact {
            support_velocity: classify_support(contact.body.as_ref(), previous_support),
            is_grounded: true,
            source: GroundSource::Contact,
            support: contact
                .body
                .as_ref()
                .map(|body| SupportRelation::new(body, center)),
        };
    }

    if sensor.landing.is_some() {
        return GroundContact {
            support_velocity: previous_support,
            is_grounded: true,
            source: GroundSource::Predicted,
            support: None,
        };
    }

    GroundContact::unsupported(previous_support)
}
