//! Locomotion state.
//!
//! [`MotionState`] is the single source of truth, stored in the
//! [`MotionController`](crate::controller::MotionController). The marker
//! components mirror it so other systems can filter queries by state; they are
//! synced once per frame and may lag a tick behind.

use bevy::prelude::*;

/// Locomotion state of a character. Exactly one is active at a time.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionState {
    /// Supported by geometry this tick.
    Grounded,
    /// Falling or jumping. Characters start here until the first ground contact.
    #[default]
    Airborne,
    /// Scripted vertical traversal; physics forces are bypassed.
    Climbing,
}

impl MotionState {
    #[inline]
    pub fn is_grounded(self) -> bool {
        self == MotionState::Grounded
    }

    #[inline]
    pub fn is_airborne(self) -> bool {
        self == MotionState::Airborne
    }

    #[inline]
    pub fn is_climbing(self) -> bool {
        self == MotionState::Climbing
    }
}

/// Marker component indicating the character is grounded.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use motion_controller::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`] and [`Climbing`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is climbing.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Climbing;
