//! Input and camera components.
//!
//! The controller never polls devices. Player code or AI writes a
//! [`MotionInput`] every frame and keeps the [`CameraFrame`] pointed where the
//! camera looks; the fixed-step systems read both once per tick.

use bevy::prelude::*;

/// Per-tick input sample.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use motion_controller::prelude::*;
///
/// let mut input = MotionInput::new();
/// input.set_stick(Vec2::new(0.0, 2.0));
/// assert_eq!(input.stick, Vec2::Y);
///
/// input.set_jump_held(true);
/// assert!(input.jump_held);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct MotionInput {
    /// Directional stick, each axis in `[-1, 1]`. `y` is forward.
    pub stick: Vec2,
    /// Whether the jump button is held.
    pub jump_held: bool,
    /// Whether the action button is held.
    pub action_held: bool,
}

impl MotionInput {
    /// Create an empty input sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stick vector, clamping each axis to `[-1, 1]`.
    pub fn set_stick(&mut self, stick: Vec2) {
        self.stick = stick.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set whether jump is held.
    pub fn set_jump_held(&mut self, held: bool) {
        self.jump_held = held;
    }

    /// Set whether the action button is held.
    pub fn set_action_held(&mut self, held: bool) {
        self.action_held = held;
    }

    /// Clear all input.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Stick speed as used by the planner: the squared stick magnitude.
    pub fn speed(&self) -> f32 {
        self.stick.length_squared()
    }

    /// Return a copy safe to feed into the planner.
    ///
    /// A non-finite stick is a caller bug: it trips a debug assertion and is
    /// zeroed in release builds.
    pub fn sanitized(&self) -> Self {
        let finite = self.stick.is_finite();
        debug_assert!(finite, "non-finite stick input: {:?}", self.stick);
        Self {
            stick: if finite {
                self.stick.clamp(Vec2::NEG_ONE, Vec2::ONE)
            } else {
                Vec2::ZERO
            },
            ..*self
        }
    }
}

/// Orientation of the camera the stick input is relative to.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct CameraFrame {
    /// World-space direction the camera looks along.
    pub forward: Vec3,
}

impl Default for CameraFrame {
    fn default() -> Self {
        Self {
            forward: Vec3::NEG_Z,
        }
    }
}

impl CameraFrame {
    /// Create a camera frame looking along `forward`.
    pub fn new(forward: Vec3) -> Self {
        Self { forward }
    }

    /// Copy with a usable forward vector.
    ///
    /// A non-finite forward trips a debug assertion and falls back to world
    /// forward in release builds.
    pub fn sanitized(&self) -> Self {
        let finite = self.forward.is_finite();
        debug_assert!(finite, "non-finite camera forward: {:?}", self.forward);
        if finite { *self } else { Self::default() }
    }
}

/// Copy the forward direction of another entity (usually the camera) into
/// this character's [`CameraFrame`] every tick.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct CameraLink(pub Entity);
