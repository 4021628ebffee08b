//! Cosmetic outputs.
//!
//! Nothing here feeds back into the simulation. These components are refreshed
//! once per rendered frame from the controller state and may lag a fixed tick
//! behind.

use bevy::prelude::*;

use crate::config::MotionConfig;
use crate::controller::MotionController;

/// Semantic values for an external animation driver.
///
/// Written by the controller every frame; never read back.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct AnimationSignals {
    /// Stick speed (squared magnitude) driving locomotion blend; 0 while climbing.
    pub horizontal_speed: f32,
    pub is_airborne: bool,
    pub is_climbing: bool,
    pub is_attacking: bool,
}

impl AnimationSignals {
    /// Snapshot the animation-relevant state of a controller.
    pub fn from_controller(controller: &MotionController) -> Self {
        Self {
            horizontal_speed: controller.speed(),
            is_airborne: controller.is_airborne(),
            is_climbing: controller.is_climbing(),
            is_attacking: controller.is_attacking(),
        }
    }
}

/// Entity holding the visual model; its rotation follows the smoothed facing.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct CharacterModel(pub Entity);

/// Child entity the camera follows.
///
/// While airborne it is pulled down toward the last ground height so the
/// camera does not bob with every jump.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct CameraTarget(pub Entity);

/// Local offset of the camera target for this frame.
///
/// Returns `None` while climbing, leaving the target where it is.
pub fn camera_target_offset(
    controller: &MotionController,
    config: &MotionConfig,
    height: f32,
    current: Vec3,
) -> Option<Vec3> {
    if controller.is_climbing() {
        None
    } else if controller.is_airborne() {
        let rise = (height - controller.ground_position().y).max(0.0);
        Some(Vec3::new(0.0, -rise * config.camera_jump_offset, 0.0))
    } else {
        Some(current.lerp(Vec3::ZERO, config.camera_offset_smoothing))
    }
}
