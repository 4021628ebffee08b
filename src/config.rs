//! Controller configuration components.
//!
//! This module defines the tunables of the motion controller (speeds, velocity
//! change limits, smoothing factors, jump timing) and the capsule geometry the
//! grounding detector measures contacts against.

use bevy::prelude::*;

use crate::error::ConfigError;

/// Capsule dimensions of the character collider.
///
/// The capsule is assumed to be upright and centered on the body position.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    /// Radius of the hemispherical caps.
    pub radius: f32,
    /// Half the length of the cylindrical segment between the caps.
    pub half_height: f32,
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            half_height: 0.5,
        }
    }
}

impl CapsuleShape {
    /// Create a capsule, rejecting shapes with no usable volume.
    pub fn new(radius: f32, half_height: f32) -> Result<Self, ConfigError> {
        let shape = Self {
            radius,
            half_height,
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Distance from the capsule center to its lowest point.
    #[inline]
    pub fn bottom_offset(&self) -> f32 {
        self.half_height + self.radius
    }

    /// World-space height of the capsule's lowest point.
    #[inline]
    pub fn bottom_y(&self, center: Vec3) -> f32 {
        center.y - self.bottom_offset()
    }

    /// Check that the capsule has a positive radius and a non-negative segment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let degenerate = !(self.radius.is_finite() && self.radius > 0.0)
            || !(self.half_height.is_finite() && self.half_height >= 0.0);
        if degenerate {
            return Err(ConfigError::DegenerateCapsule {
                radius: self.radius,
                half_height: self.half_height,
            });
        }
        Ok(())
    }
}

/// Configuration parameters for the motion controller.
///
/// The smoothing factors are applied once per fixed tick and are not scaled
/// by the elapsed time, so changing the fixed timestep changes how quickly
/// direction, facing and stopping converge.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct MotionConfig {
    // === Movement ===
    /// Target horizontal speed at full stick deflection (units/second).
    pub run_speed: f32,

    /// Maximum per-tick velocity change on each horizontal axis while grounded.
    pub ground_max_velocity_change: f32,

    /// Maximum per-tick velocity change on each horizontal axis while airborne.
    pub air_max_velocity_change: f32,

    /// Multiplier on the desired horizontal velocity while airborne (0.0-1.0).
    pub air_control: f32,

    /// Stick speed (squared magnitude) above which the character is moving.
    pub moving_threshold: f32,

    // === Smoothing (per tick) ===
    /// Interpolation factor of the movement direction and the facing rotation.
    pub turn_smoothing: f32,

    /// Interpolation factor toward zero horizontal velocity when stopping.
    pub slow_down_smoothing: f32,

    // === Jump ===
    /// Vertical velocity assigned on jump launch.
    pub jump_speed: f32,

    /// Minimum grounded dwell before another jump is allowed (seconds).
    pub jump_delay: f32,

    /// Fraction of the launch velocity kept as air momentum.
    pub jump_momentum_retention: f32,

    // === Gravity and climbing ===
    /// Magnitude of the downward force applied every tick when not climbing.
    pub simulated_gravity: f32,

    /// Vertical climbing speed at full stick deflection (units/second).
    pub climb_speed: f32,

    // === Sensors ===
    /// Contacts below `capsule bottom + radius * ground_contact_fraction` count as ground.
    pub ground_contact_fraction: f32,

    /// Range of the forward wall probe.
    pub wall_check_distance: f32,

    // === Camera target ===
    /// How strongly the camera target is pulled down while airborne.
    pub camera_jump_offset: f32,

    /// Interpolation factor of the camera target back to rest while grounded.
    pub camera_offset_smoothing: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            // Movement
            run_speed: 6.0,
            ground_max_velocity_change: 10.0,
            air_max_velocity_change: 3.0,
            air_control: 0.3,
            moving_threshold: 0.1,

            // Smoothing
            turn_smoothing: 1.0,
            slow_down_smoothing: 0.2,

            // Jump
            jump_speed: 6.0,
            jump_delay: 0.2,
            jump_momentum_retention: 0.8,

            // Gravity and climbing
            simulated_gravity: 20.0,
            climb_speed: 4.0,

            // Sensors
            ground_contact_fraction: 0.9,
            wall_check_distance: 1.8,

            // Camera target
            camera_jump_offset: 0.7,
            camera_offset_smoothing: 0.2,
        }
    }
}

impl MotionConfig {
    /// Create a config for responsive player control.
    pub fn player() -> Self {
        Self {
            turn_smoothing: 0.5,
            ..default()
        }
    }

    /// Create a config for AI-controlled characters.
    pub fn ai() -> Self {
        Self {
            run_speed: 4.0,
            ground_max_velocity_change: 6.0,
            air_control: 0.1,
            turn_smoothing: 0.2,
            ..default()
        }
    }

    /// Builder: set run speed.
    pub fn with_run_speed(mut self, speed: f32) -> Self {
        self.run_speed = speed;
        self
    }

    /// Builder: set the grounded and airborne velocity change limits.
    pub fn with_max_velocity_change(mut self, ground: f32, air: f32) -> Self {
        self.ground_max_velocity_change = ground;
        self.air_max_velocity_change = air;
        self
    }

    /// Builder: set air control multiplier.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.air_control = air_control;
        self
    }

    /// Builder: set jump speed.
    pub fn with_jump_speed(mut self, speed: f32) -> Self {
        self.jump_speed = speed;
        self
    }

    /// Builder: set the minimum grounded dwell before a jump.
    pub fn with_jump_delay(mut self, delay: f32) -> Self {
        self.jump_delay = delay;
        self
    }

    /// Builder: set jump momentum retention.
    pub fn with_jump_momentum_retention(mut self, retention: f32) -> Self {
        self.jump_momentum_retention = retention;
        self
    }

    /// Builder: set turn smoothing.
    pub fn with_turn_smoothing(mut self, smoothing: f32) -> Self {
        self.turn_smoothing = smoothing;
        self
    }

    /// Builder: set slow down smoothing.
    pub fn with_slow_down_smoothing(mut self, smoothing: f32) -> Self {
        self.slow_down_smoothing = smoothing;
        self
    }

    /// Builder: set simulated gravity.
    pub fn with_simulated_gravity(mut self, gravity: f32) -> Self {
        self.simulated_gravity = gravity;
        self
    }

    /// Builder: set climb speed.
    pub fn with_climb_speed(mut self, speed: f32) -> Self {
        self.climb_speed = speed;
        self
    }

    /// Builder: set wall probe range.
    pub fn with_wall_check_distance(mut self, distance: f32) -> Self {
        self.wall_check_distance = distance;
        self
    }

    /// Check every tunable once, before the controller starts ticking.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("run_speed", self.run_speed)?;
        positive("ground_max_velocity_change", self.ground_max_velocity_change)?;
        positive("air_max_velocity_change", self.air_max_velocity_change)?;
        non_negative("jump_speed", self.jump_speed)?;
        non_negative("jump_delay", self.jump_delay)?;
        non_negative("moving_threshold", self.moving_threshold)?;
        non_negative("simulated_gravity", self.simulated_gravity)?;
        non_negative("climb_speed", self.climb_speed)?;
        positive("wall_check_distance", self.wall_check_distance)?;
        non_negative("camera_jump_offset", self.camera_jump_offset)?;
        factor("air_control", self.air_control)?;
        factor("turn_smoothing", self.turn_smoothing)?;
        factor("slow_down_smoothing", self.slow_down_smoothing)?;
        factor("jump_momentum_retention", self.jump_momentum_retention)?;
        factor("ground_contact_fraction", self.ground_contact_fraction)?;
        factor("camera_offset_smoothing", self.camera_offset_smoothing)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn factor(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::FactorOutOfRange { name, value })
    }
}
