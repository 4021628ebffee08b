//! Core motion controller component.
//!
//! [`MotionController`] is the central hub of per-character state: locomotion
//! state, jump timing, carried momentum, smoothed direction and facing. Its
//! methods implement the state machine and the per-tick decisions as plain
//! functions of their inputs. The systems in [`crate::systems`] only move data
//! between the physics backend and these methods.

use bevy::prelude::*;

use crate::avoidance::{WallSensor, apply_wall_veto};
use crate::collision::CollisionData;
use crate::config::{CapsuleShape, MotionConfig};
use crate::detection::{GroundContact, GroundSensor, GroundSource, detect_ground};
use crate::error::ConfigError;
use crate::intent::{CameraFrame, MotionInput};
use crate::orientation::{facing_vector, update_facing};
use crate::planner::{PlanContext, smooth_direction, stick_to_worldspace, stopping_velocity, velocity_change};
use crate::presentation::AnimationSignals;
use crate::state::MotionState;

/// Body writes decided by the state machine for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyCommands {
    /// Velocity to assign directly, if any.
    pub velocity: Option<Vec3>,
    /// Kinematic position offset (climbing only).
    pub translation: Vec3,
    /// Continuous force to apply this tick.
    pub force: Vec3,
}

/// What the planner asks of the body this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanOutcome {
    /// Apply an instantaneous velocity change.
    Move { change: Vec3 },
    /// Replace the velocity with a damped one.
    Stop { velocity: Vec3 },
    /// Leave the body alone.
    Idle,
}

/// Core motion controller component.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use motion_controller::prelude::*;
///
/// let mut controller = MotionController::new();
/// assert_eq!(controller.state(), MotionState::Airborne);
///
/// // Entering a ladder volume
/// controller.set_climb_mode(true);
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(MotionConfig, MotionInput, CameraFrame, GroundSensor, WallSensor, AnimationSignals)]
pub struct MotionController {
    // === Locomotion ===
    pub(crate) state: MotionState,
    /// Ground state resolved this tick.
    pub(crate) contact: GroundContact,
    /// Seconds spent grounded since the last landing or jump.
    pub(crate) time_grounded: f32,
    /// Horizontal velocity carried from the last jump launch.
    pub(crate) jump_momentum: Vec3,
    /// Whether a jump launched this tick.
    pub(crate) jumped: bool,
    /// Position at the last grounded tick.
    pub(crate) ground_position: Vec3,

    // === Movement ===
    /// Stick speed (squared magnitude) sampled this tick; zero while climbing.
    pub(crate) speed: f32,
    pub(crate) moving: bool,
    /// Smoothed world-space movement direction.
    pub(crate) current_direction: Vec3,
    /// Normalized velocity after the last moving tick.
    pub(crate) last_direction: Vec3,
    /// Smoothed model facing.
    pub(crate) facing: Quat,
    /// Body velocity at the end of the last tick.
    pub(crate) velocity: Vec3,
    pub(crate) attacking: bool,

    // === Internal ===
    pub(crate) capsule: CapsuleShape,
    /// Pending explicit climb mode change, applied on the next tick.
    pub(crate) climb_request: Option<bool>,
    pub(crate) initialized: bool,
    /// Continuous force accumulated this tick.
    pub(crate) accumulated_force: Vec3,
    /// Force handed to the physics engine last tick.
    pub(crate) applied_force: Vec3,
    #[reflect(ignore)]
    pub(crate) fault: Option<ConfigError>,
}

impl Default for MotionController {
    fn default() -> Self {
        Self {
            state: MotionState::Airborne,
            contact: GroundContact::default(),
            time_grounded: 0.0,
            jump_momentum: Vec3::ZERO,
            jumped: false,
            ground_position: Vec3::ZERO,
            speed: 0.0,
            moving: false,
            current_direction: Vec3::ZERO,
            last_direction: Vec3::ZERO,
            facing: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            attacking: false,
            capsule: CapsuleShape::default(),
            climb_request: None,
            initialized: false,
            accumulated_force: Vec3::ZERO,
            applied_force: Vec3::ZERO,
            fault: None,
        }
    }
}

impl MotionController {
    /// Create a new controller. It starts airborne until ground is confirmed.
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    /// Current locomotion state.
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Whether the character is grounded this tick.
    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded()
    }

    pub fn is_airborne(&self) -> bool {
        self.state.is_airborne()
    }

    pub fn is_climbing(&self) -> bool {
        self.state.is_climbing()
    }

    /// Whether the stick speed exceeded the moving threshold this tick.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Stick speed (squared magnitude) used this tick.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Normalized direction of travel after the last moving tick.
    pub fn facing_direction(&self) -> Vec3 {
        self.last_direction
    }

    /// Smoothed model facing rotation.
    pub fn facing(&self) -> Quat {
        self.facing
    }

    /// Forward vector of the model facing.
    pub fn facing_forward(&self) -> Vec3 {
        facing_vector(self.facing)
    }

    /// Smoothed movement direction.
    pub fn movement_direction(&self) -> Vec3 {
        self.current_direction
    }

    /// Body velocity at the end of the last tick.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Ground state resolved this tick.
    pub fn ground_contact(&self) -> &GroundContact {
        &self.contact
    }

    /// Seconds grounded since the last landing or jump.
    pub fn time_grounded(&self) -> f32 {
        self.time_grounded
    }

    pub fn jump_momentum(&self) -> Vec3 {
        self.jump_momentum
    }

    /// Whether a jump launched this tick.
    pub fn jumped(&self) -> bool {
        self.jumped
    }

    /// Position recorded on the last grounded tick.
    pub fn ground_position(&self) -> Vec3 {
        self.ground_position
    }

    /// Whether the external action fired this tick.
    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn capsule(&self) -> CapsuleShape {
        self.capsule
    }

    /// Configuration fault found at initialization, if any. A faulted
    /// controller is left inert.
    pub fn fault(&self) -> Option<&ConfigError> {
        self.fault.as_ref()
    }

    // === Commands ===

    /// Enter or leave climb mode. Takes effect on the next tick, which zeroes
    /// the body velocity.
    pub fn set_climb_mode(&mut self, climbing: bool) {
        self.climb_request = Some(climbing);
    }

    // === Force accumulation ===

    /// Add a continuous force for this tick.
    pub fn add_force(&mut self, force: Vec3) {
        self.accumulated_force += force;
    }

    /// Start a new tick. Returns the force applied last tick so the backend
    /// can remove it, and clears the accumulator.
    pub fn prepare_new_frame(&mut self) -> Vec3 {
        self.accumulated_force = Vec3::ZERO;
        std::mem::take(&mut self.applied_force)
    }

    /// Finish the tick. Returns the accumulated force and remembers it as
    /// applied.
    pub fn finalize_frame(&mut self) -> Vec3 {
        self.applied_force = self.accumulated_force;
        self.accumulated_force
    }

    // === Tick steps ===

    /// Validate configuration and capture the collider shape. Called once.
    pub fn initialize(
        &mut self,
        config: &MotionConfig,
        capsule: Option<CapsuleShape>,
    ) -> Result<(), ConfigError> {
        self.initialized = true;
        let result = config.validate().and_then(|()| {
            let capsule = capsule.ok_or(ConfigError::MissingCollider)?;
            capsule.validate()?;
            Ok(capsule)
        });
        match result {
            Ok(capsule) => {
                self.capsule = capsule;
                self.fault = None;
                Ok(())
            }
            Err(err) => {
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Whether the per-tick systems should drive this controller.
    pub fn is_active(&self) -> bool {
        self.initialized && self.fault.is_none()
    }

    /// Step 1: resolve this tick's ground contact from sensor data.
    pub fn detect_ground(&mut self, config: &MotionConfig, position: Vec3, sensor: &GroundSensor) {
        self.contact = detect_ground(
            position,
            &self.capsule,
            config.ground_contact_fraction,
            self.contact.support_velocity,
            sensor,
        );
        self.jumped = false;
    }

    /// Step 2: resolve climb, landing and jump transitions.
    ///
    /// Grounding is re-derived from this tick's contact every time, so a
    /// character with no confirmed ground falls back to airborne.
    pub fn resolve_transitions(
        &mut self,
        config: &MotionConfig,
        input: &MotionInput,
        position: Vec3,
        velocity: Vec3,
        dt: f32,
    ) -> BodyCommands {
        let mut commands = BodyCommands::default();
        let previous = self.state;

        if let Some(climbing) = self.climb_request.take() {
            commands.velocity = Some(Vec3::ZERO);
            if climbing {
                self.enter_climb();
            } else if self.state.is_climbing() {
                self.state = MotionState::Airborne;
                debug!("left climb mode");
            }
        }

        if self.state.is_climbing() {
            self.speed = 0.0;
            self.moving = false;
            commands.velocity = Some(Vec3::ZERO);

            if self.contact.is_grounded && input.stick.y < 0.0 {
                // The exit tick stays still: no run, no gravity.
                debug!("climbed down onto ground");
                self.state = MotionState::Grounded;
                self.ground_position = position;
                self.time_grounded = 0.0;
            } else {
                commands.translation = Vec3::Y * input.stick.y * config.climb_speed * dt;
            }
            return commands;
        }

        self.speed = input.speed();
        commands.force = Vec3::NEG_Y * config.simulated_gravity;

        if !self.contact.is_grounded {
            self.state = MotionState::Airborne;
            return commands;
        }

        self.state = MotionState::Grounded;
        self.ground_position = position;
        if previous.is_grounded() {
            self.time_grounded += dt;
        } else {
            self.time_grounded = 0.0;
        }

        if input.jump_held && self.time_grounded > config.jump_delay {
            let current = commands.velocity.unwrap_or(velocity);
            commands.velocity = Some(self.launch_jump(config, current));
        }

        commands
    }

    /// Step 3: plan the velocity change toward the stick direction, or damp to
    /// a stop when grounded with no meaningful input.
    pub fn plan(
        &mut self,
        config: &MotionConfig,
        input: &MotionInput,
        camera: &CameraFrame,
        velocity: Vec3,
        body_rotation: Quat,
    ) -> PlanOutcome {
        if self.state.is_climbing() {
            return PlanOutcome::Idle;
        }

        self.moving = self.speed > config.moving_threshold;
        if self.moving {
            let target = stick_to_worldspace(input.stick, camera.forward);
            self.current_direction =
                smooth_direction(self.current_direction, target, config.turn_smoothing);
            self.facing = update_facing(self.facing, self.current_direction, config.turn_smoothing);

            let ctx = PlanContext {
                velocity,
                body_rotation,
                support_velocity: self.contact.support_velocity,
                jump_momentum: self.jump_momentum,
                grounded: self.state.is_grounded(),
            };
            let change = velocity_change(config, self.current_direction, &ctx);
            self.last_direction = (velocity + change).normalize_or_zero();
            PlanOutcome::Move { change }
        } else if self.state.is_grounded() {
            PlanOutcome::Stop {
                velocity: stopping_velocity(velocity, config.slow_down_smoothing),
            }
        } else {
            PlanOutcome::Idle
        }
    }

    /// Step 4: veto horizontal motion when airborne and a wall is imminent.
    ///
    /// Returns the replacement velocity, if any.
    pub fn avoid_walls(&self, velocity: Vec3, wall: Option<&CollisionData>) -> Option<Vec3> {
        if !self.state.is_airborne() {
            return None;
        }
        wall.map(|hit| apply_wall_veto(velocity, Some(hit)))
    }

    fn enter_climb(&mut self) {
        if !self.state.is_climbing() {
            debug!("entered climb mode");
        }
        self.state = MotionState::Climbing;
        self.contact.is_grounded = false;
        self.contact.source = GroundSource::None;
        self.speed = 0.0;
        self.moving = false;
    }

    fn launch_jump(&mut self, config: &MotionConfig, velocity: Vec3) -> Vec3 {
        self.time_grounded = 0.0;
        self.jump_momentum = Vec3::new(velocity.x, 0.0, velocity.z) * config.jump_momentum_retention;
        self.state = MotionState::Airborne;
        self.jumped = true;
        Vec3::new(velocity.x, config.jump_speed, velocity.z)
    }
}
