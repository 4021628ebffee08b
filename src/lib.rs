//! # `motion_controller`
//!
//! A 3D rigidbody character motion controller with physics backend abstraction.
//!
//! This crate turns a stick, a jump button and an action button into physically
//! simulated character motion:
//! - Grounded, airborne and climbing locomotion states
//! - Non-sticky ground detection from contact points plus a predictive landing ray
//! - Camera-relative movement with turn smoothing and a per-tick acceleration clamp
//! - Platform-relative motion on kinematic supports
//! - Jump timing with momentum carried into reduced air control
//! - Airborne wall avoidance so characters slide down walls instead of sticking
//! - Cosmetic outputs for animation, model facing and a jump-damped camera target
//!
//! ## Architecture
//!
//! The controller drives a **dynamic rigidbody**:
//! 1. The physics engine resolves collisions and integrates velocity
//! 2. The backend reports contacts and ray hits into sensor components
//! 3. [`MotionController`](controller::MotionController) decides transitions and
//!    velocity changes as plain functions of that data
//! 4. Generic systems write the decisions back through the backend
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use motion_controller::prelude::*;
//!
//! // Components for a player character
//! let controller = MotionController::new();
//! let config = MotionConfig::player();
//! let input = MotionInput::default();
//!
//! // These can be spawned together with physics components
//! ```

use bevy::prelude::*;

pub mod action;
pub mod avoidance;
pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod detection;
pub mod error;
pub mod intent;
pub mod orientation;
pub mod planner;
pub mod presentation;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::action::{ActionSlot, CharacterAction};
    pub use crate::avoidance::WallSensor;
    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::{BodyKind, CollisionData, ContactPoint, SupportBody};
    pub use crate::config::{CapsuleShape, MotionConfig};
    pub use crate::controller::MotionController;
    pub use crate::detection::{GroundContact, GroundSensor, GroundSource, SupportRelation};
    pub use crate::error::ConfigError;
    pub use crate::intent::{CameraFrame, CameraLink, MotionInput};
    pub use crate::presentation::{AnimationSignals, CameraTarget, CharacterModel};
    pub use crate::state::{Airborne, Climbing, Grounded, MotionState};
    pub use crate::{MotionControllerPlugin, MotionControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Phases of one fixed tick, run in order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionControllerSet {
    /// Clear last tick's forces, initialize new controllers, read the camera.
    Preparation,
    /// Backend fills [`GroundSensor`](detection::GroundSensor), then ground is resolved.
    Sensors,
    /// Climb mode, gravity, landing and jumping.
    Transitions,
    /// Camera-relative velocity planning.
    Movement,
    /// Backend fills [`WallSensor`](avoidance::WallSensor) from the planned velocity.
    Probes,
    /// Airborne wall veto.
    Avoidance,
    /// External action hook.
    Actions,
    /// Accumulated forces are handed to the physics engine.
    FinalApplication,
}

/// Main plugin for the motion controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (contacts, raycasts, velocity and force access).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With the Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use motion_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(MotionControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct MotionControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for MotionControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for MotionControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::MotionController>();
        app.register_type::<config::MotionConfig>();
        app.register_type::<config::CapsuleShape>();
        app.register_type::<intent::MotionInput>();
        app.register_type::<intent::CameraFrame>();
        app.register_type::<intent::CameraLink>();
        app.register_type::<state::MotionState>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Climbing>();
        app.register_type::<collision::BodyKind>();
        app.register_type::<detection::GroundContact>();
        app.register_type::<presentation::AnimationSignals>();
        app.register_type::<presentation::CharacterModel>();
        app.register_type::<presentation::CameraTarget>();

        app.configure_sets(
            FixedUpdate,
            (
                MotionControllerSet::Preparation,
                MotionControllerSet::Sensors,
                MotionControllerSet::Transitions,
                MotionControllerSet::Movement,
                MotionControllerSet::Probes,
                MotionControllerSet::Avoidance,
                MotionControllerSet::Actions,
                MotionControllerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                (systems::initialize_controllers::<B>, systems::sync_camera_frames)
                    .chain()
                    .in_set(MotionControllerSet::Preparation),
                // Backend sensor systems in the same set run first.
                systems::update_ground_detection::<B>
                    .in_set(MotionControllerSet::Sensors)
                    .after(BackendSensors),
                systems::resolve_transitions::<B>.in_set(MotionControllerSet::Transitions),
                systems::apply_movement::<B>.in_set(MotionControllerSet::Movement),
                systems::apply_contact_avoidance::<B>.in_set(MotionControllerSet::Avoidance),
                systems::perform_actions.in_set(MotionControllerSet::Actions),
            ),
        );

        // Cosmetic outputs once per rendered frame
        app.add_systems(
            Update,
            (
                systems::sync_state_markers,
                systems::sync_animation_signals,
                systems::sync_model_facing,
                systems::update_camera_targets,
            ),
        );
    }
}

/// Backend systems that fill [`GroundSensor`](detection::GroundSensor).
///
/// Backends put their ground sensing in this set, inside
/// [`MotionControllerSet::Sensors`], so the generic ground detection sees
/// fresh data.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendSensors;
