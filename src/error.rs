//! Configuration faults.
//!
//! The per-tick loop has no recoverable errors. The only failures are
//! configuration faults, which are detected once when a controller is
//! initialized.

use thiserror::Error;

/// A configuration fault detected while initializing a controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A tunable that must be strictly positive was zero, negative or not finite.
    #[error("`{name}` must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    /// A tunable that may be zero was negative or not finite.
    #[error("`{name}` must be non-negative and finite, got {value}")]
    Negative { name: &'static str, value: f32 },

    /// A per-tick interpolation factor outside `[0, 1]`.
    #[error("`{name}` must be within [0, 1], got {value}")]
    FactorOutOfRange { name: &'static str, value: f32 },

    /// The capsule has no usable volume.
    #[error("degenerate capsule: radius {radius}, half height {half_height}")]
    DegenerateCapsule { radius: f32, half_height: f32 },

    /// The backend could not find a collider shape for the character.
    #[error("character has no capsule collider the backend can read")]
    MissingCollider,
}
