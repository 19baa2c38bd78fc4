//! Configuration errors.

use thiserror::Error;

/// A [`LocomotionConfig`](crate::config::LocomotionConfig) that breaks one of
/// its contracts.
///
/// Configuration is checked once, when a controller is spawned or its config
/// changes. Nothing inside a simulation step returns an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("mass must be positive and finite, got {0}")]
    NonPositiveMass(f32),

    #[error("movement force must be non-negative and finite, got {0}")]
    NegativeMovementForce(f32),

    #[error("{name} must lie within 0..=180 degrees, got {degrees}")]
    AngleOutOfRange { name: &'static str, degrees: f32 },

    #[error("{steeper} ({steeper_degrees}) must not be smaller than {flatter} ({flatter_degrees})")]
    InvertedThresholds {
        flatter: &'static str,
        flatter_degrees: f32,
        steeper: &'static str,
        steeper_degrees: f32,
    },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
}
