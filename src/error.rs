//! Configuration errors
//!
//! Everything that can go wrong in this crate goes wrong at construction
//! time; the per-tick simulation itself is infallible.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("curve `{0}` has no keyframes")]
    EmptyCurve(&'static str),

    #[error("curve keyframe times must be strictly increasing (key {index} at t={time})")]
    UnsortedKeys { index: usize, time: f32 },

    #[error("curve keyframe {index} has a non-finite component")]
    NonFiniteKey { index: usize },

    #[error("invalid tunable `{name}`: {value} ({reason})")]
    InvalidTunable {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Reject `value` unless it is finite and strictly positive
    pub fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidTunable {
                name,
                value,
                reason: "must be finite and > 0",
            })
        }
    }

    /// Reject `value` unless it is finite and not negative
    pub fn require_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidTunable {
                name,
                value,
                reason: "must be finite and >= 0",
            })
        }
    }
}
