//! Trolley Rush - cart movement and crash-damage core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (cart dynamics, velocity history, collisions)
//! - `curve`: Authored response curves used for dash and damage tuning
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Configuration errors raised at construction time

pub mod curve;
pub mod error;
pub mod settings;
pub mod sim;

pub use curve::{Keyframe, ResponseCurve};
pub use error::ConfigError;
pub use settings::SimConfig;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics tick)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Max change of the smoothed dash factor per second
    pub const DASH_FACTOR_RATE: f32 = 4.0;
    /// Input magnitude below which the cart keeps its facing
    pub const TURN_INPUT_DEADZONE: f32 = 0.01;

    /// Default number of samples kept in a velocity history
    pub const VELOCITY_HISTORY_LEN: usize = 64;
    /// Trailing window used to read a cart's impact speed (seconds)
    pub const CART_SPEED_WINDOW: f32 = 0.2;
    /// Trailing window used to read an NPC's impact speed (seconds)
    pub const NPC_SPEED_WINDOW: f32 = 0.1;

    /// Default cart mass (kg)
    pub const CART_MASS: f32 = 1.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

/// Rotate `current` toward `target` (radians) by at most `max_delta`,
/// taking the short way around
#[inline]
pub fn rotate_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let mut delta = normalize_angle(target) - normalize_angle(current);
    // Handle wraparound
    if delta > std::f32::consts::PI {
        delta -= std::f32::consts::TAU;
    } else if delta < -std::f32::consts::PI {
        delta += std::f32::consts::TAU;
    }
    normalize_angle(current + delta.clamp(-max_delta, max_delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_move_towards_never_overshoots() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(1.0, 0.0, 0.25), 0.75);
    }

    #[test]
    fn test_rotate_towards_wraps_short_way() {
        // From just below +PI to just above -PI is a short step across the seam
        let current = PI - 0.1;
        let target = -PI + 0.1;
        let next = rotate_towards(current, target, 0.05);
        let expected = normalize_angle(current + 0.05);
        assert!((next - expected).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_towards_reaches_target() {
        let next = rotate_towards(0.0, 0.3, 1.0);
        assert!((next - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_clamps_t() {
        assert_eq!(lerp(6.0, 12.0, 0.5), 9.0);
        assert_eq!(lerp(6.0, 12.0, 2.0), 12.0);
        assert_eq!(lerp(6.0, 12.0, -1.0), 6.0);
    }
}
