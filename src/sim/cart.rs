//! Force-based cart controller
//!
//! Each fixed tick is split around the host's body integration:
//! - `drive` picks the dash factor, computes the steering force and turns
//!   the cart toward the stick direction
//! - `settle` flattens and clamps the integrated velocity, records the speed
//!   sample and advances the button-mash window
//!
//! The dash factor that shapes speed and force is always the smoothed one.
//! It only moves at `DASH_FACTOR_RATE` per second, so force never jumps.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::history::MovingAverage;
use crate::consts::{DASH_FACTOR_RATE, TURN_INPUT_DEADZONE};
use crate::curve::ResponseCurve;
use crate::error::ConfigError;
use crate::{lerp, move_towards, rotate_towards};

/// How dash presses are turned into a dash factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashMode {
    /// Each press plays the dash curve over `dash_duration`
    #[default]
    Timed,
    /// Presses charge a meter that decays when the player stops mashing
    ButtonMash,
}

/// Cart movement tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartTuning {
    /// Top speed without dash (m/s)
    pub max_speed: f32,
    /// Top speed at full dash factor (m/s)
    pub max_speed_dashing: f32,
    /// Force per m/s of velocity error while speeding up
    pub accel_gain: f32,
    pub accel_gain_dashing: f32,
    /// Force per m/s of velocity error while slowing down or reversing
    pub brake_gain: f32,
    pub brake_gain_dashing: f32,
    /// Facing turn rate (degrees per second)
    pub turn_rate: f32,

    pub dash_mode: DashMode,
    /// Length of a timed dash (seconds)
    pub dash_duration: f32,
    /// Dash factor over normalized dash time 0..1
    pub dash_curve: ResponseCurve,
    /// Button-mash window length (seconds)
    pub mash_window: f32,
    /// Charge that maps to a full dash factor
    pub mash_max_charge: u32,

    /// Dash-trail particles per metre, by smoothed dash factor
    pub trail_emission_curve: ResponseCurve,
}

impl Default for CartTuning {
    fn default() -> Self {
        Self {
            max_speed: 6.0,
            max_speed_dashing: 12.0,
            accel_gain: 10.0,
            accel_gain_dashing: 20.0,
            brake_gain: 10.0,
            brake_gain_dashing: 14.0,
            turn_rate: 540.0,

            dash_mode: DashMode::Timed,
            dash_duration: 0.5,
            dash_curve: ResponseCurve::linear_trusted(&[(0.0, 0.0), (0.15, 1.0), (1.0, 0.0)]),
            mash_window: 0.17,
            mash_max_charge: 10,

            trail_emission_curve: ResponseCurve::linear_trusted(&[(0.0, 0.0), (0.2, 0.0), (1.0, 20.0)]),
        }
    }
}

impl CartTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("max_speed", self.max_speed)?;
        ConfigError::require_positive("max_speed_dashing", self.max_speed_dashing)?;
        ConfigError::require_non_negative("accel_gain", self.accel_gain)?;
        ConfigError::require_non_negative("accel_gain_dashing", self.accel_gain_dashing)?;
        ConfigError::require_non_negative("brake_gain", self.brake_gain)?;
        ConfigError::require_non_negative("brake_gain_dashing", self.brake_gain_dashing)?;
        ConfigError::require_non_negative("turn_rate", self.turn_rate)?;
        ConfigError::require_positive("dash_duration", self.dash_duration)?;
        ConfigError::require_positive("mash_window", self.mash_window)?;
        if self.mash_max_charge == 0 {
            return Err(ConfigError::InvalidTunable {
                name: "mash_max_charge",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Dash bookkeeping for the active mode
#[derive(Debug, Clone, Copy, PartialEq)]
enum DashState {
    Timed {
        /// Normalized dash time, 0..1
        phase: f32,
        active: bool,
    },
    Mash {
        charge: u32,
        /// A press landed in the current window
        pressed: bool,
        window_timer: f32,
    },
}

impl DashState {
    fn for_mode(mode: DashMode) -> Self {
        match mode {
            DashMode::Timed => DashState::Timed {
                phase: 0.0,
                active: false,
            },
            DashMode::ButtonMash => DashState::Mash {
                charge: 0,
                pressed: false,
                window_timer: 0.0,
            },
        }
    }
}

/// Longitudinal state of the cart for the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionState {
    #[default]
    Idle,
    Accelerating,
    Braking,
}

/// Per-cart movement controller
#[derive(Debug, Clone)]
pub struct CartController {
    tuning: CartTuning,
    move_input: Vec2,
    /// Yaw in radians; 0 faces +Z
    facing: f32,
    dash: DashState,
    dash_target: f32,
    dash_factor: f32,
    motion: MotionState,
    speed_history: MovingAverage<f32>,
    trail_emission: f32,
}

impl CartController {
    pub fn new(tuning: CartTuning, history_len: usize) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self {
            dash: DashState::for_mode(tuning.dash_mode),
            tuning,
            move_input: Vec2::ZERO,
            facing: 0.0,
            dash_target: 0.0,
            dash_factor: 0.0,
            motion: MotionState::Idle,
            speed_history: MovingAverage::new(history_len),
            trail_emission: 0.0,
        })
    }

    /// Latest stick direction, clamped to unit length
    pub fn provide_move_direction(&mut self, direction: Vec2) {
        self.move_input = if direction.is_finite() {
            direction.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
    }

    /// Register a dash press
    ///
    /// Timed mode restarts the dash curve. Button-mash mode only flags the
    /// press; the window tick turns it into charge, so several presses in one
    /// window count once. Returns true when a dash starts from rest.
    pub fn perform_dash(&mut self) -> bool {
        match &mut self.dash {
            DashState::Timed { phase, active } => {
                let started = !*active;
                *phase = 0.0;
                *active = true;
                started
            }
            DashState::Mash { charge, pressed, .. } => {
                let started = *charge == 0 && !*pressed;
                *pressed = true;
                started
            }
        }
    }

    /// Drop any dash in progress (rammed something or got hit)
    ///
    /// The smoothed factor is left to decay at the usual bounded rate.
    pub fn reset_dash(&mut self) {
        self.dash = DashState::for_mode(self.tuning.dash_mode);
        self.dash_target = 0.0;
    }

    /// Phase one of the tick: steering force and facing
    pub fn drive(&mut self, body: &mut impl RigidBody, dt: f32) {
        self.dash_target = self.advance_dash(dt);
        self.dash_factor = move_towards(self.dash_factor, self.dash_target, DASH_FACTOR_RATE * dt);

        let velocity = body.velocity();
        let desired = Vec3::new(self.move_input.x, 0.0, self.move_input.y) * self.current_max_speed();
        let force_delta = desired - velocity;

        // Angle between correction and velocity above 90 degrees means slowing down
        let braking = force_delta.dot(velocity) < 0.0;
        let gain = if braking {
            lerp(self.tuning.brake_gain, self.tuning.brake_gain_dashing, self.dash_factor)
        } else {
            lerp(self.tuning.accel_gain, self.tuning.accel_gain_dashing, self.dash_factor)
        };
        body.apply_force(force_delta * gain);

        self.motion = if desired == Vec3::ZERO && velocity.length_squared() < 1e-6 {
            MotionState::Idle
        } else if braking {
            MotionState::Braking
        } else {
            MotionState::Accelerating
        };

        if self.move_input.length() > TURN_INPUT_DEADZONE {
            let target = self.move_input.x.atan2(self.move_input.y);
            let max_step = self.tuning.turn_rate.to_radians() * dt;
            self.facing = rotate_towards(self.facing, target, max_step);
        }
    }

    /// Phase two of the tick, after the body has been integrated
    pub fn settle(&mut self, body: &mut impl RigidBody, dt: f32) {
        let mut velocity = body.velocity();
        velocity.y = 0.0;
        let max_speed = self.current_max_speed();
        if velocity.length() > max_speed {
            velocity = velocity.normalize_or_zero() * max_speed;
        }
        body.set_velocity(velocity);

        self.speed_history.add_value(velocity.length(), dt);
        self.advance_mash_window(dt);
        self.trail_emission = self.tuning.trail_emission_curve.evaluate(self.dash_factor);
    }

    /// Speed limit for the current smoothed dash factor
    pub fn current_max_speed(&self) -> f32 {
        lerp(self.tuning.max_speed, self.tuning.max_speed_dashing, self.dash_factor)
    }

    /// Smoothed dash factor, 0..1
    pub fn dash_factor(&self) -> f32 {
        self.dash_factor
    }

    /// Unsmoothed dash factor the smoothed one is heading toward
    pub fn dash_target(&self) -> f32 {
        self.dash_target
    }

    pub fn is_dashing(&self) -> bool {
        match self.dash {
            DashState::Timed { active, .. } => active,
            DashState::Mash { charge, .. } => charge > 0,
        }
    }

    /// Button-mash charge, `None` in timed mode
    pub fn mash_charge(&self) -> Option<u32> {
        match self.dash {
            DashState::Mash { charge, .. } => Some(charge),
            DashState::Timed { .. } => None,
        }
    }

    pub fn motion(&self) -> MotionState {
        self.motion
    }

    /// Facing yaw in radians
    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn move_input(&self) -> Vec2 {
        self.move_input
    }

    pub fn speed_history(&self) -> &MovingAverage<f32> {
        &self.speed_history
    }

    /// Dash-trail emission rate computed by the last `settle`
    pub fn trail_emission(&self) -> f32 {
        self.trail_emission
    }

    pub fn tuning(&self) -> &CartTuning {
        &self.tuning
    }

    fn advance_dash(&mut self, dt: f32) -> f32 {
        match &mut self.dash {
            DashState::Mash { charge, .. } => *charge as f32 / self.tuning.mash_max_charge as f32,
            DashState::Timed { phase, active } => {
                if !*active {
                    return 0.0;
                }
                *phase += dt / self.tuning.dash_duration;
                if *phase >= 1.0 {
                    *phase = 1.0;
                    *active = false;
                    return 0.0;
                }
                self.tuning.dash_curve.evaluate(*phase)
            }
        }
    }

    fn advance_mash_window(&mut self, dt: f32) {
        let window = self.tuning.mash_window;
        let max_charge = self.tuning.mash_max_charge;
        if let DashState::Mash {
            charge,
            pressed,
            window_timer,
        } = &mut self.dash
        {
            *window_timer += dt;
            if *window_timer > window {
                if *pressed {
                    *charge += 1;
                    *pressed = false;
                } else {
                    *charge = charge.saturating_sub(3);
                }
                *window_timer -= window;
                *charge = (*charge).min(max_charge);
            }
        }
    }
}
