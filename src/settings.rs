//! Simulation tuning
//!
//! Persisted as JSON next to the game data. Missing fields fall back to the
//! shipped defaults, so a file only needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::VELOCITY_HISTORY_LEN;
use crate::error::ConfigError;
use crate::sim::cart::CartTuning;
use crate::sim::collision::CollisionTuning;
use crate::sim::damage::CrashConfig;

/// Everything a shop floor needs to be built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cart movement and dash
    pub cart: CartTuning,
    /// Damage curves
    pub crash: CrashConfig,
    /// Hit threshold, speed windows and shake cooldown
    pub collision: CollisionTuning,
    /// Samples kept per velocity history
    pub history_len: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cart: CartTuning::default(),
            crash: CrashConfig::default(),
            collision: CollisionTuning::default(),
            history_len: VELOCITY_HISTORY_LEN,
        }
    }
}

impl SimConfig {
    /// Check every tunable; curves were already checked when parsed
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cart.validate()?;
        self.crash.validate()?;
        self.collision.validate()?;
        if self.history_len == 0 {
            return Err(ConfigError::InvalidTunable {
                name: "history_len",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(config)
    }

    /// Write tuning to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Tuning saved to {}", path.display());
        Ok(())
    }
}
