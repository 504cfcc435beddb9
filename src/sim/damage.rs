//! Crash damage model
//!
//! Impact speed and cargo load go through two authored curves and multiply
//! into a number of items knocked out of the cart.

use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::error::ConfigError;

/// Authored crash tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashConfig {
    /// Impact speed (m/s) to damage
    pub speed_to_damage: ResponseCurve,
    /// Items in cart to damage multiplier
    pub cargo_to_vulnerability: ResponseCurve,
    /// Damage multiplier when the partner is not another cart
    pub reduction_if_not_against_other_cart: f32,
    /// NPC speed (m/s) to damage; falls back to `speed_to_damage` when absent
    pub cashier_damage_by_speed: Option<ResponseCurve>,
    /// NPCs slower than this cannot hurt a cart
    pub min_cashier_speed_for_damage: f32,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            speed_to_damage: ResponseCurve::linear_trusted(&[(0.0, 0.0), (6.0, 0.0), (12.0, 4.0)]),
            cargo_to_vulnerability: ResponseCurve::linear_trusted(&[(0.0, 0.0), (10.0, 1.0), (20.0, 1.5)]),
            reduction_if_not_against_other_cart: 0.5,
            cashier_damage_by_speed: Some(ResponseCurve::linear_trusted(&[(0.0, 0.0), (1.5, 1.0), (4.0, 3.0)])),
            min_cashier_speed_for_damage: 1.5,
        }
    }
}

impl CrashConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_non_negative(
            "reduction_if_not_against_other_cart",
            self.reduction_if_not_against_other_cart,
        )?;
        ConfigError::require_non_negative("min_cashier_speed_for_damage", self.min_cashier_speed_for_damage)?;
        Ok(())
    }
}

/// Maps impacts to item loss
#[derive(Debug, Clone)]
pub struct CrashDamageModel {
    config: CrashConfig,
}

impl CrashDamageModel {
    pub fn new(config: CrashConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CrashConfig {
        &self.config
    }

    pub fn min_cashier_speed_for_damage(&self) -> f32 {
        self.config.min_cashier_speed_for_damage
    }

    /// Items a cart holding `cargo` loses from an impact at `speed`
    pub fn compute_items_to_lose(&self, cargo: u32, speed: f32, against_other_cart: bool) -> u32 {
        let damage = self.config.speed_to_damage.evaluate(speed);
        let vulnerability = self.config.cargo_to_vulnerability.evaluate(cargo as f32);
        let reduction = if against_other_cart {
            1.0
        } else {
            self.config.reduction_if_not_against_other_cart
        };
        let amount = damage * vulnerability * reduction;
        log::debug!(
            "Crash ({}): speed {speed:.2}, vulnerability {vulnerability:.2}, items to lose {amount:.2}",
            if against_other_cart { "cart" } else { "static" }
        );
        round_loss(amount)
    }

    /// Items a cart holding `cargo` loses when an NPC runs into it at `npc_speed`
    pub fn compute_items_to_lose_for_cashier(&self, cargo: u32, npc_speed: f32) -> u32 {
        let curve = self
            .config
            .cashier_damage_by_speed
            .as_ref()
            .unwrap_or(&self.config.speed_to_damage);
        let damage = curve.evaluate(npc_speed);
        let vulnerability = self.config.cargo_to_vulnerability.evaluate(cargo as f32);
        let amount = damage * vulnerability;
        log::debug!("Cashier crash: speed {npc_speed:.2}, vulnerability {vulnerability:.2}, items to lose {amount:.2}");
        round_loss(amount)
    }
}

/// Round half to even, never below zero
fn round_loss(amount: f32) -> u32 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    amount.round_ties_even() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with(speed: &[(f32, f32)], cargo: &[(f32, f32)]) -> CrashDamageModel {
        CrashDamageModel::new(CrashConfig {
            speed_to_damage: ResponseCurve::linear(speed).unwrap(),
            cargo_to_vulnerability: ResponseCurve::linear(cargo).unwrap(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_empty_cart_loses_nothing() {
        let model = CrashDamageModel::new(CrashConfig::default()).unwrap();
        for speed in [0.0, 5.0, 10.0, 50.0] {
            assert_eq!(model.compute_items_to_lose(0, speed, true), 0);
            assert_eq!(model.compute_items_to_lose(0, speed, false), 0);
        }
    }

    #[test]
    fn test_damage_times_vulnerability() {
        // damage = speed / 2, vulnerability = cargo / 10
        let model = model_with(&[(0.0, 0.0), (20.0, 10.0)], &[(0.0, 0.0), (10.0, 1.0)]);
        assert_eq!(model.compute_items_to_lose(10, 10.0, true), 5);
        assert_eq!(model.compute_items_to_lose(5, 12.0, true), 3);
    }

    #[test]
    fn test_static_collisions_are_dampened() {
        let model = model_with(&[(0.0, 0.0), (20.0, 10.0)], &[(0.0, 1.0), (1.0, 1.0)]);
        assert_eq!(model.compute_items_to_lose(4, 16.0, true), 8);
        assert_eq!(model.compute_items_to_lose(4, 16.0, false), 4);
    }

    #[test]
    fn test_rounds_half_to_even() {
        // Sampling exactly on keys keeps the products exact
        let model = CrashDamageModel::new(CrashConfig {
            speed_to_damage: ResponseCurve::linear(&[(0.0, 0.0), (5.0, 5.0), (6.8, 6.8), (7.0, 7.0), (10.0, 10.0)])
                .unwrap(),
            cargo_to_vulnerability: ResponseCurve::constant(0.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(model.compute_items_to_lose(1, 5.0, true), 2);
        assert_eq!(model.compute_items_to_lose(1, 7.0, true), 4);
        assert_eq!(model.compute_items_to_lose(1, 6.8, true), 3);
    }

    #[test]
    fn test_negative_curves_clamp_to_zero() {
        let model = model_with(&[(0.0, -5.0), (10.0, -5.0)], &[(0.0, 1.0), (1.0, 1.0)]);
        assert_eq!(model.compute_items_to_lose(3, 8.0, true), 0);
    }

    #[test]
    fn test_cashier_uses_own_curve() {
        let model = CrashDamageModel::new(CrashConfig {
            speed_to_damage: ResponseCurve::constant(100.0),
            cargo_to_vulnerability: ResponseCurve::constant(1.0),
            cashier_damage_by_speed: Some(ResponseCurve::linear(&[(0.0, 0.0), (4.0, 4.0)]).unwrap()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(model.compute_items_to_lose_for_cashier(5, 2.0), 2);
    }

    #[test]
    fn test_cashier_falls_back_to_speed_curve() {
        let model = CrashDamageModel::new(CrashConfig {
            speed_to_damage: ResponseCurve::constant(3.0),
            cargo_to_vulnerability: ResponseCurve::constant(1.0),
            cashier_damage_by_speed: None,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(model.compute_items_to_lose_for_cashier(5, 2.0), 3);
    }

    #[test]
    fn test_rejects_negative_reduction() {
        let config = CrashConfig {
            reduction_if_not_against_other_cart: -0.5,
            ..Default::default()
        };
        assert!(CrashDamageModel::new(config).is_err());
    }
}
