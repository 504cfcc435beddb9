//! Contact classification and crash resolution
//!
//! Every contact is seen from one cart's side ("self"). The partner is
//! described once, at contact time, by a `ContactPartner` value carrying the
//! smoothed speed and cargo it needs. Resolution is a pure decision; the
//! world applies it.
//!
//! Rules:
//! - cart vs cart: the faster cart is never the victim. If self is not
//!   slower and is above `min_velocity_for_hit`, self loses its dash and the
//!   partner loses items
//! - cart vs static: self loses its dash; above the hit threshold self loses
//!   items at the dampened rate
//! - cart vs cashier: a moving NPC knocks items out of self with its own curve
//! - loose items never cause damage

use serde::{Deserialize, Serialize};

use super::damage::CrashDamageModel;
use crate::consts::{CART_SPEED_WINDOW, NPC_SPEED_WINDOW};
use crate::error::ConfigError;

/// Collision tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Slowest impact (m/s) that can knock items loose
    pub min_velocity_for_hit: f32,
    /// Trailing window for a cart's impact speed (seconds)
    pub cart_speed_window: f32,
    /// Trailing window for an NPC's impact speed (seconds)
    pub npc_speed_window: f32,
    /// A cart ignores further crash shakes for this long (seconds)
    pub crash_shake_cooldown: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            min_velocity_for_hit: 8.0,
            cart_speed_window: CART_SPEED_WINDOW,
            npc_speed_window: NPC_SPEED_WINDOW,
            crash_shake_cooldown: 0.5,
        }
    }
}

impl CollisionTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_non_negative("min_velocity_for_hit", self.min_velocity_for_hit)?;
        ConfigError::require_non_negative("cart_speed_window", self.cart_speed_window)?;
        ConfigError::require_non_negative("npc_speed_window", self.npc_speed_window)?;
        ConfigError::require_non_negative("crash_shake_cooldown", self.crash_shake_cooldown)?;
        Ok(())
    }
}

/// What the cart ran into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactPartner {
    /// Another cart, with its smoothed speed and cargo
    Cart { speed: f32, cargo: u32 },
    /// A walking NPC, with its smoothed speed
    Npc { speed: f32 },
    /// A loose shop item
    Item,
    /// Shelves, walls, anything that does not move
    Static,
    /// A body without any known capability
    Unknown,
}

/// Collision category after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    OtherCart,
    Cashier,
    Static,
    Ignored,
}

/// Self's side of the contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartView {
    /// Smoothed speed over the cart window
    pub speed: f32,
    pub cargo: u32,
}

/// Who drops the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Victim {
    SelfCart,
    Partner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLoss {
    pub victim: Victim,
    /// May be zero; hit reactions only play for a positive loss
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to resolve
    Ignored,
    /// The partner cart was faster, so self is not the attacker
    PartnerFaster,
    /// Self was below the hit threshold; damage was never computed
    TooSlow,
    /// Damage was computed
    Damage(ItemLoss),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub kind: CollisionKind,
    /// Self loses its dash bonus
    pub reset_self_dash: bool,
    pub outcome: Outcome,
}

impl Resolution {
    /// Items lost, if damage was computed and non-zero
    pub fn loss(&self) -> Option<ItemLoss> {
        match self.outcome {
            Outcome::Damage(loss) if loss.count > 0 => Some(loss),
            _ => None,
        }
    }
}

/// Turns contacts into resolutions
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    tuning: CollisionTuning,
    damage: CrashDamageModel,
}

impl CollisionResolver {
    pub fn new(tuning: CollisionTuning, damage: CrashDamageModel) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self { tuning, damage })
    }

    pub fn tuning(&self) -> &CollisionTuning {
        &self.tuning
    }

    pub fn damage_model(&self) -> &CrashDamageModel {
        &self.damage
    }

    /// Decide the collision category
    pub fn classify(&self, partner: &ContactPartner) -> CollisionKind {
        match *partner {
            ContactPartner::Cart { .. } => CollisionKind::OtherCart,
            ContactPartner::Npc { speed } if speed > self.damage.min_cashier_speed_for_damage() => {
                CollisionKind::Cashier
            }
            ContactPartner::Npc { .. } | ContactPartner::Static => CollisionKind::Static,
            ContactPartner::Item => CollisionKind::Ignored,
            ContactPartner::Unknown => {
                log::warn!("Contact with an unclassified body, treating it as static");
                CollisionKind::Static
            }
        }
    }

    /// Resolve a contact from self's side
    pub fn resolve(&self, me: CartView, partner: ContactPartner) -> Resolution {
        let kind = self.classify(&partner);
        match (kind, partner) {
            (CollisionKind::OtherCart, ContactPartner::Cart { speed, cargo }) => self.against_cart(me, speed, cargo),
            (CollisionKind::Cashier, ContactPartner::Npc { speed }) => {
                let count = self.damage.compute_items_to_lose_for_cashier(me.cargo, speed);
                Resolution {
                    kind,
                    reset_self_dash: false,
                    outcome: Outcome::Damage(ItemLoss {
                        victim: Victim::SelfCart,
                        count,
                    }),
                }
            }
            (CollisionKind::Static, _) => self.against_static(me),
            _ => Resolution {
                kind: CollisionKind::Ignored,
                reset_self_dash: false,
                outcome: Outcome::Ignored,
            },
        }
    }

    fn against_cart(&self, me: CartView, other_speed: f32, other_cargo: u32) -> Resolution {
        let kind = CollisionKind::OtherCart;
        if other_speed > me.speed {
            return Resolution {
                kind,
                reset_self_dash: false,
                outcome: Outcome::PartnerFaster,
            };
        }
        if me.speed < self.tuning.min_velocity_for_hit {
            return Resolution {
                kind,
                reset_self_dash: false,
                outcome: Outcome::TooSlow,
            };
        }
        let count = self.damage.compute_items_to_lose(other_cargo, me.speed, true);
        Resolution {
            kind,
            reset_self_dash: true,
            outcome: Outcome::Damage(ItemLoss {
                victim: Victim::Partner,
                count,
            }),
        }
    }

    fn against_static(&self, me: CartView) -> Resolution {
        let outcome = if me.speed < self.tuning.min_velocity_for_hit {
            Outcome::TooSlow
        } else {
            Outcome::Damage(ItemLoss {
                victim: Victim::SelfCart,
                count: self.damage.compute_items_to_lose(me.cargo, me.speed, false),
            })
        };
        Resolution {
            kind: CollisionKind::Static,
            reset_self_dash: true,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ResponseCurve;
    use crate::sim::damage::CrashConfig;

    fn resolver() -> CollisionResolver {
        // damage = speed / 2, vulnerability = 1 per item up to 10
        let damage = CrashDamageModel::new(CrashConfig {
            speed_to_damage: ResponseCurve::linear(&[(0.0, 0.0), (20.0, 10.0)]).unwrap(),
            cargo_to_vulnerability: ResponseCurve::linear(&[(0.0, 0.0), (10.0, 1.0)]).unwrap(),
            reduction_if_not_against_other_cart: 0.5,
            cashier_damage_by_speed: Some(ResponseCurve::constant(2.0)),
            min_cashier_speed_for_damage: 1.5,
        })
        .unwrap();
        CollisionResolver::new(CollisionTuning::default(), damage).unwrap()
    }

    #[test]
    fn test_attacker_knocks_items_out_of_slower_cart() {
        let resolver = resolver();
        let me = CartView { speed: 10.0, cargo: 4 };
        let res = resolver.resolve(me, ContactPartner::Cart { speed: 0.0, cargo: 10 });

        let expected = resolver.damage_model().compute_items_to_lose(10, 10.0, true);
        assert_eq!(res.kind, CollisionKind::OtherCart);
        assert!(res.reset_self_dash);
        assert_eq!(
            res.outcome,
            Outcome::Damage(ItemLoss {
                victim: Victim::Partner,
                count: expected
            })
        );
        assert_eq!(expected, 5);
    }

    #[test]
    fn test_victim_side_does_nothing() {
        // Same crash seen from the stationary cart
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 0.0, cargo: 10 }, ContactPartner::Cart { speed: 10.0, cargo: 4 });
        assert_eq!(res.outcome, Outcome::PartnerFaster);
        assert!(!res.reset_self_dash);
    }

    #[test]
    fn test_faster_partner_is_never_penalized() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 3.0, cargo: 5 }, ContactPartner::Cart { speed: 10.0, cargo: 5 });
        assert_eq!(res.outcome, Outcome::PartnerFaster);
        assert_eq!(res.loss(), None);
    }

    #[test]
    fn test_slow_ram_is_harmless() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 7.0, cargo: 5 }, ContactPartner::Cart { speed: 1.0, cargo: 5 });
        assert_eq!(res.outcome, Outcome::TooSlow);
        assert!(!res.reset_self_dash);
    }

    #[test]
    fn test_static_below_threshold_resets_dash_only() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 5.0, cargo: 10 }, ContactPartner::Static);
        assert_eq!(res.kind, CollisionKind::Static);
        assert!(res.reset_self_dash);
        assert_eq!(res.outcome, Outcome::TooSlow);
    }

    #[test]
    fn test_static_above_threshold_is_dampened() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 12.0, cargo: 10 }, ContactPartner::Static);
        // 6 damage * 1.0 vulnerability * 0.5
        assert_eq!(
            res.loss(),
            Some(ItemLoss {
                victim: Victim::SelfCart,
                count: 3
            })
        );
    }

    #[test]
    fn test_moving_cashier_hurts_self() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 0.0, cargo: 10 }, ContactPartner::Npc { speed: 2.0 });
        assert_eq!(res.kind, CollisionKind::Cashier);
        assert!(!res.reset_self_dash);
        assert_eq!(
            res.loss(),
            Some(ItemLoss {
                victim: Victim::SelfCart,
                count: 2
            })
        );
    }

    #[test]
    fn test_slow_cashier_is_just_an_obstacle() {
        let resolver = resolver();
        let partner = ContactPartner::Npc { speed: 1.0 };
        assert_eq!(resolver.classify(&partner), CollisionKind::Static);

        let res = resolver.resolve(CartView { speed: 0.0, cargo: 10 }, partner);
        assert_eq!(res.kind, CollisionKind::Static);
        assert_eq!(res.outcome, Outcome::TooSlow);
    }

    #[test]
    fn test_items_are_ignored() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 20.0, cargo: 10 }, ContactPartner::Item);
        assert_eq!(res.kind, CollisionKind::Ignored);
        assert_eq!(res.outcome, Outcome::Ignored);
        assert!(!res.reset_self_dash);
    }

    #[test]
    fn test_unknown_partner_falls_back_to_static() {
        let resolver = resolver();
        assert_eq!(resolver.classify(&ContactPartner::Unknown), CollisionKind::Static);
    }

    #[test]
    fn test_zero_loss_has_no_reaction() {
        let resolver = resolver();
        let res = resolver.resolve(CartView { speed: 10.0, cargo: 0 }, ContactPartner::Cart { speed: 0.0, cargo: 0 });
        assert!(matches!(res.outcome, Outcome::Damage(ItemLoss { count: 0, .. })));
        assert_eq!(res.loss(), None);
    }
}
