//! Shop floor state and core simulation types
//!
//! Owns every cart and NPC on the floor together with the collision
//! resolver, the timer queue and the outgoing presentation events.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::{CartItems, PointBody, RigidBody};
use super::cart::{CartController, CartTuning};
use super::collision::{CartView, CollisionKind, CollisionResolver};
use super::damage::CrashDamageModel;
use super::history::MovingAverage;
use super::schedule::{Scheduler, TimerId};
use crate::consts::CART_MASS;
use crate::error::ConfigError;
use crate::settings::SimConfig;

/// Presentation-facing events, drained by the host each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopEvent {
    /// A dash started from rest
    DashStarted { cart: u32 },
    /// Shake the cart's basket
    CrashShake { cart: u32 },
    /// Play the driver's hit animation
    HitAnimation { cart: u32 },
    /// Play the crash sound
    HitSound { cart: u32 },
    /// Items fell out of a cart
    ItemsLost { cart: u32, count: u32, kind: CollisionKind },
}

/// Internal timer payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    ShakeCooldownOver { cart: u32 },
}

/// A player's cart
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: u32,
    pub controller: CartController,
    pub body: PointBody,
    pub items: CartItems,
    /// Pending shake cooldown; shakes are suppressed while set
    pub shake_cooldown: Option<TimerId>,
}

impl Cart {
    /// Smoothed speed and cargo, as seen by a collision
    pub fn view(&self, window: f32) -> CartView {
        CartView {
            speed: self.controller.speed_history().average(window),
            cargo: self.items.count,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.body.position()
    }
}

/// A walking NPC; its motion comes from the navigation service
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    pub speed_history: MovingAverage<f32>,
}

impl Npc {
    pub fn new(id: u32, pos: Vec3, history_len: usize) -> Self {
        Self {
            id,
            pos,
            vel: Vec3::ZERO,
            speed_history: MovingAverage::new(history_len),
        }
    }

    /// Take this tick's velocity from the navigation service
    pub fn record_velocity(&mut self, velocity: Vec3, dt: f32) {
        self.vel = velocity;
        self.pos += velocity * dt;
        self.speed_history.add_value(velocity.length(), dt);
    }

    pub fn smoothed_speed(&self, window: f32) -> f32 {
        self.speed_history.average(window)
    }
}

/// Complete shop floor state
#[derive(Debug, Clone)]
pub struct ShopState {
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Active carts (sorted by id for determinism)
    pub carts: Vec<Cart>,
    /// Active NPCs (sorted by id for determinism)
    pub npcs: Vec<Npc>,
    /// Events produced since the last drain
    pub events: Vec<ShopEvent>,
    pub(crate) resolver: CollisionResolver,
    pub(crate) timers: Scheduler<TimerEvent>,
    cart_tuning: CartTuning,
    history_len: usize,
    next_id: u32,
}

impl ShopState {
    /// Build an empty floor, validating the whole configuration up front
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let damage = CrashDamageModel::new(config.crash)?;
        let resolver = CollisionResolver::new(config.collision, damage)?;
        Ok(Self {
            time_ticks: 0,
            carts: Vec::new(),
            npcs: Vec::new(),
            events: Vec::new(),
            resolver,
            timers: Scheduler::new(),
            cart_tuning: config.cart,
            history_len: config.history_len,
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    /// Spawn a cart at `pos` already holding `cargo` items
    pub fn spawn_cart(&mut self, pos: Vec3, cargo: u32) -> Result<u32, ConfigError> {
        let controller = CartController::new(self.cart_tuning.clone(), self.history_len)?;
        let id = self.next_entity_id();
        self.carts.push(Cart {
            id,
            controller,
            body: PointBody::new(pos, CART_MASS),
            items: CartItems::with_count(cargo),
            shake_cooldown: None,
        });
        log::info!("Spawned cart {id} at {pos} with {cargo} items");
        Ok(id)
    }

    pub fn spawn_npc(&mut self, pos: Vec3) -> u32 {
        let id = self.next_entity_id();
        self.npcs.push(Npc::new(id, pos, self.history_len));
        log::info!("Spawned NPC {id} at {pos}");
        id
    }

    /// Remove a cart and kill its pending timers
    pub fn despawn_cart(&mut self, id: u32) -> Option<Cart> {
        let index = self.carts.iter().position(|c| c.id == id)?;
        let cart = self.carts.remove(index);
        if let Some(timer) = cart.shake_cooldown {
            self.timers.cancel(timer);
        }
        Some(cart)
    }

    pub fn despawn_npc(&mut self, id: u32) -> Option<Npc> {
        let index = self.npcs.iter().position(|n| n.id == id)?;
        Some(self.npcs.remove(index))
    }

    pub fn cart(&self, id: u32) -> Option<&Cart> {
        self.carts.iter().find(|c| c.id == id)
    }

    pub fn cart_mut(&mut self, id: u32) -> Option<&mut Cart> {
        self.carts.iter_mut().find(|c| c.id == id)
    }

    pub fn npc(&self, id: u32) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == id)
    }

    pub fn npc_mut(&mut self, id: u32) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id == id)
    }

    /// Hand the accumulated events to the presentation layer
    pub fn drain_events(&mut self) -> Vec<ShopEvent> {
        std::mem::take(&mut self.events)
    }

    /// Play the hit reactions on a cart that just lost items
    pub(crate) fn react_to_hit(&mut self, cart_id: u32) {
        let cooldown = self.resolver.tuning().crash_shake_cooldown;
        let Some(index) = self.carts.iter().position(|c| c.id == cart_id) else {
            return;
        };
        if self.carts[index].shake_cooldown.is_none() {
            self.events.push(ShopEvent::CrashShake { cart: cart_id });
            let timer = self.timers.schedule(cooldown, TimerEvent::ShakeCooldownOver { cart: cart_id });
            self.carts[index].shake_cooldown = Some(timer);
        }
        self.events.push(ShopEvent::HitAnimation { cart: cart_id });
        self.events.push(ShopEvent::HitSound { cart: cart_id });
    }

    /// Apply fired timers
    pub(crate) fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::ShakeCooldownOver { cart } => {
                if let Some(cart) = self.cart_mut(cart) {
                    cart.shake_cooldown = None;
                }
            }
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.carts.sort_by_key(|c| c.id);
        self.npcs.sort_by_key(|n| n.id);
    }
}
