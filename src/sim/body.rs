//! Physical body and cargo seams
//!
//! The simulation never owns rigid-body integration or the item inventory;
//! it talks to them through these traits. `PointBody` and `CartItems` are
//! the minimal implementations used by the headless world and tests.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::CART_MASS;

/// A rigid body driven by an external integrator
pub trait RigidBody {
    /// Accumulate a force for the next integration step
    fn apply_force(&mut self, force: Vec3);
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn position(&self) -> Vec3;
}

/// Point mass integrated with semi-implicit Euler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointBody {
    pub pos: Vec3,
    pub vel: Vec3,
    pub mass: f32,
    /// Force accumulated since the last integration
    #[serde(skip)]
    force: Vec3,
}

impl Default for PointBody {
    fn default() -> Self {
        Self::new(Vec3::ZERO, CART_MASS)
    }
}

impl PointBody {
    pub fn new(pos: Vec3, mass: f32) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            mass: mass.max(f32::EPSILON),
            force: Vec3::ZERO,
        }
    }

    /// Force waiting to be integrated
    pub fn pending_force(&self) -> Vec3 {
        self.force
    }

    /// Advance velocity then position, consuming the accumulated force
    pub fn integrate(&mut self, dt: f32) {
        self.vel += self.force / self.mass * dt;
        self.pos += self.vel * dt;
        self.force = Vec3::ZERO;
    }
}

impl RigidBody for PointBody {
    fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    fn velocity(&self) -> Vec3 {
        self.vel
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.vel = velocity;
    }

    fn position(&self) -> Vec3 {
        self.pos
    }
}

/// Container of items carried by a cart
pub trait CargoHold {
    fn cargo_count(&self) -> u32;

    /// Drop up to `count` items, returning how many actually fell out
    fn lose_items(&mut self, count: u32) -> u32;
}

/// Count-backed cargo hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItems {
    pub count: u32,
    /// Items lost to crashes over the cart's lifetime
    #[serde(default)]
    pub lost_total: u32,
}

impl CartItems {
    pub fn with_count(count: u32) -> Self {
        Self {
            count,
            lost_total: 0,
        }
    }

    pub fn add_items(&mut self, count: u32) {
        self.count = self.count.saturating_add(count);
    }
}

impl CargoHold for CartItems {
    fn cargo_count(&self) -> u32 {
        self.count
    }

    fn lose_items(&mut self, count: u32) -> u32 {
        let lost = count.min(self.count);
        self.count -= lost;
        self.lost_total += lost;
        lost
    }
}
