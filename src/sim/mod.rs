//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by entity ID)
//! - Physics bodies and cargo reached only through the `body` traits
//! - No rendering or platform dependencies

pub mod body;
pub mod cart;
pub mod collision;
pub mod damage;
pub mod history;
pub mod schedule;
pub mod state;
pub mod tick;

pub use body::{CargoHold, CartItems, PointBody, RigidBody};
pub use cart::{CartController, CartTuning, DashMode, MotionState};
pub use collision::{
    CartView, CollisionKind, CollisionResolver, CollisionTuning, ContactPartner, ItemLoss, Outcome, Resolution,
    Victim,
};
pub use damage::{CrashConfig, CrashDamageModel};
pub use history::{MovingAverage, Summable, TimedSample};
pub use schedule::{Scheduler, TimerId};
pub use state::{Cart, Npc, ShopEvent, ShopState, TimerEvent};
pub use tick::{CartCommand, Contact, ContactTarget, NpcMotion, TickInput, tick};
