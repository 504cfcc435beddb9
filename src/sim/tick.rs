//! Fixed timestep simulation tick
//!
//! One tick runs, in order:
//! 1. player commands (stick direction, dash presses)
//! 2. NPC velocities from the navigation service
//! 3. cart drive, body integration, cart settle
//! 4. contacts reported by the physics host
//! 5. timers

use std::collections::BTreeSet;

use glam::{Vec2, Vec3};

use super::body::CargoHold;
use super::collision::{CartView, ContactPartner, Victim};
use super::state::{ShopEvent, ShopState};

/// One player's input for a tick
#[derive(Debug, Clone, Copy, Default)]
pub struct CartCommand {
    pub cart: u32,
    pub move_dir: Vec2,
    /// Dash button pressed this tick
    pub dash: bool,
}

/// NPC velocity reported by navigation
#[derive(Debug, Clone, Copy)]
pub struct NpcMotion {
    pub npc: u32,
    pub velocity: Vec3,
}

/// The body a cart touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactTarget {
    Cart(u32),
    Npc(u32),
    Item,
    Static,
    Unknown,
}

/// A contact reported by the physics host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub cart: u32,
    pub other: ContactTarget,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub commands: Vec<CartCommand>,
    pub npc_motion: Vec<NpcMotion>,
    pub contacts: Vec<Contact>,
}

/// Advance the shop floor by one fixed timestep
pub fn tick(state: &mut ShopState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;

    for command in &input.commands {
        let Some(cart) = state.cart_mut(command.cart) else {
            log::debug!("Command for unknown cart {}", command.cart);
            continue;
        };
        cart.controller.provide_move_direction(command.move_dir);
        if command.dash && cart.controller.perform_dash() {
            state.events.push(ShopEvent::DashStarted { cart: command.cart });
        }
    }

    for motion in &input.npc_motion {
        match state.npc_mut(motion.npc) {
            Some(npc) => npc.record_velocity(motion.velocity, dt),
            None => log::debug!("Motion for unknown NPC {}", motion.npc),
        }
    }

    for cart in &mut state.carts {
        cart.controller.drive(&mut cart.body, dt);
        cart.body.integrate(dt);
        cart.controller.settle(&mut cart.body, dt);
    }

    // Duplicate reports of the same contact within a tick resolve once
    let mut resolved: BTreeSet<(u32, ContactTarget)> = BTreeSet::new();
    for contact in &input.contacts {
        resolve_contact(state, contact, &mut resolved);
    }

    for event in state.timers.advance(dt) {
        state.handle_timer(event);
    }
}

fn resolve_contact(state: &mut ShopState, contact: &Contact, resolved: &mut BTreeSet<(u32, ContactTarget)>) {
    let window = state.resolver().tuning().cart_speed_window;
    let Some(me) = state.cart(contact.cart).map(|c| c.view(window)) else {
        log::debug!("Contact for unknown cart {}", contact.cart);
        return;
    };

    match contact.other {
        ContactTarget::Cart(other_id) => {
            if other_id == contact.cart {
                return;
            }
            let Some(other) = state.cart(other_id).map(|c| c.view(window)) else {
                log::debug!("Contact with unknown cart {other_id}");
                return;
            };
            // Both carts feel the crash; each side is judged on the same snapshot
            if resolved.insert((contact.cart, contact.other)) {
                apply_side(state, contact.cart, me, Some(other_id), cart_partner(other));
            }
            if resolved.insert((other_id, ContactTarget::Cart(contact.cart))) {
                apply_side(state, other_id, other, Some(contact.cart), cart_partner(me));
            }
        }
        ContactTarget::Npc(npc_id) => {
            let npc_window = state.resolver().tuning().npc_speed_window;
            let Some(speed) = state.npc(npc_id).map(|n| n.smoothed_speed(npc_window)) else {
                log::debug!("Contact with unknown NPC {npc_id}");
                return;
            };
            if resolved.insert((contact.cart, contact.other)) {
                apply_side(state, contact.cart, me, None, ContactPartner::Npc { speed });
            }
        }
        target @ (ContactTarget::Item | ContactTarget::Static | ContactTarget::Unknown) => {
            let partner = match target {
                ContactTarget::Item => ContactPartner::Item,
                ContactTarget::Static => ContactPartner::Static,
                _ => ContactPartner::Unknown,
            };
            if resolved.insert((contact.cart, target)) {
                apply_side(state, contact.cart, me, None, partner);
            }
        }
    }
}

fn cart_partner(view: CartView) -> ContactPartner {
    ContactPartner::Cart {
        speed: view.speed,
        cargo: view.cargo,
    }
}

fn apply_side(state: &mut ShopState, me_id: u32, me: CartView, partner_cart: Option<u32>, partner: ContactPartner) {
    let resolution = state.resolver().resolve(me, partner);

    if resolution.reset_self_dash {
        if let Some(cart) = state.cart_mut(me_id) {
            cart.controller.reset_dash();
        }
    }

    let Some(loss) = resolution.loss() else {
        return;
    };
    let victim_id = match loss.victim {
        Victim::SelfCart => me_id,
        Victim::Partner => match partner_cart {
            Some(id) => id,
            None => return,
        },
    };
    let Some(victim) = state.cart_mut(victim_id) else {
        return;
    };
    let lost = victim.items.lose_items(loss.count);
    log::debug!("Cart {victim_id} lost {lost} items ({:?})", resolution.kind);
    state.events.push(ShopEvent::ItemsLost {
        cart: victim_id,
        count: lost,
        kind: resolution.kind,
    });
    state.react_to_hit(victim_id);
}
