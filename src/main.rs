//! Trolley Rush headless demo
//!
//! Drives a small shop floor with seeded random players and prints what
//! happened. Usage: `trolley-rush [tuning.json] [seed]`

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use trolley_rush::consts::{MAX_SUBSTEPS, SIM_DT};
use trolley_rush::sim::{CartCommand, Contact, ContactTarget, NpcMotion, ShopEvent, ShopState, TickInput, tick};
use trolley_rush::{ConfigError, SimConfig};

/// Half extent of the square shop floor (metres)
const FLOOR_HALF_EXTENT: f32 = 12.0;
/// Carts touching closer than this collide
const CART_CONTACT_DIST: f32 = 1.2;
const NPC_CONTACT_DIST: f32 = 0.9;
const NPC_WALK_SPEED: f32 = 2.0;
const DEMO_SECONDS: f32 = 30.0;

struct Demo {
    state: ShopState,
    rng: Pcg32,
    accumulator: f32,
    /// Per-cart stick direction, re-rolled now and then
    sticks: Vec<(u32, Vec2)>,
    npc_dir: f32,
}

impl Demo {
    fn new(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut state = ShopState::new(config)?;
        let mut sticks = Vec::new();
        for (i, cargo) in [12, 6, 0].into_iter().enumerate() {
            let pos = Vec3::new(-4.0 + 4.0 * i as f32, 0.0, 0.0);
            sticks.push((state.spawn_cart(pos, cargo)?, Vec2::ZERO));
        }
        state.spawn_npc(Vec3::new(0.0, 0.0, 6.0));
        state.normalize_order();

        Ok(Self {
            state,
            rng: Pcg32::seed_from_u64(seed),
            accumulator: 0.0,
            sticks,
            npc_dir: 1.0,
        })
    }

    /// Run fixed ticks for one rendered frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.gather_input();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            for event in self.state.drain_events() {
                report(&event);
            }
        }
    }

    fn gather_input(&mut self) -> TickInput {
        let mut input = TickInput::default();

        for (cart, stick) in &mut self.sticks {
            if self.rng.random_bool(0.02) {
                *stick = Vec2::new(self.rng.random_range(-1.0..1.0), self.rng.random_range(-1.0..1.0));
            }
            input.commands.push(CartCommand {
                cart: *cart,
                move_dir: *stick,
                dash: self.rng.random_bool(0.01),
            });
        }

        for npc in &self.state.npcs {
            if npc.pos.x.abs() > FLOOR_HALF_EXTENT * 0.5 {
                self.npc_dir = -npc.pos.x.signum();
            }
            input.npc_motion.push(NpcMotion {
                npc: npc.id,
                velocity: Vec3::new(self.npc_dir * NPC_WALK_SPEED, 0.0, 0.0),
            });
        }

        input.contacts = self.detect_contacts();
        input
    }

    /// Stand-in for the physics host's contact reports
    fn detect_contacts(&mut self) -> Vec<Contact> {
        let mut contacts = Vec::new();
        let carts = &mut self.state.carts;

        for i in 0..carts.len() {
            for j in (i + 1)..carts.len() {
                if carts[i].position().distance(carts[j].position()) < CART_CONTACT_DIST {
                    contacts.push(Contact {
                        cart: carts[i].id,
                        other: ContactTarget::Cart(carts[j].id),
                    });
                }
            }
            for npc in &self.state.npcs {
                if carts[i].position().distance(npc.pos) < NPC_CONTACT_DIST {
                    contacts.push(Contact {
                        cart: carts[i].id,
                        other: ContactTarget::Npc(npc.id),
                    });
                }
            }

            // Shelves line the floor edge; bounce off them
            let body = &mut carts[i].body;
            let clamped = body.pos.clamp(Vec3::splat(-FLOOR_HALF_EXTENT), Vec3::splat(FLOOR_HALF_EXTENT));
            if clamped != body.pos {
                body.pos = clamped;
                body.vel = -body.vel * 0.3;
                contacts.push(Contact {
                    cart: carts[i].id,
                    other: ContactTarget::Static,
                });
            }
        }
        contacts
    }
}

fn report(event: &ShopEvent) {
    match event {
        ShopEvent::DashStarted { cart } => log::debug!("Cart {cart} dashes"),
        ShopEvent::ItemsLost { cart, count, kind } => {
            log::info!("Cart {cart} dropped {count} items ({kind:?})")
        }
        ShopEvent::CrashShake { cart } => log::debug!("Cart {cart} shakes"),
        ShopEvent::HitAnimation { .. } | ShopEvent::HitSound { .. } => {}
    }
}

fn run() -> Result<(), ConfigError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let mut demo = Demo::new(config, seed)?;
    let mut elapsed = 0.0;
    while elapsed < DEMO_SECONDS {
        // Uneven frame pacing around 60 FPS
        let frame = 1.0 / 60.0 + demo.rng.random_range(-0.004..0.004);
        demo.update(frame);
        elapsed += frame;
    }

    println!("After {} ticks:", demo.state.time_ticks);
    for cart in &demo.state.carts {
        println!(
            "  cart {}: {} items left, {} lost, at ({:.1}, {:.1})",
            cart.id,
            cart.items.count,
            cart.items.lost_total,
            cart.body.pos.x,
            cart.body.pos.z
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Trolley Rush (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
