//! Simulation core
//!
//! All gameplay logic lives here. Nothing in this module renders, reads
//! devices or touches the file system:
//! - Seeded RNG only (one per `World`)
//! - Stable iteration order (registration order)
//! - Removal is deferred to an explicit flush

pub mod asteroid;
pub mod autopilot;
pub mod bullet;
pub mod collision;
pub mod effects;
pub mod emitter;
pub mod entity;
pub mod particle;
pub mod registry;
pub mod rounds;
pub mod saucer;
pub mod ship;
pub mod state;
pub mod tick;
pub mod torus;

pub use asteroid::{Asteroid, TierProps, tier_props};
pub use bullet::Bullet;
pub use collision::{circles_overlap, first_overlap, first_overlap_where};
pub use emitter::{BackgroundEmission, EmissionConfig, EmissionEffect, Jitter};
pub use entity::{Category, Entity, EntityId, EntityKind};
pub use particle::{Color, Gradient, Particle, ParticleKind, ParticleSet, ParticleSink, ParticleState};
pub use registry::EntityRegistry;
pub use rounds::RoundScheduler;
pub use saucer::{Saucer, SaucerSize};
pub use ship::{ActionState, Ship, ShipController, ShipInput};
pub use state::{Hud, World};
pub use tick::{TickInput, tick};
pub use torus::Bounds;
