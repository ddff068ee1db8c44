//! Simulation entities
//!
//! Every live object shares the same kinematic record; category-specific
//! state rides along in `EntityKind`. The category tag is fixed at
//! construction and is what collision filtering keys on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::asteroid::Asteroid;
use super::bullet::Bullet;
use super::saucer::Saucer;
use super::ship::Ship;
use crate::consts::VELOCITY_SNAP_SQ;

/// Stable entity handle (registration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Collision/filter category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Ship,
    Bullet,
    Asteroid,
    Saucer,
    Generic,
}

/// Category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Ship(Ship),
    Bullet(Bullet),
    Asteroid(Asteroid),
    Saucer(Saucer),
    Generic,
}

impl EntityKind {
    pub fn category(&self) -> Category {
        match self {
            EntityKind::Ship(_) => Category::Ship,
            EntityKind::Bullet(_) => Category::Bullet,
            EntityKind::Asteroid(_) => Category::Asteroid,
            EntityKind::Saucer(_) => Category::Saucer,
            EntityKind::Generic => Category::Generic,
        }
    }
}

/// A live simulation object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision extent, never negative
    pub radius: f32,
    /// Participates in toroidal wrapping
    pub wraps: bool,
    pub kind: EntityKind,
}

impl Entity {
    #[inline]
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Advance position by one step, snapping near-zero or NaN velocity to zero
    pub fn integrate(&mut self, dt: f32) {
        if self.vel.is_nan() || self.vel.length_squared() < VELOCITY_SNAP_SQ {
            self.vel = Vec2::ZERO;
        }
        self.pos += self.vel * dt;
    }

    pub fn as_ship(&self) -> Option<&Ship> {
        match &self.kind {
            EntityKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_ship_mut(&mut self) -> Option<&mut Ship> {
        match &mut self.kind {
            EntityKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<&Bullet> {
        match &self.kind {
            EntityKind::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    pub fn as_bullet_mut(&mut self) -> Option<&mut Bullet> {
        match &mut self.kind {
            EntityKind::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    pub fn as_asteroid(&self) -> Option<&Asteroid> {
        match &self.kind {
            EntityKind::Asteroid(asteroid) => Some(asteroid),
            _ => None,
        }
    }

    pub fn as_asteroid_mut(&mut self) -> Option<&mut Asteroid> {
        match &mut self.kind {
            EntityKind::Asteroid(asteroid) => Some(asteroid),
            _ => None,
        }
    }

    pub fn as_saucer(&self) -> Option<&Saucer> {
        match &self.kind {
            EntityKind::Saucer(saucer) => Some(saucer),
            _ => None,
        }
    }

    pub fn as_saucer_mut(&mut self) -> Option<&mut Saucer> {
        match &mut self.kind {
            EntityKind::Saucer(saucer) => Some(saucer),
            _ => None,
        }
    }
}
