//! Bullets
//!
//! A bullet only remembers who fired it (by id, never owning the shooter),
//! counts its lifetime down and disposes itself exactly once: either when the
//! countdown runs out or when it strikes something.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Category, EntityId};
use crate::consts::BULLET_LIFETIME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    /// Shooter back-reference; may outlive the shooter
    pub owner: Option<EntityId>,
    /// Shooter category at fire time
    pub owner_category: Category,
    /// Seconds left before the bullet fizzles
    pub remaining: f32,
    /// Set when it struck a target (drives the impact burst)
    pub collided: bool,
    disposed: bool,
}

impl Bullet {
    pub fn new(owner: EntityId, owner_category: Category) -> Self {
        Self::with_lifetime(owner, owner_category, BULLET_LIFETIME)
    }

    pub fn with_lifetime(owner: EntityId, owner_category: Category, lifetime: f32) -> Self {
        Self {
            owner: Some(owner),
            owner_category,
            remaining: lifetime,
            collided: false,
            disposed: false,
        }
    }

    /// Fired by a player or autopilot ship
    #[inline]
    pub fn is_ship_owned(&self) -> bool {
        self.owner_category == Category::Ship
    }

    #[inline]
    pub fn is_owned_by(&self, id: EntityId) -> bool {
        self.owner == Some(id)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Count the lifetime down; true exactly once, when it should be disposed
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.disposed {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining <= 0.0 {
            return self.dispose();
        }
        false
    }

    /// Record a hit; true if this is the first disposal
    pub fn strike(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.collided = true;
        self.dispose()
    }

    fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }
}

/// Launch velocity for a bullet fired along `look`
///
/// Only the forward component of the shooter's velocity is inherited, so a
/// bullet never leaves slower than its muzzle speed.
pub fn launch_velocity(look: Vec2, speed: f32, shooter_vel: Vec2) -> Vec2 {
    let forward = shooter_vel.dot(look).max(0.0);
    let inherited = if forward.is_finite() { look * forward } else { Vec2::ZERO };
    look * speed + inherited
}
