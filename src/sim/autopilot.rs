//! Attract-mode ship AI
//!
//! Picks the closest thing on the torus, runs from it when it is near (or is a
//! bullet), otherwise turns toward where it is heading and fires when facing
//! it. Speed stays low so the demo looks deliberate.

use glam::Vec2;

use super::entity::{Category, EntityId};
use super::registry::EntityRegistry;
use super::ship::{Ship, ShipController};
use super::torus::Bounds;
use crate::consts::{SHIP_ACCELERATION, SHIP_ANGULAR_SPEED, SHIP_MAX_VELOCITY};
use crate::safe_normalize;

/// Anything closer than this makes the autopilot flee
pub const SCARE_DISTANCE: f32 = 135.0;
pub const SHOOT_COOLDOWN: f32 = 0.5;
/// Bullets moving with the ship (dot of velocities above this) are ignored
const SAME_DIRECTION_DOT: f32 = 0.2;
/// How aligned the nose must be with the escape route before thrusting
const FLEE_ALIGNMENT: f32 = 0.2;

/// The entity the autopilot reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threat {
    pub id: EntityId,
    /// Closest wrapped image of the threat
    pub pos: Vec2,
    pub vel: Vec2,
    pub is_bullet: bool,
}

/// Closest other wrapping entity, skipping our own bullets and bullets
/// travelling alongside us
pub fn nearest_threat(registry: &EntityRegistry, bounds: &Bounds, ship_id: EntityId) -> Option<Threat> {
    let ship = registry.get(ship_id)?;
    let mut best: Option<(f32, Threat)> = None;

    for other in registry.iter() {
        if other.id == ship_id || !other.wraps || other.category() == Category::Generic {
            continue;
        }
        let is_bullet = match other.as_bullet() {
            Some(bullet) if bullet.is_owned_by(ship_id) => continue,
            Some(_) if other.vel.dot(ship.vel) > SAME_DIRECTION_DOT => continue,
            Some(_) => true,
            None => false,
        };

        let image = bounds.nearest_image(other.pos, ship.pos);
        let dist = image.distance_squared(ship.pos);
        if best.as_ref().is_none_or(|(d, _)| dist < *d) {
            best = Some((dist, Threat { id: other.id, pos: image, vel: other.vel, is_bullet }));
        }
    }

    best.map(|(_, threat)| threat)
}

/// Steer an autopilot ship for one tick; true when it wants to fire
///
/// Does nothing (and returns false) for player-driven ships.
pub fn drive(ship: &mut Ship, pos: Vec2, vel: &mut Vec2, threat: Option<Threat>, dt: f32) -> bool {
    let ShipController::Autopilot { shoot_timer } = &mut ship.controller else {
        return false;
    };
    if *shoot_timer > 0.0 {
        *shoot_timer -= dt;
    }

    let mut offset = threat.map_or(Vec2::ZERO, |t| t.pos - pos);
    let mut scared = offset.length_squared() < SCARE_DISTANCE * SCARE_DISTANCE;
    let mut extra_speed = 0.0;

    if let Some(threat) = threat {
        if threat.is_bullet {
            // Dodge sideways across the bullet's path
            scared = true;
            let along = safe_normalize(threat.vel);
            offset = Vec2::new(along.y, -along.x);
        }
        extra_speed = threat.vel.length();
        if !scared {
            // Lead the target
            offset += threat.vel;
        }
    }

    let target = if scared { -safe_normalize(offset) } else { safe_normalize(offset) };

    let turned = safe_normalize(ship.look_dir + (target - ship.look_dir) * dt * SHIP_ANGULAR_SPEED);
    if turned != Vec2::ZERO {
        ship.look_dir = turned;
    }

    let mut fire = false;
    ship.accelerating = false;
    if scared && ship.look_dir.dot(target) > FLEE_ALIGNMENT {
        *vel += ship.look_dir * SHIP_ACCELERATION * dt;
        ship.accelerating = true;
    } else if threat.is_some() && target.dot(ship.look_dir) > 0.0 && *shoot_timer <= 0.0 {
        *shoot_timer = SHOOT_COOLDOWN;
        fire = true;
    }

    let max_speed = (SHIP_MAX_VELOCITY + extra_speed) / 4.0;
    if vel.length_squared() > max_speed * max_speed {
        *vel = safe_normalize(*vel) * max_speed;
    }
    let dir = safe_normalize(*vel);
    if dir != Vec2::ZERO {
        ship.move_dir = dir;
    }

    fire
}
