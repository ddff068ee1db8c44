//! Asteroids Sim - simulation core for a screen-wrapping arcade shooter
//!
//! Core modules:
//! - `sim`: World state, entities, collisions, particles, rounds
//! - `settings`: Externally configured values the simulation reads
//! - `scoreboard`: Leaderboard of finished runs
//! - `error`: Construction-time contract violations

pub mod error;
pub mod scoreboard;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use scoreboard::Scoreboard;
pub use settings::{ControlStyle, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the driver will integrate (stall protection)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default play field, matches the original 800x480 window
    pub const DEFAULT_WIDTH: f32 = 800.0;
    pub const DEFAULT_HEIGHT: f32 = 480.0;

    /// Squared speed below which velocity snaps to exactly zero
    pub const VELOCITY_SNAP_SQ: f32 = 0.001;

    /// Ship handling
    pub const SHIP_RADIUS: f32 = 10.0;
    pub const SHIP_ACCELERATION: f32 = 400.0;
    pub const SHIP_ANGULAR_SPEED: f32 = std::f32::consts::TAU; // radians/sec
    pub const SHIP_MAX_VELOCITY: f32 = 400.0;
    pub const SHIP_START_LIVES: u32 = 3;
    pub const SHIP_SPAWN_IFRAMES: f32 = 1.0;
    pub const SHIP_RESPAWN_TIME: f32 = 2.0;
    pub const MAX_BULLETS: u32 = 10;

    /// Slow motion while the ship respawns
    pub const RESPAWN_FREEZE_TIME: f32 = 0.5;
    pub const RESPAWN_FREEZE_MODIFIER: f32 = 0.5;

    /// Bullets
    pub const BULLET_RADIUS: f32 = 2.0;
    pub const BULLET_SPEED: f32 = 200.0;
    pub const BULLET_LIFETIME: f32 = 1.0;
    /// Muzzle offset as a multiple of the shooter radius
    pub const BULLET_MUZZLE: f32 = 1.2;

    /// Asteroid field
    pub const MAX_ASTEROIDS: usize = 26;
    pub const ASTEROID_CHILDREN: usize = 3;

    /// Rounds
    pub const ROUND_START_DELAY: f32 = 4.0;
    pub const BONUS_LIFE_INTERVAL: u64 = 10_000;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Normalize a vector, returning zero for zero-length or NaN input
#[inline]
pub fn safe_normalize(v: Vec2) -> Vec2 {
    if v.is_nan() || v == Vec2::ZERO {
        return Vec2::ZERO;
    }
    v.normalize_or_zero()
}

/// Linear interpolation between two floats (t is not clamped)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise linear interpolation between two vectors
#[inline]
pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

/// Unit vector pointing at `angle` radians
#[inline]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    unit_from_angle(angle).rotate(v)
}

/// Sign of `x` with zero mapping to zero (unlike `f32::signum`)
#[inline]
pub fn sign_or_zero(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Angle of a vector in radians (atan2)
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
