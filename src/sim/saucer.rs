//! Saucers: size classes, vertical drift, aiming and fire cooldown

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::torus::Bounds;
use crate::{rotate, safe_normalize};

/// Seconds between drift changes (uniform range)
pub const DRIFT_INTERVAL_MIN: f32 = 0.8;
pub const DRIFT_INTERVAL_MAX: f32 = 2.0;
/// Largest vertical drift speed, px/s
pub const MAX_DRIFT_SPEED: f32 = 38.0;

/// Saucer bullets fly faster and a bit longer than the ship's
pub const SAUCER_BULLET_SPEED: f32 = 280.0;
pub const SAUCER_BULLET_LIFETIME: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaucerSize {
    Small,
    Large,
}

/// Per-class constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaucerProps {
    pub radius: f32,
    pub speed: f32,
    /// Seconds between shots
    pub shoot_interval: f32,
    pub score: u64,
    /// Max aim error either side, radians
    pub spread: f32,
}

impl SaucerSize {
    pub fn props(self) -> SaucerProps {
        match self {
            SaucerSize::Small => SaucerProps {
                radius: 8.0,
                speed: 120.0,
                shoot_interval: 1.0,
                score: 1000,
                spread: 0.0,
            },
            SaucerSize::Large => SaucerProps {
                radius: 12.0,
                speed: 80.0,
                shoot_interval: 1.5,
                score: 200,
                spread: 0.35,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saucer {
    pub size: SaucerSize,
    /// Seconds until the next shot
    pub shoot_timer: f32,
    /// Unit vector toward the closest ship image, zero when there is none
    pub aim: Vec2,
    /// Seconds until the vertical drift changes
    pub drift_timer: f32,
}

impl Saucer {
    pub fn new(size: SaucerSize) -> Self {
        Self {
            size,
            shoot_timer: size.props().shoot_interval,
            aim: Vec2::ZERO,
            drift_timer: DRIFT_INTERVAL_MAX,
        }
    }

    pub fn props(&self) -> SaucerProps {
        self.size.props()
    }

    /// Entry point on the left edge at mid height
    pub fn entry_point(bounds: &Bounds) -> Vec2 {
        Vec2::new(0.0, bounds.height * 0.5)
    }

    /// Horizontal entry velocity
    pub fn entry_velocity(size: SaucerSize) -> Vec2 {
        Vec2::new(size.props().speed, 0.0)
    }

    /// Point the aim at the closest wrapped image of any ship
    pub fn retarget(&mut self, pos: Vec2, bounds: &Bounds, ships: impl IntoIterator<Item = Vec2>) {
        let closest = ships
            .into_iter()
            .map(|ship| bounds.nearest_image(ship, pos))
            .min_by(|a, b| pos.distance_squared(*a).total_cmp(&pos.distance_squared(*b)));
        self.aim = closest.map_or(Vec2::ZERO, |target| safe_normalize(target - pos));
    }

    /// Count the drift timer down and pick a new vertical speed when it fires
    pub fn drift(&mut self, vel: &mut Vec2, dt: f32, rng: &mut impl Rng) {
        self.drift_timer -= dt;
        if self.drift_timer > 0.0 {
            return;
        }
        self.drift_timer = rng.random_range(DRIFT_INTERVAL_MIN..DRIFT_INTERVAL_MAX);
        vel.y = rng.random_range(-MAX_DRIFT_SPEED..=MAX_DRIFT_SPEED);
    }

    /// Count the cooldown down; returns the shot direction when it is time to fire
    pub fn fire(&mut self, dt: f32, rng: &mut impl Rng) -> Option<Vec2> {
        self.shoot_timer -= dt;
        if self.shoot_timer > 0.0 || self.aim == Vec2::ZERO {
            self.shoot_timer = self.shoot_timer.max(0.0);
            return None;
        }
        let props = self.props();
        self.shoot_timer = props.shoot_interval;

        let error = if props.spread > 0.0 {
            rng.random_range(-props.spread..=props.spread)
        } else {
            0.0
        };
        Some(safe_normalize(rotate(self.aim, error)))
    }
}
