//! Canned particle bursts
//!
//! Destruction is shown as two stages: a quick ring of tumbling debris
//! lines, then a spray of dots that fires one interval later.

use std::f32::consts::{FRAC_PI_3, PI, TAU};

use glam::Vec2;

use super::emitter::{EmissionConfig, Jitter};
use super::particle::{Color, Gradient, ParticleKind};

const EMBER: Color = Color::rgb(255, 170, 60);

fn fade_white() -> Gradient {
    Gradient::new([(Color::WHITE, 0.0), (Color::WHITE, 0.5)])
}

fn ember_fade() -> Gradient {
    Gradient::new([(Color::WHITE, 0.0), (EMBER, 0.4)])
}

/// Stage one: debris lines flying outward, more for bigger objects
pub fn debris_lines(center: Vec2, tier: u32, spread: f32) -> EmissionConfig {
    EmissionConfig {
        kind: ParticleKind::LINE,
        center,
        arc_start: 0.0,
        sweep: TAU,
        radius: spread * 0.5,
        impulse: 40.0,
        impulse_jitter: Jitter::new(-20.0, 20.0),
        count: 2 + 2 * tier.max(1),
        interval: 0.01,
        max_triggers: Some(1),
        lifetime: 1.2,
        lifetime_jitter: Jitter::new(-0.4, 0.4),
        angular_velocity: Jitter::new(-3.0, 3.0),
        gradient: fade_white(),
        ..Default::default()
    }
}

/// Stage two: dot spray, directed along `heading` when there is one
///
/// Uses a longer interval so it fires after the debris stage.
pub fn dot_spray(center: Vec2, tier: u32, spread: f32, heading: Option<f32>) -> EmissionConfig {
    let (arc_start, sweep) = match heading {
        Some(angle) => (angle - FRAC_PI_3, 2.0 * FRAC_PI_3),
        None => (0.0, TAU),
    };
    EmissionConfig {
        kind: ParticleKind::Dot,
        center,
        arc_start,
        sweep,
        radius: spread,
        impulse: 100.0,
        impulse_jitter: Jitter::new(-30.0, 30.0),
        count: 10 * tier.max(1),
        interval: 0.05,
        max_triggers: Some(2),
        lifetime: 0.5,
        lifetime_jitter: Jitter::new(-0.4, 0.5),
        gradient: ember_fade(),
        ..Default::default()
    }
}

/// Both destruction stages
pub fn destruction(center: Vec2, tier: u32, spread: f32, heading: Option<f32>) -> [EmissionConfig; 2] {
    [
        debris_lines(center, tier, spread),
        dot_spray(center, tier, spread, heading),
    ]
}

/// Small forward puff where a bullet struck something
pub fn bullet_impact(center: Vec2, heading: f32) -> EmissionConfig {
    EmissionConfig {
        kind: ParticleKind::Dot,
        center,
        arc_start: heading - PI / 12.0,
        sweep: PI / 6.0,
        radius: 4.0,
        impulse: 100.0,
        count: 5,
        interval: 0.01,
        max_triggers: Some(1),
        lifetime: 2.0,
        lifetime_jitter: Jitter::new(-0.2, 0.5),
        gradient: fade_white(),
        ..Default::default()
    }
}
