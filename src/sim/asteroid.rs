//! Asteroid tiers, spawning and outline generation

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::torus::Bounds;
use crate::{normalize_angle, rotate, unit_from_angle};

/// Outline points per asteroid
pub const OUTLINE_POINTS: usize = 10;
/// Radial jitter band for outline points (multiples of radius)
pub const MIN_POINT_OFFSET: f32 = 0.7;
pub const MAX_POINT_OFFSET: f32 = 1.3;

pub const SMALL: u32 = 1;
pub const MEDIUM: u32 = 2;
pub const LARGE: u32 = 3;

/// Fixed per-tier properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProps {
    pub radius: f32,
    pub speed: f32,
    /// Max spin, radians/sec (actual spin is uniform in +/- this)
    pub rotate_speed: f32,
    pub score: u64,
}

/// Properties for tier 1..=3 (small to large); `None` for anything else
pub fn tier_props(tier: u32) -> Option<TierProps> {
    let props = match tier {
        SMALL => TierProps { radius: 13.0, speed: 80.0, rotate_speed: 4.0, score: 100 },
        MEDIUM => TierProps { radius: 20.0, speed: 60.0, rotate_speed: 2.0, score: 50 },
        LARGE => TierProps { radius: 30.0, speed: 50.0, rotate_speed: 1.0, score: 20 },
        _ => return None,
    };
    Some(props)
}

/// Asteroid payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    /// Size tier, 1 (small) to 3 (large)
    pub tier: u32,
    /// Unit-radius outline, fixed at spawn
    outline: Vec<Vec2>,
    pub rotation: f32,
    pub angular_vel: f32,
    /// Heading of the bullet that destroyed it, aims the dot spray
    pub hit_heading: Option<f32>,
}

impl Asteroid {
    /// Roll a new asteroid of `tier`: returns it with its velocity
    pub fn roll(tier: u32, rng: &mut impl Rng) -> Option<(Self, Vec2)> {
        let props = tier_props(tier)?;
        let heading = rng.random::<f32>() * std::f32::consts::TAU;
        let vel = unit_from_angle(heading) * props.speed;
        let angular_vel = (rng.random::<f32>() * 2.0 - 1.0) * props.rotate_speed;

        let asteroid = Self {
            tier,
            outline: generate_outline(rng),
            rotation: 0.0,
            angular_vel,
            hit_heading: None,
        };
        Some((asteroid, vel))
    }

    pub fn props(&self) -> Option<TierProps> {
        tier_props(self.tier)
    }

    /// Score for destroying this asteroid
    pub fn score(&self) -> u64 {
        self.props().map_or(0, |p| p.score)
    }

    /// Tier of the children this asteroid splits into, if any
    pub fn child_tier(&self) -> Option<u32> {
        (self.tier > SMALL).then(|| self.tier - 1)
    }

    pub fn spin(&mut self, dt: f32) {
        self.rotation = normalize_angle(self.rotation + self.angular_vel * dt);
    }

    /// Unit outline as generated (unrotated)
    pub fn outline_shape(&self) -> &[Vec2] {
        &self.outline
    }

    /// Outline rotated and scaled, positioned at `pos`
    pub fn outline(&self, pos: Vec2, radius: f32) -> Vec<Vec2> {
        self.outline
            .iter()
            .map(|&p| pos + rotate(p, self.rotation) * radius)
            .collect()
    }
}

/// Random point on the left or top edge (fair coin picks which)
pub fn edge_spawn_point(bounds: &Bounds, rng: &mut impl Rng) -> Vec2 {
    if rng.random_bool(0.5) {
        Vec2::new(0.0, rng.random::<f32>() * bounds.height)
    } else {
        Vec2::new(rng.random::<f32>() * bounds.width, 0.0)
    }
}

/// Evenly spaced spokes from a random start angle, each jittered radially
pub fn generate_outline(rng: &mut impl Rng) -> Vec<Vec2> {
    let step = std::f32::consts::TAU / OUTLINE_POINTS as f32;
    let start = step * rng.random::<f32>();
    (0..OUTLINE_POINTS)
        .map(|i| {
            let offset = MIN_POINT_OFFSET + (MAX_POINT_OFFSET - MIN_POINT_OFFSET) * rng.random::<f32>();
            unit_from_angle(start + step * i as f32) * offset
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_larger_tiers_are_slower_and_cheaper() {
        let small = tier_props(SMALL).unwrap();
        let large = tier_props(LARGE).unwrap();
        assert!(large.radius > small.radius);
        assert!(large.speed < small.speed);
        assert!(large.score < small.score);
        assert!(tier_props(0).is_none());
        assert!(tier_props(4).is_none());
    }

    #[test]
    fn test_roll_matches_tier_speed() {
        let mut rng = Pcg32::seed_from_u64(3);
        let (asteroid, vel) = Asteroid::roll(MEDIUM, &mut rng).unwrap();
        assert_eq!(asteroid.tier, MEDIUM);
        assert!((vel.length() - 60.0).abs() < 1e-3);
        assert!(asteroid.angular_vel.abs() <= 2.0);
        assert_eq!(asteroid.child_tier(), Some(SMALL));
    }

    #[test]
    fn test_outline_within_band() {
        let mut rng = Pcg32::seed_from_u64(11);
        let outline = generate_outline(&mut rng);
        assert_eq!(outline.len(), OUTLINE_POINTS);
        for p in outline {
            let r = p.length();
            assert!((MIN_POINT_OFFSET - 1e-4..=MAX_POINT_OFFSET + 1e-4).contains(&r));
        }
    }

    #[test]
    fn test_edge_spawn_on_left_or_top() {
        let bounds = Bounds::new(800.0, 480.0).unwrap();
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            let p = edge_spawn_point(&bounds, &mut rng);
            assert!(p.x == 0.0 || p.y == 0.0);
            assert!(bounds.contains(p));
        }
    }

    #[test]
    fn test_outline_rotates_rigidly() {
        let mut rng = Pcg32::seed_from_u64(8);
        let (mut asteroid, _) = Asteroid::roll(LARGE, &mut rng).unwrap();
        let before = asteroid.outline(Vec2::ZERO, 30.0);
        asteroid.spin(0.5);
        let after = asteroid.outline(Vec2::ZERO, 30.0);
        for (a, b) in before.iter().zip(&after) {
            assert!((a.length() - b.length()).abs() < 1e-3);
        }
    }
}
