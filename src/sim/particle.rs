//! Visual particles
//!
//! Particles never affect gameplay. They age every update, are queued for
//! removal once `age >= lifetime` (when `lifetime > 0`) and are dropped on the
//! following flush, never during iteration.
//!
//! Emitters running on other threads hand particles over through a
//! `ParticleSink`; the owning `ParticleSet` drains that queue on the main
//! thread before each update.

use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lerp;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Same color, fully transparent
    pub const fn transparent(self) -> Self {
        Self::rgba(self.r, self.g, self.b, 0)
    }

    /// Per-channel linear interpolation
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let channel = |a: u8, b: u8| lerp(a as f32, b as f32, t).round().clamp(0.0, 255.0) as u8;
        Color {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: channel(self.a, other.a),
        }
    }
}

/// One gradient stop at normalized time `t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: Color,
    pub t: f32,
}

/// Color over normalized particle age
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// Build from `(color, t)` stops; stops are sorted by `t`
    pub fn new(stops: impl IntoIterator<Item = (Color, f32)>) -> Self {
        let mut stops: Vec<ColorStop> = stops
            .into_iter()
            .map(|(color, t)| ColorStop { color, t: t.clamp(0.0, 1.0) })
            .collect();
        stops.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Color at normalized age `t` (clamped to `[0, 1]`)
    ///
    /// Stops not reaching the endpoints are padded with transparent copies
    /// of the first/last color at `t = 0` and `t = 1`. An empty gradient is
    /// opaque white everywhere.
    pub fn color_at(&self, t: f32) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::WHITE;
        };

        let mut padded = Vec::with_capacity(self.stops.len() + 2);
        if first.t > 0.0 {
            padded.push(ColorStop { color: first.color.transparent(), t: 0.0 });
        }
        padded.extend_from_slice(&self.stops);
        if last.t < 1.0 {
            padded.push(ColorStop { color: last.color.transparent(), t: 1.0 });
        }

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let (lo, hi) = padded
            .windows(2)
            .find(|w| t >= w[0].t && t <= w[1].t)
            .map(|w| (w[0], w[1]))
            .unwrap_or((padded[0], padded[padded.len() - 1]));

        let span = (hi.t - lo.t).max(0.0001);
        lo.color.lerp(hi.color, ((t - lo.t) / span).clamp(0.0, 1.0))
    }
}

/// Particle shape, with its own drawing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleKind {
    Dot,
    Line { length: f32, thickness: f32 },
}

impl ParticleKind {
    /// Default debris line
    pub const LINE: ParticleKind = ParticleKind::Line {
        length: 10.0,
        thickness: 2.0,
    };
}

/// Particle lifecycle (Removed = no longer in the set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleState {
    Spawned,
    Aging,
    PendingRemoval,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angular_vel: f32,
    pub rotation: f32,
    pub age: f32,
    /// Seconds until expiry; `<= 0` means the owner removes it explicitly
    pub lifetime: f32,
    pub gradient: Gradient,
    pub kind: ParticleKind,
    pub state: ParticleState,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, angular_vel: f32, rotation: f32, lifetime: f32, gradient: Gradient, kind: ParticleKind) -> Self {
        Self {
            pos,
            vel,
            angular_vel,
            rotation,
            age: 0.0,
            lifetime,
            gradient,
            kind,
            state: ParticleState::Spawned,
        }
    }

    /// Advance one step; returns true when the particle just expired
    pub fn update(&mut self, dt: f32) -> bool {
        if self.state == ParticleState::PendingRemoval {
            return false;
        }
        self.rotation += self.angular_vel * dt;
        self.pos += self.vel * dt;
        self.age += dt;
        self.state = ParticleState::Aging;

        if self.lifetime > 0.0 && self.age >= self.lifetime {
            self.state = ParticleState::PendingRemoval;
            return true;
        }
        false
    }

    /// Normalized age in `[0, 1]` (0 for particles without a lifetime)
    pub fn progress(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Current draw color
    pub fn color(&self) -> Color {
        self.gradient.color_at(self.progress())
    }
}

/// Thread-safe producer handle into a `ParticleSet`
#[derive(Debug, Clone)]
pub struct ParticleSink {
    sender: Sender<Particle>,
}

impl ParticleSink {
    /// Hand a particle to the main thread; false once the set is gone
    pub fn push(&self, particle: Particle) -> bool {
        self.sender.send(particle).is_ok()
    }
}

/// Owner of all live particles
#[derive(Debug)]
pub struct ParticleSet {
    particles: Vec<Particle>,
    /// Maximum live particles; pushes beyond it are refused
    budget: usize,
    sender: Sender<Particle>,
    incoming: Receiver<Particle>,
}

impl ParticleSet {
    pub fn new(budget: usize) -> Self {
        let (sender, incoming) = unbounded();
        Self {
            particles: Vec::new(),
            budget,
            sender,
            incoming,
        }
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
    }

    /// Producer handle for background emitters
    pub fn sink(&self) -> ParticleSink {
        ParticleSink {
            sender: self.sender.clone(),
        }
    }

    /// Add a particle directly (main thread); false when over budget
    pub fn push(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= self.budget {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Move everything handed over by background emitters into the set
    pub fn drain_incoming(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(particle) = self.incoming.try_recv() {
            if self.push(particle) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Age every particle; expired ones are only queued
    pub fn update(&mut self, dt: f32) {
        self.drain_incoming();
        for particle in &mut self.particles {
            particle.update(dt);
        }
    }

    /// Queue a particle for removal (used for particles without lifetime)
    pub fn mark_for_removal(&mut self, index: usize) {
        if let Some(particle) = self.particles.get_mut(index) {
            particle.state = ParticleState::PendingRemoval;
        }
    }

    /// Drop every particle queued for removal; returns how many went
    pub fn flush_removals(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| p.state != ParticleState::PendingRemoval);
        before - self.particles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        while self.incoming.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn dot(lifetime: f32) -> Particle {
        Particle::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 1.0, 0.0, lifetime, Gradient::default(), ParticleKind::Dot)
    }

    #[test]
    fn test_empty_gradient_is_opaque_white() {
        let g = Gradient::default();
        assert_eq!(g.color_at(0.0), Color::WHITE);
        assert_eq!(g.color_at(0.7), Color::WHITE);
        assert_eq!(g.color_at(1.0), Color::WHITE);
    }

    #[test]
    fn test_gradient_endpoints_match_explicit_stops() {
        let g = Gradient::new([(RED, 0.0), (BLUE, 1.0)]);
        assert_eq!(g.color_at(0.0), RED);
        assert_eq!(g.color_at(1.0), BLUE);
        assert_eq!(g.color_at(0.5), Color::rgba(128, 0, 128, 255));
    }

    #[test]
    fn test_gradient_pads_transparent_endpoints() {
        let g = Gradient::new([(Color::WHITE, 0.0), (Color::WHITE, 0.5)]);
        assert_eq!(g.color_at(0.25), Color::WHITE);
        assert_eq!(g.color_at(1.0), Color::WHITE.transparent());
        assert_eq!(g.color_at(0.75).a, 128);

        let late = Gradient::new([(RED, 0.5)]);
        assert_eq!(late.color_at(0.0), RED.transparent());
        assert_eq!(late.color_at(0.5), RED);
    }

    #[test]
    fn test_gradient_clamps_out_of_range_t() {
        let g = Gradient::new([(RED, 0.0), (BLUE, 1.0)]);
        assert_eq!(g.color_at(-2.0), RED);
        assert_eq!(g.color_at(7.0), BLUE);
    }

    #[test]
    fn test_particle_lifetime_round_trip() {
        let mut set = ParticleSet::new(16);
        set.push(dot(0.5));

        // 0.125 steps sum to 0.5 exactly
        for step in 1..=3 {
            set.update(0.125);
            set.flush_removals();
            assert_eq!(set.len(), 1, "present after step {step}");
        }
        set.update(0.125);
        assert_eq!(set.flush_removals(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_expired_particle_waits_for_flush() {
        let mut set = ParticleSet::new(16);
        set.push(dot(0.1));
        set.update(0.2);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(|p| p.state), Some(ParticleState::PendingRemoval));
        assert_eq!(set.flush_removals(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_zero_lifetime_never_expires() {
        let mut set = ParticleSet::new(16);
        set.push(dot(0.0));
        for _ in 0..100 {
            set.update(1.0);
            set.flush_removals();
        }
        assert_eq!(set.len(), 1);

        set.mark_for_removal(0);
        set.flush_removals();
        assert!(set.is_empty());
    }

    #[test]
    fn test_budget_refuses_extra_particles() {
        let mut set = ParticleSet::new(2);
        assert!(set.push(dot(1.0)));
        assert!(set.push(dot(1.0)));
        assert!(!set.push(dot(1.0)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_sink_hand_off_from_thread() {
        let mut set = ParticleSet::new(64);
        let sink = set.sink();
        let handle = std::thread::spawn(move || {
            for _ in 0..10 {
                sink.push(dot(1.0));
            }
        });
        handle.join().unwrap();
        assert_eq!(set.drain_incoming(), 10);
        assert_eq!(set.len(), 10);
    }

    proptest! {
        #[test]
        fn prop_gradient_stays_between_endpoints(t in -1.0f32..2.0, r in 0u8..=255, b in 0u8..=255) {
            let from = Color::rgb(r, 0, 0);
            let to = Color::rgb(0, 0, b);
            let c = Gradient::new([(from, 0.0), (to, 1.0)]).color_at(t);
            prop_assert!(c.r <= r);
            prop_assert!(c.b <= b);
            prop_assert_eq!(c.g, 0);
            prop_assert_eq!(c.a, 255);
        }
    }
}
