//! Particle emission effects
//!
//! An `EmissionEffect` is a reusable, parameterized burst generator. Once
//! started it tracks elapsed time and emits `count` particles every time the
//! elapsed time crosses another multiple of `interval`, until it is stopped,
//! its `max_duration` elapses or it reaches `max_triggers`.
//!
//! Effects owned by the `World` are stepped from the main tick with
//! [`EmissionEffect::advance`]. An effect can also run on its own thread via
//! [`EmissionEffect::start_background`], handing particles to the main
//! thread through a [`ParticleSink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particle::{Gradient, Particle, ParticleKind, ParticleSink};
use crate::error::SimError;
use crate::unit_from_angle;

/// Background emitter wake-up period
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Uniform jitter added to a base value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    pub min: f32,
    pub max: f32,
}

impl Jitter {
    pub const NONE: Jitter = Jitter { min: 0.0, max: 0.0 };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        self.min + rng.random::<f32>() * (self.max - self.min)
    }
}

/// Effect parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionConfig {
    pub kind: ParticleKind,
    /// Emission center
    pub center: Vec2,
    /// Start of the emission arc (radians)
    pub arc_start: f32,
    /// Arc width (radians); a full turn emits in every direction
    pub sweep: f32,
    /// Spawn positions are spread over a disk of this radius
    pub radius: f32,
    pub impulse: f32,
    pub impulse_jitter: Jitter,
    /// Particles per trigger
    pub count: u32,
    /// Seconds between triggers
    pub interval: f32,
    pub max_duration: Option<f32>,
    pub max_triggers: Option<u32>,
    pub lifetime: f32,
    pub lifetime_jitter: Jitter,
    pub angular_velocity: Jitter,
    pub gradient: Gradient,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            kind: ParticleKind::Dot,
            center: Vec2::ZERO,
            arc_start: 0.0,
            sweep: std::f32::consts::TAU,
            radius: 0.0,
            impulse: 0.0,
            impulse_jitter: Jitter::NONE,
            count: 1,
            interval: 0.01,
            max_duration: None,
            max_triggers: None,
            lifetime: 1.0,
            lifetime_jitter: Jitter::NONE,
            angular_velocity: Jitter::NONE,
            gradient: Gradient::default(),
        }
    }
}

/// A time-driven particle burst generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionEffect {
    config: EmissionConfig,
    running: bool,
    elapsed: f32,
    last_emit: f32,
    triggers: u32,
}

impl EmissionEffect {
    pub fn new(config: EmissionConfig) -> Result<Self, SimError> {
        if config.count == 0 {
            return Err(SimError::InvalidCount);
        }
        if !(config.interval > 0.0) {
            return Err(SimError::InvalidInterval(config.interval));
        }
        if config.radius < 0.0 {
            return Err(SimError::NegativeRadius(config.radius));
        }
        Ok(Self {
            config,
            running: false,
            elapsed: 0.0,
            last_emit: 0.0,
            triggers: 0,
        })
    }

    pub fn config(&self) -> &EmissionConfig {
        &self.config
    }

    /// Move the emission center (effects are reusable)
    pub fn set_center(&mut self, center: Vec2) {
        self.config.center = center;
    }

    pub fn set_arc_start(&mut self, angle: f32) {
        self.config.arc_start = angle;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn triggers(&self) -> u32 {
        self.triggers
    }

    /// Begin emitting; no-op if already running
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.elapsed = 0.0;
        self.last_emit = 0.0;
        self.triggers = 0;
    }

    /// Stop emitting. Nothing is emitted by this effect after it returns.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance the effect clock by `dt`, emitting every trigger crossed
    ///
    /// Returns the number of particles emitted.
    pub fn advance<F>(&mut self, dt: f32, rng: &mut impl Rng, mut emit: F) -> usize
    where
        F: FnMut(Particle),
    {
        if !self.running {
            return 0;
        }
        self.elapsed += dt.max(0.0);

        let mut emitted = 0;
        while self.running {
            if self.out_of_triggers() {
                self.running = false;
                break;
            }
            // Each pending trigger fires at its own timestamp, so a coarse
            // step still emits every multiple that falls before the deadline
            let next = self.last_emit + self.config.interval;
            if let Some(deadline) = self.deadline()
                && next >= deadline
            {
                if self.elapsed >= deadline {
                    self.running = false;
                }
                break;
            }
            if self.elapsed - self.last_emit < self.config.interval {
                break;
            }
            self.last_emit += self.config.interval;
            for _ in 0..self.config.count {
                emit(self.emit_particle(rng));
                emitted += 1;
            }
            self.triggers += 1;
        }

        // Report stopped as soon as the last allowed trigger fired
        if self.limits_reached() {
            self.running = false;
        }
        emitted
    }

    fn out_of_triggers(&self) -> bool {
        self.config.max_triggers.is_some_and(|max| self.triggers >= max)
    }

    /// Effect clock value at which emission ends, if bounded
    fn deadline(&self) -> Option<f32> {
        self.config.max_duration.filter(|max| *max > 0.0)
    }

    fn limits_reached(&self) -> bool {
        self.out_of_triggers() || self.deadline().is_some_and(|max| self.elapsed >= max)
    }

    /// Sample one particle from the configured distributions
    fn emit_particle(&self, rng: &mut impl Rng) -> Particle {
        let cfg = &self.config;

        let angle = cfg.arc_start + rng.random::<f32>() * cfg.sweep;
        let speed = cfg.impulse + cfg.impulse_jitter.sample(rng);
        let vel = unit_from_angle(angle) * speed;

        // sqrt keeps the spawn offset uniform over the disk area
        let offset_dist = rng.random::<f32>().sqrt() * cfg.radius;
        let offset_angle = rng.random::<f32>() * std::f32::consts::TAU;
        let pos = cfg.center + unit_from_angle(offset_angle) * offset_dist;

        let angular_vel = cfg.angular_velocity.sample(rng);
        let lifetime = cfg.lifetime + cfg.lifetime_jitter.sample(rng);
        let rotation = rng.random::<f32>() * std::f32::consts::TAU;

        Particle::new(pos, vel, angular_vel, rotation, lifetime, cfg.gradient.clone(), cfg.kind)
    }

    /// Run this effect on its own thread, feeding `sink`
    ///
    /// The thread polls wall time every [`POLL_INTERVAL`].
    pub fn start_background(mut self, sink: ParticleSink, seed: u64) -> BackgroundEmission {
        self.stop();
        self.start();
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let stop_flag = Arc::clone(&stop);
        let finished_flag = Arc::clone(&finished);
        let handle = thread::spawn(move || {
            let mut rng = Pcg32::seed_from_u64(seed);
            let started = Instant::now();
            let mut last = 0.0f32;
            let mut connected = true;

            while connected && self.running && !stop_flag.load(Ordering::Acquire) {
                let now = started.elapsed().as_secs_f32();
                self.advance(now - last, &mut rng, |p| connected &= sink.push(p));
                last = now;
                if self.running {
                    thread::sleep(POLL_INTERVAL);
                }
            }
            if !connected {
                log::debug!("Particle sink closed, background emitter exiting");
            }

            self.stop();
            finished_flag.store(true, Ordering::Release);
            self
        });

        BackgroundEmission {
            stop,
            finished,
            handle: Some(handle),
        }
    }
}

/// Handle to an effect running on its own thread
#[derive(Debug)]
pub struct BackgroundEmission {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<EmissionEffect>>,
}

impl BackgroundEmission {
    /// Whether the emission loop is still going
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }

    /// Cancel and join; no particle is emitted after this returns
    ///
    /// Hands the effect back so it can be reused.
    pub fn stop(mut self) -> Option<EmissionEffect> {
        self.join()
    }

    fn join(&mut self) -> Option<EmissionEffect> {
        self.stop.store(true, Ordering::Release);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(effect) => Some(effect),
            Err(_) => {
                log::warn!("Background emitter thread panicked");
                None
            }
        }
    }
}

impl Drop for BackgroundEmission {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particle::ParticleSet;

    fn burst(count: u32, interval: f32, max_triggers: Option<u32>) -> EmissionEffect {
        EmissionEffect::new(EmissionConfig {
            count,
            interval,
            max_triggers,
            impulse: 100.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        let zero_count = EmissionConfig { count: 0, ..Default::default() };
        assert!(matches!(EmissionEffect::new(zero_count), Err(SimError::InvalidCount)));

        let zero_interval = EmissionConfig { interval: 0.0, ..Default::default() };
        assert!(matches!(
            EmissionEffect::new(zero_interval),
            Err(SimError::InvalidInterval(_))
        ));

        let negative_radius = EmissionConfig { radius: -1.0, ..Default::default() };
        assert!(matches!(
            EmissionEffect::new(negative_radius),
            Err(SimError::NegativeRadius(_))
        ));
    }

    #[test]
    fn test_two_triggers_in_quarter_second() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effect = burst(10, 0.1, Some(2));
        let mut out = Vec::new();

        effect.start();
        effect.advance(0.25, &mut rng, |p| out.push(p));

        assert_eq!(out.len(), 20);
        assert_eq!(effect.triggers(), 2);
        assert!(!effect.is_running());
    }

    #[test]
    fn test_frame_stepped_matches_single_step() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effect = burst(10, 0.1, Some(2));
        let mut emitted = 0;

        effect.start();
        for _ in 0..15 {
            emitted += effect.advance(1.0 / 60.0, &mut rng, |_| {});
        }
        assert_eq!(emitted, 20);
        assert!(!effect.is_running());
    }

    #[test]
    fn test_start_is_noop_while_running() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut effect = burst(1, 0.1, None);
        effect.start();
        effect.advance(0.15, &mut rng, |_| {});
        assert_eq!(effect.triggers(), 1);
        effect.start();
        assert_eq!(effect.triggers(), 1);
    }

    #[test]
    fn test_stop_prevents_further_emission() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut effect = burst(3, 0.1, None);
        effect.start();
        effect.stop();
        assert_eq!(effect.advance(1.0, &mut rng, |_| {}), 0);
    }

    #[test]
    fn test_max_duration_ends_effect() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut effect = EmissionEffect::new(EmissionConfig {
            interval: 0.1,
            max_duration: Some(0.35),
            ..Default::default()
        })
        .unwrap();
        effect.start();
        let mut emitted = 0;
        for _ in 0..10 {
            emitted += effect.advance(0.1, &mut rng, |_| {});
        }
        assert!(!effect.is_running());
        assert!((3..=4).contains(&emitted), "emitted {emitted}");
    }

    #[test]
    fn test_coarse_step_past_max_duration_keeps_earlier_triggers() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut effect = EmissionEffect::new(EmissionConfig {
            count: 10,
            interval: 0.1,
            max_duration: Some(0.35),
            ..Default::default()
        })
        .unwrap();
        effect.start();

        // Triggers at 0.1, 0.2 and 0.3 all precede the deadline
        assert_eq!(effect.advance(0.5, &mut rng, |_| {}), 30);
        assert_eq!(effect.triggers(), 3);
        assert!(!effect.is_running());
    }

    #[test]
    fn test_short_duration_within_one_frame() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut effect = EmissionEffect::new(EmissionConfig {
            count: 4,
            interval: 0.02,
            max_duration: Some(0.05),
            ..Default::default()
        })
        .unwrap();
        effect.start();

        assert_eq!(effect.advance(0.1, &mut rng, |_| {}), 8);
        assert!(!effect.is_running());
    }

    #[test]
    fn test_particles_respect_arc_and_disk() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut effect = EmissionEffect::new(EmissionConfig {
            center: Vec2::new(50.0, 50.0),
            arc_start: 0.0,
            sweep: std::f32::consts::FRAC_PI_2,
            radius: 5.0,
            impulse: 100.0,
            impulse_jitter: Jitter::new(-10.0, 10.0),
            count: 50,
            interval: 0.01,
            max_triggers: Some(1),
            lifetime: 1.0,
            lifetime_jitter: Jitter::new(-0.5, 0.5),
            ..Default::default()
        })
        .unwrap();

        let mut out = Vec::new();
        effect.start();
        effect.advance(0.02, &mut rng, |p| out.push(p));
        assert_eq!(out.len(), 50);

        for p in &out {
            assert!(p.pos.distance(Vec2::new(50.0, 50.0)) <= 5.0 + 1e-4);
            assert!(p.vel.x >= -1e-3 && p.vel.y >= -1e-3, "outside arc: {:?}", p.vel);
            let speed = p.vel.length();
            assert!((90.0 - 1e-3..=110.0 + 1e-3).contains(&speed));
            assert!((0.5 - 1e-4..=1.5 + 1e-4).contains(&p.lifetime));
        }
    }

    fn wait_until_finished(handle: &BackgroundEmission) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_background_effect_finishes_after_max_triggers() {
        let mut set = ParticleSet::new(1000);
        let handle = burst(5, 0.005, Some(3)).start_background(set.sink(), 3);

        wait_until_finished(&handle);
        assert!(!handle.is_running());
        let effect = handle.stop().unwrap();
        assert!(!effect.is_running());

        assert_eq!(set.drain_incoming(), 15);
    }

    #[test]
    fn test_background_stop_joins_before_returning() {
        let mut set = ParticleSet::new(100_000);
        let handle = burst(1, 0.002, None).start_background(set.sink(), 5);
        thread::sleep(Duration::from_millis(20));

        handle.stop();
        set.drain_incoming();
        let after_stop = set.len();

        thread::sleep(Duration::from_millis(20));
        set.drain_incoming();
        assert_eq!(set.len(), after_stop);
    }
}
