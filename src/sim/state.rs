//! World state
//!
//! `World` owns every live collection (entities, particles, running effects,
//! round progress) plus the seeded RNG, so independent simulations never share
//! anything and the same seed and inputs always replay the same run.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::asteroid::{self, Asteroid, LARGE, MEDIUM};
use super::autopilot;
use super::bullet::{Bullet, launch_velocity};
use super::collision::{first_overlap, first_overlap_where};
use super::effects;
use super::emitter::{BackgroundEmission, EmissionConfig, EmissionEffect};
use super::entity::{Category, Entity, EntityId, EntityKind};
use super::particle::{Particle, ParticleSet};
use super::registry::EntityRegistry;
use super::rounds::RoundScheduler;
use super::saucer::{SAUCER_BULLET_LIFETIME, SAUCER_BULLET_SPEED, Saucer, SaucerSize};
use super::ship::{Ship, ShipController, ShipInput};
use super::torus::Bounds;
use crate::consts::*;
use crate::error::SimError;
use crate::heading;
use crate::settings::Settings;

/// Everything the HUD draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub lives: u32,
    pub round: u32,
    pub respawning: bool,
    /// Between-rounds countdown is running
    pub round_starting: bool,
    pub game_over: bool,
}

#[derive(Debug)]
pub struct World {
    seed: u64,
    rng: Pcg32,
    bounds: Option<Bounds>,
    registry: EntityRegistry,
    particles: ParticleSet,
    /// Step-driven effects, advanced from the main tick
    effects: Vec<EmissionEffect>,
    rounds: RoundScheduler,
    settings: Settings,
    /// Slow-motion countdown and the dt multiplier applied while it runs
    freeze_time: f32,
    freeze_modifier: f32,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self::with_settings(seed, Settings::default())
    }

    pub fn with_settings(seed: u64, settings: Settings) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bounds: None,
            registry: EntityRegistry::new(),
            particles: ParticleSet::new(settings.particle_budget()),
            effects: Vec::new(),
            rounds: RoundScheduler::new(),
            settings,
            freeze_time: 0.0,
            freeze_modifier: 1.0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.particles.set_budget(settings.particle_budget());
        self.settings = settings;
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Configure the play field; wrapping entities are folded into it
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), SimError> {
        let bounds = Bounds::new(width, height)?;
        self.bounds = Some(bounds);
        for id in self.registry.ids() {
            if let Some(entity) = self.registry.get_mut(id)
                && entity.wraps
            {
                entity.pos = bounds.wrap(entity.pos);
            }
        }
        log::debug!("World bounds set to {}x{}", width, height);
        Ok(())
    }

    fn require_bounds(&self) -> Result<Bounds, SimError> {
        self.bounds.ok_or(SimError::BoundsNotSet)
    }

    // === Spawning ===

    /// Register a wrapping entity; its position is wrapped into bounds
    pub fn spawn_toroidal(&mut self, pos: Vec2, vel: Vec2, radius: f32, kind: EntityKind) -> Result<EntityId, SimError> {
        let bounds = self.require_bounds()?;
        check_radius(radius)?;
        let category = kind.category();
        let id = self.registry.spawn(bounds.wrap(pos), vel, radius, true, kind);
        log::debug!("Spawned {:?} {:?}", category, id);
        Ok(id)
    }

    /// Register a non-wrapping entity (works without bounds)
    pub fn spawn_generic(&mut self, pos: Vec2, vel: Vec2, radius: f32) -> Result<EntityId, SimError> {
        check_radius(radius)?;
        Ok(self.registry.spawn(pos, vel, radius, false, EntityKind::Generic))
    }

    /// Spawn an asteroid on the left or top edge
    ///
    /// `Ok(None)` when the population cap is reached or the tier is unknown.
    pub fn spawn_asteroid(&mut self, tier: u32) -> Result<Option<EntityId>, SimError> {
        let bounds = self.require_bounds()?;
        let pos = asteroid::edge_spawn_point(&bounds, &mut self.rng);
        self.spawn_asteroid_at(tier, pos)
    }

    pub fn spawn_asteroid_at(&mut self, tier: u32, pos: Vec2) -> Result<Option<EntityId>, SimError> {
        self.require_bounds()?;
        if self.registry.count(Category::Asteroid) >= MAX_ASTEROIDS {
            log::trace!("Asteroid cap reached, spawn refused");
            return Ok(None);
        }
        let Some((asteroid, vel)) = Asteroid::roll(tier, &mut self.rng) else {
            return Ok(None);
        };
        let radius = asteroid.props().map_or(0.0, |p| p.radius);
        self.spawn_toroidal(pos, vel, radius, EntityKind::Asteroid(asteroid)).map(Some)
    }

    /// Player ship; `pos` is also where it respawns
    pub fn spawn_ship(&mut self, pos: Vec2) -> Result<EntityId, SimError> {
        let pos = self.require_bounds()?.wrap(pos);
        self.spawn_toroidal(pos, Vec2::ZERO, SHIP_RADIUS, EntityKind::Ship(Ship::new(pos)))
    }

    /// Attract-mode ship driven by the autopilot
    pub fn spawn_autopilot(&mut self, pos: Vec2) -> Result<EntityId, SimError> {
        let pos = self.require_bounds()?.wrap(pos);
        self.spawn_toroidal(pos, Vec2::ZERO, SHIP_RADIUS, EntityKind::Ship(Ship::autopilot(pos)))
    }

    pub fn spawn_saucer(&mut self, size: SaucerSize) -> Result<EntityId, SimError> {
        let bounds = self.require_bounds()?;
        let props = size.props();
        let id = self.spawn_toroidal(
            Saucer::entry_point(&bounds),
            Saucer::entry_velocity(size),
            props.radius,
            EntityKind::Saucer(Saucer::new(size)),
        )?;
        log::info!("{:?} saucer {:?} entered", size, id);
        Ok(id)
    }

    /// Fire from a ship's nose; `None` when it may not fire
    pub fn fire_from_ship(&mut self, id: EntityId) -> Option<EntityId> {
        let (muzzle, vel) = {
            let entity = self.registry.get_mut(id)?;
            let (pos, vel, radius) = (entity.pos, entity.vel, entity.radius);
            let ship = entity.as_ship_mut()?;
            if !ship.reserve_bullet() {
                return None;
            }
            let look = ship.look_dir;
            (pos + look * radius * BULLET_MUZZLE, launch_velocity(look, BULLET_SPEED, vel))
        };

        let bullet = EntityKind::Bullet(Bullet::new(id, Category::Ship));
        match self.spawn_toroidal(muzzle, vel, BULLET_RADIUS, bullet) {
            Ok(bullet_id) => Some(bullet_id),
            Err(e) => {
                log::warn!("Ship {:?} could not fire: {}", id, e);
                if let Some(ship) = self.registry.get_mut(id).and_then(Entity::as_ship_mut) {
                    ship.release_bullet();
                }
                None
            }
        }
    }

    fn fire_from_saucer(&mut self, id: EntityId, dir: Vec2) -> Option<EntityId> {
        let entity = self.registry.get(id)?;
        let muzzle = entity.pos + dir * entity.radius * BULLET_MUZZLE;
        let bullet = Bullet::with_lifetime(id, Category::Saucer, SAUCER_BULLET_LIFETIME);
        self.spawn_toroidal(muzzle, dir * SAUCER_BULLET_SPEED, BULLET_RADIUS, EntityKind::Bullet(bullet))
            .ok()
    }

    // === Per-tick update ===

    /// Queue an entity for the next flush; idempotent
    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        let queued = self.registry.mark_for_removal(id);
        if !queued {
            log::trace!("{:?} already queued or gone", id);
        }
        queued
    }

    /// Kinematics, wrap and category hooks for every entity alive at the start
    ///
    /// Iterates a snapshot of ids, so anything spawned during the pass waits
    /// for the next tick.
    pub fn update_all(&mut self, input: &ShipInput, dt: f32) {
        for id in self.registry.ids() {
            let Some(category) = self.registry.get(id).map(Entity::category) else {
                continue;
            };
            match category {
                Category::Ship => self.update_ship(id, input, dt),
                Category::Bullet => self.update_bullet(id, dt),
                Category::Asteroid => self.update_asteroid(id, dt),
                Category::Saucer => self.update_saucer(id, dt),
                Category::Generic => self.move_entity(id, dt),
            }
        }
    }

    fn move_entity(&mut self, id: EntityId, dt: f32) {
        let bounds = self.bounds;
        if let Some(entity) = self.registry.get_mut(id) {
            entity.integrate(dt);
            if entity.wraps
                && let Some(bounds) = bounds
            {
                entity.pos = bounds.wrap(entity.pos);
            }
        }
    }

    fn update_ship(&mut self, id: EntityId, input: &ShipInput, dt: f32) {
        let style = self.settings.control_style;
        let threat = match (self.bounds, self.registry.get(id).and_then(Entity::as_ship)) {
            (Some(bounds), Some(ship)) if !ship.is_player() && !ship.respawning => {
                autopilot::nearest_threat(&self.registry, &bounds, id)
            }
            _ => None,
        };

        let mut fire = false;
        let mut respawning = false;
        {
            let Some(entity) = self.registry.get_mut(id) else {
                return;
            };
            let Entity { pos, vel, kind, .. } = entity;
            let EntityKind::Ship(ship) = kind else {
                return;
            };

            if ship.respawning {
                respawning = true;
                *pos = ship.respawn_point;
                *vel = Vec2::ZERO;
                if ship.advance_respawn(dt) {
                    log::info!("Ship {:?} respawned with {} lives", id, ship.lives);
                }
            } else {
                match ship.controller {
                    ShipController::Player => {
                        ship.steer(vel, input, style, dt);
                        fire = input.shoot.first_press;
                    }
                    ShipController::Autopilot { .. } => {
                        fire = autopilot::drive(ship, *pos, vel, threat, dt);
                    }
                }
            }
        }

        if respawning {
            self.add_freeze_time(RESPAWN_FREEZE_TIME, RESPAWN_FREEZE_MODIFIER);
            return;
        }

        self.move_entity(id, dt);
        if fire {
            self.fire_from_ship(id);
        }
        self.ship_collisions(id, dt);
    }

    /// Non-self bullets, then asteroids, then saucers; the first hit counts
    fn ship_collisions(&mut self, id: EntityId, dt: f32) {
        let player_collision = self.settings.player_collision;
        let Some(ship) = self.registry.get_mut(id).and_then(Entity::as_ship_mut) else {
            return;
        };
        if ship.iframes > 0.0 || !player_collision {
            ship.decay_iframes(dt);
            return;
        }

        let threat = first_overlap_where(&self.registry, id, Category::Bullet, |other| {
            other.as_bullet().is_some_and(|b| !b.is_owned_by(id) && !b.is_disposed())
        })
        .or_else(|| first_overlap(&self.registry, id, Category::Asteroid))
        .or_else(|| first_overlap(&self.registry, id, Category::Saucer));

        if let Some(threat) = threat {
            self.ship_hit(id, threat);
        }
    }

    fn ship_hit(&mut self, ship_id: EntityId, threat_id: EntityId) {
        let Some(category) = self.registry.get(threat_id).map(Entity::category) else {
            return;
        };
        if let Some(bullet) = self.registry.get_mut(threat_id).and_then(Entity::as_bullet_mut) {
            bullet.strike();
        }
        self.registry.mark_for_removal(threat_id);

        let Some(entity) = self.registry.get_mut(ship_id) else {
            return;
        };
        let (pos, radius) = (entity.pos, entity.radius);
        let Some(ship) = entity.as_ship_mut() else {
            return;
        };
        ship.take_hit();
        log::info!("Ship {:?} hit by {:?}, {} lives left", ship_id, category, ship.lives);
        self.add_freeze_time(RESPAWN_FREEZE_TIME, RESPAWN_FREEZE_MODIFIER);
        self.burst(effects::destruction(pos, MEDIUM, radius, None));
    }

    fn update_bullet(&mut self, id: EntityId, dt: f32) {
        self.move_entity(id, dt);
        let expired = self
            .registry
            .get_mut(id)
            .and_then(Entity::as_bullet_mut)
            .is_some_and(|bullet| bullet.tick(dt));
        if expired {
            self.registry.mark_for_removal(id);
        }
    }

    fn update_asteroid(&mut self, id: EntityId, dt: f32) {
        self.move_entity(id, dt);
        if let Some(asteroid) = self.registry.get_mut(id).and_then(Entity::as_asteroid_mut) {
            asteroid.spin(dt);
        }
        if self.registry.is_pending(id) {
            return;
        }

        let Some(bullet_id) = first_overlap_where(&self.registry, id, Category::Bullet, |other| {
            other.as_bullet().is_some_and(|b| b.is_ship_owned() && !b.is_disposed())
        }) else {
            return;
        };
        let Some((hit_heading, owner)) = self.strike_bullet(bullet_id) else {
            return;
        };
        let Some(asteroid) = self.registry.get_mut(id).and_then(Entity::as_asteroid_mut) else {
            return;
        };
        asteroid.hit_heading = Some(hit_heading);
        let points = asteroid.score();
        self.registry.mark_for_removal(id);
        self.award_score(points, owner);
    }

    /// Dispose a bullet that hit something; returns its heading and shooter
    fn strike_bullet(&mut self, bullet_id: EntityId) -> Option<(f32, Option<EntityId>)> {
        let entity = self.registry.get_mut(bullet_id)?;
        let bullet_heading = heading(entity.vel);
        let bullet = entity.as_bullet_mut()?;
        bullet.strike();
        let owner = bullet.owner;
        self.registry.mark_for_removal(bullet_id);
        Some((bullet_heading, owner))
    }

    fn update_saucer(&mut self, id: EntityId, dt: f32) {
        let Some(bounds) = self.bounds else {
            self.move_entity(id, dt);
            return;
        };
        let ships: Vec<Vec2> = self
            .registry
            .of_category(Category::Ship)
            .filter(|e| e.as_ship().is_some_and(|s| !s.respawning))
            .map(|e| e.pos)
            .collect();

        let shot = {
            let Some(entity) = self.registry.get_mut(id) else {
                return;
            };
            let Entity { pos, vel, kind, .. } = entity;
            let EntityKind::Saucer(saucer) = kind else {
                return;
            };
            saucer.retarget(*pos, &bounds, ships);
            saucer.drift(vel, dt, &mut self.rng);
            saucer.fire(dt, &mut self.rng)
        };

        self.move_entity(id, dt);
        if let Some(dir) = shot {
            self.fire_from_saucer(id, dir);
        }
        if self.registry.is_pending(id) {
            return;
        }

        if let Some(asteroid_id) = first_overlap(&self.registry, id, Category::Asteroid) {
            log::debug!("Saucer {:?} collided with asteroid {:?}", id, asteroid_id);
            self.registry.mark_for_removal(asteroid_id);
            self.registry.mark_for_removal(id);
            return;
        }

        let Some(bullet_id) = first_overlap_where(&self.registry, id, Category::Bullet, |other| {
            other.as_bullet().is_some_and(|b| b.is_ship_owned() && !b.is_disposed())
        }) else {
            return;
        };
        let Some((_, owner)) = self.strike_bullet(bullet_id) else {
            return;
        };
        let points = self
            .registry
            .get(id)
            .and_then(Entity::as_saucer)
            .map_or(0, |s| s.props().score);
        self.registry.mark_for_removal(id);
        self.award_score(points, owner);
    }

    /// Remove everything queued, running each entity's removal hook once
    ///
    /// Returns how many entities were removed.
    pub fn flush_removals(&mut self) -> usize {
        let mut removed = 0;
        for id in self.registry.take_pending() {
            match self.registry.remove(id) {
                Some(entity) => {
                    removed += 1;
                    self.on_remove(entity);
                }
                None => log::trace!("{:?} already removed", id),
            }
        }
        removed
    }

    fn on_remove(&mut self, entity: Entity) {
        let Entity { id, pos, vel, radius, kind, .. } = entity;
        match kind {
            EntityKind::Asteroid(asteroid) => {
                log::debug!("Asteroid {:?} (tier {}) destroyed", id, asteroid.tier);
                if let Some(child) = asteroid.child_tier() {
                    for _ in 0..ASTEROID_CHILDREN {
                        match self.spawn_asteroid_at(child, pos) {
                            Ok(Some(_)) => {}
                            Ok(None) => break,
                            Err(e) => {
                                log::warn!("Asteroid split failed: {}", e);
                                break;
                            }
                        }
                    }
                }
                self.burst(effects::destruction(pos, asteroid.tier, radius, asteroid.hit_heading));
            }
            EntityKind::Bullet(bullet) => {
                if bullet.is_ship_owned()
                    && let Some(ship) = bullet
                        .owner
                        .and_then(|owner| self.registry.get_mut(owner))
                        .and_then(Entity::as_ship_mut)
                {
                    ship.release_bullet();
                }
                if bullet.collided {
                    self.trigger_effect(effects::bullet_impact(pos, heading(vel)));
                }
            }
            EntityKind::Saucer(saucer) => {
                log::info!("{:?} saucer {:?} destroyed", saucer.size, id);
                self.burst(effects::destruction(pos, MEDIUM, radius, None));
            }
            EntityKind::Ship(_) => log::debug!("Ship {:?} removed", id),
            EntityKind::Generic => {}
        }
    }

    // === Score and rounds ===

    /// Add points; bonus lives go to the shooter, else the player ship
    pub fn award_score(&mut self, points: u64, shooter: Option<EntityId>) {
        let lives = self.rounds.add_score(points);
        if lives == 0 {
            return;
        }
        let target = shooter
            .filter(|id| self.registry.get(*id).and_then(Entity::as_ship).is_some())
            .or_else(|| self.player_ship_id());
        if let Some(ship) = target
            .and_then(|id| self.registry.get_mut(id))
            .and_then(Entity::as_ship_mut)
        {
            ship.lives += lives;
        }
    }

    /// Begin the next round and spawn its large asteroids
    pub fn start_round(&mut self) {
        let count = self.rounds.new_round();
        for _ in 0..count {
            if let Err(e) = self.spawn_asteroid(LARGE) {
                log::warn!("Could not spawn round asteroids: {}", e);
                break;
            }
        }
    }

    /// Round countdown and saucer cadence for one tick
    pub fn update_rounds(&mut self, dt: f32) {
        let asteroids = self.registry.count(Category::Asteroid);
        if self.rounds.round_start_update(dt, asteroids) {
            self.start_round();
        }

        let asteroids = self.registry.count(Category::Asteroid);
        let saucer_alive = self.registry.count(Category::Saucer) > 0;
        if let Some(size) = self.rounds.saucer_update(dt, asteroids, saucer_alive)
            && let Err(e) = self.spawn_saucer(size)
        {
            log::warn!("Could not spawn saucer: {}", e);
        }
    }

    pub fn rounds(&self) -> &RoundScheduler {
        &self.rounds
    }

    // === Particles and effects ===

    /// Start a step-driven effect; false when particles are off or the
    /// config is invalid
    pub fn trigger_effect(&mut self, config: EmissionConfig) -> bool {
        if !self.settings.particles {
            return false;
        }
        match EmissionEffect::new(config) {
            Ok(mut effect) => {
                effect.start();
                self.effects.push(effect);
                true
            }
            Err(e) => {
                log::warn!("Rejected emission effect: {}", e);
                false
            }
        }
    }

    fn burst(&mut self, stages: [EmissionConfig; 2]) {
        for stage in stages {
            self.trigger_effect(stage);
        }
    }

    /// Run an effect on its own thread, feeding this world's particle set
    pub fn start_background_effect(&mut self, config: EmissionConfig) -> Result<BackgroundEmission, SimError> {
        let effect = EmissionEffect::new(config)?;
        let seed = self.rng.random();
        Ok(effect.start_background(self.particles.sink(), seed))
    }

    /// Advance running effects, pushing what they emit; finished ones are dropped
    pub fn advance_effects(&mut self, dt: f32) {
        let Self { effects, rng, particles, .. } = self;
        for effect in effects.iter_mut() {
            effect.advance(dt, &mut *rng, |particle| {
                particles.push(particle);
            });
        }
        effects.retain(EmissionEffect::is_running);
    }

    /// Age particles and drop the expired ones
    pub fn update_particles(&mut self, dt: f32) {
        self.particles.update(dt);
        self.particles.flush_removals();
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    // === Slow motion ===

    /// Run the simulation at `modifier` speed for the next `time` seconds
    pub fn add_freeze_time(&mut self, time: f32, modifier: f32) {
        self.freeze_time = time.max(0.0);
        self.freeze_modifier = modifier.max(0.0);
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_time > 0.0
    }

    /// Apply slow motion to a frame delta, counting the freeze down in real time
    pub fn scale_dt(&mut self, dt: f32) -> f32 {
        if self.freeze_time <= 0.0 {
            return dt;
        }
        self.freeze_time = (self.freeze_time - dt).max(0.0);
        dt * self.freeze_modifier
    }

    // === Read-only views ===

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.registry.iter()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.registry.get(id)
    }

    /// Direct access for drivers that place or nudge entities
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.registry.get_mut(id)
    }

    /// Draw positions for an entity, including its wrapped reflections
    pub fn images(&self, entity: &Entity) -> [Vec2; 4] {
        match self.bounds {
            Some(bounds) if entity.wraps => bounds.four_images(entity.pos),
            _ => [entity.pos; 4],
        }
    }

    /// First player-controlled ship
    pub fn player_ship_id(&self) -> Option<EntityId> {
        self.registry
            .of_category(Category::Ship)
            .find(|e| e.as_ship().is_some_and(Ship::is_player))
            .map(|e| e.id)
    }

    /// Ship the HUD follows: the player if any, else the first ship
    fn hud_ship(&self) -> Option<&Ship> {
        let player = self.player_ship_id().and_then(|id| self.registry.get(id));
        player
            .or_else(|| self.registry.of_category(Category::Ship).next())
            .and_then(Entity::as_ship)
    }

    /// Player ship out of lives and done respawning
    pub fn is_game_over(&self) -> bool {
        self.player_ship_id()
            .and_then(|id| self.registry.get(id))
            .and_then(Entity::as_ship)
            .is_some_and(|ship| ship.lives == 0 && !ship.respawning)
    }

    pub fn hud(&self) -> Hud {
        let ship = self.hud_ship();
        Hud {
            score: self.rounds.score(),
            lives: ship.map_or(0, |s| s.lives),
            round: self.rounds.round(),
            respawning: ship.is_some_and(|s| s.respawning),
            round_starting: self.rounds.is_round_starting(),
            game_over: self.is_game_over(),
        }
    }
}

fn check_radius(radius: f32) -> Result<(), SimError> {
    // Also rejects NaN
    if !(radius >= 0.0) {
        return Err(SimError::NegativeRadius(radius));
    }
    Ok(())
}
