//! Player ship: controls, firing budget, damage and respawn

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::ControlStyle;
use crate::{rotate, safe_normalize};

/// Pressed state of one input action this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    /// Held down
    pub pressed: bool,
    /// Went down this frame
    pub first_press: bool,
}

impl ActionState {
    pub const HELD: ActionState = ActionState { pressed: true, first_press: false };
    pub const TAPPED: ActionState = ActionState { pressed: true, first_press: true };
}

/// Per-frame ship input snapshot (mapping from devices is external)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipInput {
    pub up: ActionState,
    pub down: ActionState,
    pub left: ActionState,
    pub right: ActionState,
    /// Look actions, two-stick only
    pub up_alt: ActionState,
    pub down_alt: ActionState,
    pub left_alt: ActionState,
    pub right_alt: ActionState,
    pub shoot: ActionState,
}

impl ShipInput {
    /// Movement axis in screen space (y grows downward)
    pub fn move_axis(&self) -> Vec2 {
        axis(self.up, self.down, self.left, self.right)
    }

    pub fn look_axis(&self) -> Vec2 {
        axis(self.up_alt, self.down_alt, self.left_alt, self.right_alt)
    }
}

fn axis(up: ActionState, down: ActionState, left: ActionState, right: ActionState) -> Vec2 {
    let mut v = Vec2::ZERO;
    if up.pressed {
        v.y -= 1.0;
    }
    if down.pressed {
        v.y += 1.0;
    }
    if left.pressed {
        v.x -= 1.0;
    }
    if right.pressed {
        v.x += 1.0;
    }
    v
}

/// Who drives the ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShipController {
    Player,
    /// Attract-mode AI with its own fire cooldown
    Autopilot { shoot_timer: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    /// Facing (unit vector)
    pub look_dir: Vec2,
    /// Travel direction (unit vector)
    pub move_dir: Vec2,
    /// Thruster visual state
    pub accelerating: bool,
    /// Invulnerability seconds left, never negative
    pub iframes: f32,
    pub lives: u32,
    /// Bullets currently alive, at most `MAX_BULLETS`
    pub bullets_in_flight: u32,
    pub respawning: bool,
    pub respawn_timer: f32,
    /// Where the ship is pinned while respawning
    pub respawn_point: Vec2,
    pub controller: ShipController,
}

impl Ship {
    pub fn new(respawn_point: Vec2) -> Self {
        Self {
            look_dir: Vec2::X,
            move_dir: Vec2::X,
            accelerating: false,
            iframes: SHIP_SPAWN_IFRAMES,
            lives: SHIP_START_LIVES,
            bullets_in_flight: 0,
            respawning: false,
            respawn_timer: 0.0,
            respawn_point,
            controller: ShipController::Player,
        }
    }

    pub fn autopilot(respawn_point: Vec2) -> Self {
        Self {
            controller: ShipController::Autopilot { shoot_timer: 0.0 },
            ..Self::new(respawn_point)
        }
    }

    pub fn is_player(&self) -> bool {
        self.controller == ShipController::Player
    }

    /// Collision checks apply this tick
    pub fn is_vulnerable(&self) -> bool {
        !self.respawning && self.iframes <= 0.0
    }

    /// Decay invulnerability to exactly zero
    pub fn decay_iframes(&mut self, dt: f32) {
        self.iframes = (self.iframes - dt).max(0.0);
    }

    /// Apply one frame of control input to the ship velocity
    pub fn steer(&mut self, vel: &mut Vec2, input: &ShipInput, style: ControlStyle, dt: f32) {
        match style {
            ControlStyle::Classic => self.steer_classic(vel, input, dt),
            ControlStyle::TwoStick => self.steer_two_stick(vel, input, dt),
        }
    }

    /// Rotate with left/right, thrust forward, brake against current motion
    fn steer_classic(&mut self, vel: &mut Vec2, input: &ShipInput, dt: f32) {
        let mut heading = self.move_dir;
        if input.left.pressed {
            heading = rotate(heading, -SHIP_ANGULAR_SPEED * dt);
        }
        if input.right.pressed {
            heading = rotate(heading, SHIP_ANGULAR_SPEED * dt);
        }
        let throttle = if input.up.pressed { 1.0 } else { 0.0 };
        let brake = if input.down.pressed { 1.0 } else { 0.0 };

        self.accelerating = throttle > 0.0;
        let heading = match safe_normalize(heading) {
            Vec2::ZERO => self.look_dir,
            dir => dir,
        };

        *vel += heading * SHIP_ACCELERATION * throttle * dt;

        let braking = SHIP_ACCELERATION * brake * dt;
        if braking > 0.0 {
            let speed = vel.length();
            *vel = if braking >= speed {
                Vec2::ZERO
            } else {
                *vel - safe_normalize(*vel) * braking
            };
        }

        *vel = clamp_speed(*vel, SHIP_MAX_VELOCITY);
        self.move_dir = heading;
        self.look_dir = heading;
    }

    /// Independent move and look vectors
    fn steer_two_stick(&mut self, vel: &mut Vec2, input: &ShipInput, dt: f32) {
        let move_axis = safe_normalize(input.move_axis());
        let look_axis = safe_normalize(input.look_axis());

        let facing = if look_axis != Vec2::ZERO { look_axis } else { move_axis };
        self.accelerating = move_axis.dot(facing) > 0.5;

        *vel += move_axis * SHIP_ACCELERATION * dt;
        *vel = clamp_speed(*vel, SHIP_MAX_VELOCITY);

        if facing != Vec2::ZERO {
            self.look_dir = facing;
        }
        let dir = safe_normalize(*vel);
        if dir != Vec2::ZERO {
            self.move_dir = dir;
        }
    }

    /// Whether another bullet may be fired
    pub fn can_fire(&self) -> bool {
        !self.respawning && self.bullets_in_flight < MAX_BULLETS
    }

    /// Reserve a bullet slot; false when the in-flight cap is reached
    pub fn reserve_bullet(&mut self) -> bool {
        if !self.can_fire() {
            return false;
        }
        self.bullets_in_flight += 1;
        true
    }

    /// A bullet of ours disappeared
    pub fn release_bullet(&mut self) {
        self.bullets_in_flight = self.bullets_in_flight.saturating_sub(1);
    }

    /// Lose a life and freeze at the respawn point
    pub fn take_hit(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.respawning = true;
        self.respawn_timer = SHIP_RESPAWN_TIME;
        self.accelerating = false;
    }

    /// Count the respawn freeze down; true on the tick it completes
    pub fn advance_respawn(&mut self, dt: f32) -> bool {
        if !self.respawning {
            return false;
        }
        self.accelerating = false;
        self.respawn_timer -= dt;
        if self.respawn_timer <= 0.0 {
            self.respawning = false;
            self.respawn_timer = 0.0;
            self.iframes = SHIP_SPAWN_IFRAMES;
            if let ShipController::Autopilot { .. } = self.controller {
                // Attract mode never runs out of lives
                self.lives += 1;
            }
            return true;
        }
        false
    }
}

fn clamp_speed(vel: Vec2, max: f32) -> Vec2 {
    if vel.length_squared() > max * max {
        safe_normalize(vel) * max
    } else {
        vel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_classic_thrust_accelerates_along_heading() {
        let mut ship = Ship::new(Vec2::ZERO);
        let mut vel = Vec2::ZERO;
        let input = ShipInput { up: ActionState::HELD, ..Default::default() };

        ship.steer(&mut vel, &input, ControlStyle::Classic, DT);
        assert!(ship.accelerating);
        assert!(vel.x > 0.0);
        assert!(vel.y.abs() < 1e-6);
    }

    #[test]
    fn test_classic_rotation_turns_heading() {
        let mut ship = Ship::new(Vec2::ZERO);
        let mut vel = Vec2::ZERO;
        let input = ShipInput { right: ActionState::HELD, ..Default::default() };

        for _ in 0..15 {
            ship.steer(&mut vel, &input, ControlStyle::Classic, DT);
        }
        // Quarter turn clockwise on screen (y down)
        assert!(ship.look_dir.x.abs() < 1e-3);
        assert!((ship.look_dir.y - 1.0).abs() < 1e-3);
        assert!(!ship.accelerating);
    }

    #[test]
    fn test_classic_brake_stops_without_reversing() {
        let mut ship = Ship::new(Vec2::ZERO);
        let mut vel = Vec2::new(3.0, 0.0);
        let input = ShipInput { down: ActionState::HELD, ..Default::default() };
        ship.steer(&mut vel, &input, ControlStyle::Classic, DT);
        assert_eq!(vel, Vec2::ZERO);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut ship = Ship::new(Vec2::ZERO);
        let mut vel = Vec2::new(SHIP_MAX_VELOCITY, 0.0);
        let input = ShipInput { up: ActionState::HELD, ..Default::default() };
        ship.steer(&mut vel, &input, ControlStyle::Classic, 1.0);
        assert!(vel.length() <= SHIP_MAX_VELOCITY + 1e-3);
    }

    #[test]
    fn test_two_stick_accelerating_only_when_aligned() {
        let mut ship = Ship::new(Vec2::ZERO);
        let mut vel = Vec2::ZERO;

        let aligned = ShipInput {
            right: ActionState::HELD,
            right_alt: ActionState::HELD,
            ..Default::default()
        };
        ship.steer(&mut vel, &aligned, ControlStyle::TwoStick, DT);
        assert!(ship.accelerating);

        let opposed = ShipInput {
            right: ActionState::HELD,
            left_alt: ActionState::HELD,
            ..Default::default()
        };
        ship.steer(&mut vel, &opposed, ControlStyle::TwoStick, DT);
        assert!(!ship.accelerating);
        assert_eq!(ship.look_dir, Vec2::new(-1.0, 0.0));
        assert_eq!(ship.move_dir, Vec2::X);
    }

    #[test]
    fn test_bullet_budget() {
        let mut ship = Ship::new(Vec2::ZERO);
        for _ in 0..MAX_BULLETS {
            assert!(ship.reserve_bullet());
        }
        assert!(!ship.reserve_bullet());
        ship.release_bullet();
        assert!(ship.reserve_bullet());

        let mut empty = Ship::new(Vec2::ZERO);
        empty.release_bullet();
        assert_eq!(empty.bullets_in_flight, 0);
    }

    #[test]
    fn test_hit_and_respawn_cycle() {
        let mut ship = Ship::new(Vec2::new(400.0, 240.0));
        ship.iframes = 0.0;
        ship.take_hit();
        assert_eq!(ship.lives, SHIP_START_LIVES - 1);
        assert!(ship.respawning);
        assert!(!ship.is_vulnerable());

        let mut finished = false;
        for _ in 0..200 {
            if ship.advance_respawn(DT) {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert!(!ship.respawning);
        assert_eq!(ship.iframes, SHIP_SPAWN_IFRAMES);
    }

    #[test]
    fn test_iframes_decay_to_zero() {
        let mut ship = Ship::new(Vec2::ZERO);
        ship.decay_iframes(0.4);
        ship.decay_iframes(5.0);
        assert_eq!(ship.iframes, 0.0);
        assert!(ship.is_vulnerable());
    }

    #[test]
    fn test_autopilot_gains_life_on_respawn() {
        let mut ship = Ship::autopilot(Vec2::ZERO);
        ship.take_hit();
        ship.advance_respawn(SHIP_RESPAWN_TIME + 0.1);
        assert_eq!(ship.lives, SHIP_START_LIVES);
    }
}
