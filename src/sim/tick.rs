//! Per-frame simulation driver
//!
//! One call advances the world by a clamped frame delta. Within a tick the
//! order is fixed: round and saucer cadence, entity kinematics with their
//! collision hooks, the removal flush, then effects and particles.

use serde::{Deserialize, Serialize};

use super::ship::ShipInput;
use super::state::World;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Action states for player ships
    pub ship: ShipInput,
    /// Skip to the next round (debug/testing)
    pub skip_round: bool,
}

/// Clamp a raw frame delta into `[0, MAX_FRAME_DT]`
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 }
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    let dt = world.scale_dt(clamp_dt(dt));
    if world.bounds().is_none() {
        log::trace!("Tick skipped, bounds not set");
        return;
    }

    // Game over freezes the field but lets the last bursts play out
    if !world.is_game_over() {
        if input.skip_round {
            world.start_round();
        }
        world.update_rounds(dt);
        world.update_all(&input.ship, dt);
        world.flush_removals();
    }

    world.advance_effects(dt);
    world.update_particles(dt);
}
