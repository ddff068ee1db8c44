//! Simulation settings
//!
//! Read by the world every tick; storage of the JSON lives with the caller.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Ship control scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlStyle {
    /// Rotate, thrust and brake
    #[default]
    Classic,
    /// Independent move and look sticks
    TwoStick,
}

impl ControlStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlStyle::Classic => "Classic",
            ControlStyle::TwoStick => "TwoStick",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(ControlStyle::Classic),
            "twostick" | "two-stick" | "twin" => Some(ControlStyle::TwoStick),
            _ => None,
        }
    }
}

/// Default particle budget
pub const DEFAULT_MAX_PARTICLES: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub control_style: ControlStyle,
    /// Frame cap, 0 = uncapped
    pub fps_cap: u32,
    /// Particle effects (explosions, debris, impacts)
    pub particles: bool,
    /// Live particle cap
    pub max_particles: usize,
    /// Ships can be hit (off is a debug cheat)
    pub player_collision: bool,
    /// Attract mode plays itself when idle
    pub demo_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            control_style: ControlStyle::Classic,
            fps_cap: 60,
            particles: true,
            max_particles: DEFAULT_MAX_PARTICLES,
            player_collision: true,
            demo_enabled: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Seconds per frame for the cap, `None` when uncapped
    pub fn frame_time(&self) -> Option<f32> {
        (self.fps_cap > 0).then(|| 1.0 / self.fps_cap as f32)
    }

    /// Effective particle count cap
    pub fn particle_budget(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.max_particles
        }
    }

    /// Read settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
