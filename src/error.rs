//! Construction-time contract violations
//!
//! Everything here is a startup or construction error. Steady-state
//! conditions (double removal, population caps, degenerate vectors) are
//! absorbed by policy and never surface as a `SimError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("world bounds must be positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },

    #[error("world bounds must be set before spawning a wrapping entity")]
    BoundsNotSet,

    #[error("radius cannot be negative: {0}")]
    NegativeRadius(f32),

    #[error("emission interval must be greater than zero: {0}")]
    InvalidInterval(f32),

    #[error("emission count must be greater than zero")]
    InvalidCount,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
