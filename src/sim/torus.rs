//! Toroidal play field
//!
//! Leaving one edge re-enters the opposite edge. Positions are kept in
//! `[0, W) x [0, H)`; anything near an edge can also be "seen" from the other
//! side, so drawing and nearest-threat queries work on the four congruent
//! images of a point.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sign_or_zero;

/// World bounds for wrapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Result<Self, SimError> {
        // Also rejects NaN
        if !(width > 0.0 && height > 0.0) {
            return Err(SimError::InvalidBounds { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Wrap a position into `[0, W) x [0, H)`, whatever the overshoot
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(wrap_axis(p.x, self.width), wrap_axis(p.y, self.height))
    }

    /// Whether `p` already lies inside the half-open field
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height
    }

    /// The point plus its reflections toward the nearest opposite edges
    ///
    /// Reflection direction follows the sign of `(W/2 - x, H/2 - y)`: a point
    /// on the left half gets an image one width to the right, and so on. A
    /// point exactly on a center line yields duplicate images on that axis.
    pub fn four_images(&self, p: Vec2) -> [Vec2; 4] {
        let sx = sign_or_zero(self.width / 2.0 - p.x) * self.width;
        let sy = sign_or_zero(self.height / 2.0 - p.y) * self.height;
        [
            p,
            p + Vec2::new(sx, 0.0),
            p + Vec2::new(0.0, sy),
            p + Vec2::new(sx, sy),
        ]
    }

    /// The image of `p` closest to `query` (squared Euclidean distance)
    ///
    /// Ties resolve to the earliest image, so the unwrapped position wins
    /// when it is already as close as any reflection.
    pub fn nearest_image(&self, p: Vec2, query: Vec2) -> Vec2 {
        let images = self.four_images(p);
        let mut best = images[0];
        let mut best_dist = best.distance_squared(query);
        for &image in &images[1..] {
            let dist = image.distance_squared(query);
            if dist < best_dist {
                best = image;
                best_dist = dist;
            }
        }
        best
    }
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent { wrapped - extent } else { wrapped }
}
