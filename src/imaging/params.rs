//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. Callers build
//! them and hand them to [`operations`](super::operations), which does the
//! pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality factor in `(0, 1]`, default 0.8. Clamped on construction.
//! - [`PrepOptions`]: Long-edge cap plus quality, shared by compression and cropping.
//! - [`CropRect`]: Crop region in the pixel space of the rotated canvas.

use serde::{Deserialize, Serialize};

/// Default cap on the longer output edge, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1600;

/// Quality factor for lossy encoding, in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Smallest accepted factor; anything at or below zero is raised to it.
    pub const MIN: f32 = 0.01;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale encoders take.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.8)
    }
}

/// Size cap and quality for one preparation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrepOptions {
    /// Longest allowed output edge in pixels.
    pub max_dimension: u32,
    pub quality: Quality,
}

impl Default for PrepOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: Quality::default(),
        }
    }
}

/// Crop region, in whole pixels of the rotated canvas.
///
/// The editor keeps the rectangle inside the canvas; the crop transform does
/// not re-validate it. Any part that falls outside comes out transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies entirely inside a `width`×`height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}
