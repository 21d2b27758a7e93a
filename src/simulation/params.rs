//! Geometry parameters derived from the display
//!
//! `Bounds` is the play area in pixels (origin top-left, y pointing down, the
//! floor is `y = height`). Radius limits and the default zoom follow the
//! display width relative to a 1920 px reference.

use super::numeric::round_to_sig_fig;

/// Reference width that pixel constants are authored against
pub const REFERENCE_WIDTH: f64 = 1920.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64, // pixels
    pub height: f64, // pixels
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Scale a length authored for the reference display to this display
    pub fn scaled_x(&self, px: f64) -> f64 {
        (px * (self.width / REFERENCE_WIDTH)).floor()
    }

    /// Pixels per metre used before the user zooms
    pub fn default_scale(&self) -> f64 {
        self.scaled_x(100.0)
    }

    /// Valid radius range (metres) at the given scale
    pub fn radius_limits(&self, scale: f64) -> RadiusLimits {
        RadiusLimits {
            min: round_to_sig_fig(self.scaled_x(10.0) / scale, 3),
            max: round_to_sig_fig((self.width / 4.0) / scale, 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusLimits {
    pub min: f64,
    pub max: f64,
}

impl RadiusLimits {
    pub fn contains(&self, r: f64) -> bool {
        self.min <= r && r <= self.max
    }

    pub fn clamp(&self, r: f64) -> f64 {
        r.clamp(self.min, self.max)
    }
}
