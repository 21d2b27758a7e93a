//! Core state types for the particle sandbox.
//!
//! - `NVec2` 2d vector used for positions (pixel space), velocities (m/s)
//!   and accelerations (m/s^2)
//! - `ParticleId` opaque handle, unique per simulation session
//! - `Snapshot` the `(position, velocity, time)` tuple stored in history
//! - `Rgb` 8-bit colour used by materials, traces and the renderer

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u64);

/// Recorded state of one particle at one frame index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub position: NVec2, // pixel space
    pub velocity: NVec2, // m/s
    pub time: f64, // simulated time when recorded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn to_array(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb(c[0], c[1], c[2])
    }
}
