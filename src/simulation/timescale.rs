//! Time controller and wall clock guard
//!
//! The controller holds an index into an ordered table of signed speed
//! multipliers. Each tick the multiplier scales the elapsed real time into
//! the integration `dt`, and advances the frame index by the same amount of
//! frames.

use bevy::log::{debug, info};

use super::history::{FrameIndex, SUBDIVISIONS};

/// Rewind fast, rewind, rewind slow, forward slow, forward, forward fast
pub const TIME_SCALES: [f64; 6] = [-2.0, -1.0, -0.5, 0.5, 1.0, 2.0];

/// Index of normal forward play in `TIME_SCALES`
pub const DEFAULT_TIMESCALE: usize = 4;

/// Gaps longer than this (seconds) are treated as window-drag stalls
pub const MAX_FRAME_GAP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeController {
    scales: Vec<f64>,
    index: usize,
    start: usize, // index selected at construction
}

impl TimeController {
    pub fn new() -> Self {
        Self::with_scales(TIME_SCALES.to_vec(), DEFAULT_TIMESCALE)
    }

    /// Custom table; multipliers are snapped to quarter frames, zero entries
    /// dropped, the table sorted ascending and `index` clamped into range
    pub fn with_scales(mut scales: Vec<f64>, index: usize) -> Self {
        for s in scales.iter_mut() {
            *s = (*s * SUBDIVISIONS as f64).round() / SUBDIVISIONS as f64;
        }
        scales.retain(|s| *s != 0.0 && s.is_finite());
        scales.sort_by(|a, b| a.total_cmp(b));
        if scales.is_empty() {
            scales = TIME_SCALES.to_vec();
        }
        let index = index.min(scales.len() - 1);
        Self { scales, index, start: index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Signed multiplier currently selected
    pub fn multiplier(&self) -> f64 {
        self.scales[self.index]
    }

    pub fn is_rewinding(&self) -> bool {
        self.multiplier() < 0.0
    }

    /// One step towards fast-forward; no-op at the fastest entry
    pub fn speed_up(&mut self) -> bool {
        if self.index + 1 < self.scales.len() {
            self.index += 1;
            info!("timescale x{}", self.multiplier());
            true
        } else {
            false
        }
    }

    /// One step towards fast-rewind; no-op at the slowest entry
    pub fn slow_down(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            info!("timescale x{}", self.multiplier());
            true
        } else {
            false
        }
    }

    /// Back to the starting entry (normal forward play by default)
    pub fn reset(&mut self) {
        if self.index != self.start {
            self.index = self.start;
            info!("timescale reset to x{}", self.multiplier());
        }
    }

    /// Integration step for `wall_dt` seconds of real time
    pub fn effective_dt(&self, wall_dt: f64) -> f64 {
        wall_dt * self.multiplier()
    }

    /// Signed frame advance per tick, in quarter frames
    pub fn frame_step(&self) -> i64 {
        (self.multiplier() * SUBDIVISIONS as f64).round() as i64
    }

    /// Frame index after one tick from `frame`, never below frame 0
    pub fn advance(&self, frame: FrameIndex) -> FrameIndex {
        frame.offset(self.frame_step())
    }

    /// Rewinding stops once simulated time is back at the start
    pub fn rewind_exhausted(&self, t_now: f64) -> bool {
        self.is_rewinding() && t_now <= 0.0
    }
}

impl Default for TimeController {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters raw frame deltas from the host clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    pub max_gap: f64, // seconds
}

impl FrameClock {
    pub fn new(max_gap: f64) -> Self {
        Self { max_gap }
    }

    /// `Some(elapsed)` for a usable delta, `None` for a stall that should be
    /// skipped rather than integrated
    pub fn accept(&self, elapsed: f64) -> Option<f64> {
        if !elapsed.is_finite() || elapsed < 0.0 || elapsed >= self.max_gap {
            debug!("skipping tick with clock gap {elapsed}s");
            return None;
        }
        Some(elapsed)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_GAP)
    }
}
