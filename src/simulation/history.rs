//! Per-particle timeline used for replay and rewind
//!
//! Frame indices are fractional (half frames appear at 0.5x speed and in the
//! backfilled entries of 1x/2x play), so they are stored as an integer count
//! of quarter frames instead of floats. Entries are write-once: the first
//! snapshot recorded for an index is the one every later replay returns.

use std::collections::BTreeMap;
use std::fmt;

use super::states::Snapshot;

/// Sub-steps per whole frame
pub const SUBDIVISIONS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FrameIndex(i64); // quarter frames

impl FrameIndex {
    pub const ZERO: FrameIndex = FrameIndex(0);

    pub fn from_quarters(q: i64) -> Self {
        FrameIndex(q)
    }

    /// Nearest quarter frame to `frames`
    pub fn from_frames(frames: f64) -> Self {
        FrameIndex((frames * SUBDIVISIONS as f64).round() as i64)
    }

    pub fn quarters(self) -> i64 {
        self.0
    }

    pub fn as_frames(self) -> f64 {
        self.0 as f64 / SUBDIVISIONS as f64
    }

    /// Offset by a signed number of quarter frames, never below zero
    pub fn offset(self, quarters: i64) -> Self {
        FrameIndex((self.0 + quarters).max(0))
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_frames())
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: BTreeMap<FrameIndex, Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` at `frame` unless that frame is already recorded.
    /// Returns `true` if the entry was written.
    pub fn record(&mut self, frame: FrameIndex, snapshot: Snapshot) -> bool {
        if self.entries.contains_key(&frame) {
            return false;
        }
        self.entries.insert(frame, snapshot);
        true
    }

    pub fn get(&self, frame: FrameIndex) -> Option<&Snapshot> {
        self.entries.get(&frame)
    }

    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.entries.contains_key(&frame)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything and restart from a new creation state at `frame`.
    /// Only for particles that are (re)placed, never during playback.
    pub fn reset(&mut self, frame: FrameIndex, snapshot: Snapshot) {
        self.entries.clear();
        self.record(frame, snapshot);
    }
}
