//! Configuration types for loading and saving sandbox scenarios as YAML.
//!
//! A scenario file consists of:
//!
//! - [`EngineConfig`]     – display size, clock guard and timescale table
//! - [`MaterialConfig`]   – custom materials available to the editor
//! - `scale`              – pixels per metre the scenario was built at
//! - [`ParticleRecord`]   – persisted state of each particle, in order
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   width: 1920
//!   height: 1080
//!   max_frame_gap: 0.1
//!   start_timescale: 4
//!
//! materials:
//!   - name: "Foam - 30.0kgm^-3"
//!     density: 30.0
//!     colour: [250, 240, 200]
//!
//! scale: 100.0
//! particles:
//!   - has_random_velocity: false
//!     has_trace: true
//!     restitution: 0.8
//!     material: "Steel - 7850kgm^-3"
//!     radius: 0.5
//!     density: 7850.0
//!     mass: 4110.0
//!     volume: 0.524
//!     velocity: [ 2.0, 0.0 ]
//!     colour: [ 120, 130, 140 ]
//!     position: [ 400.0, 300.0 ]
//!     acceleration: [ 0.0, 9.81 ]
//! ```
//!
//! Only `scale` is required; every other section has a default. These types
//! are mapped into the runtime [`crate::Simulation`] by
//! [`crate::Scenario::build_scenario`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::simulation::timescale::{DEFAULT_TIMESCALE, MAX_FRAME_GAP, TIME_SCALES};

/// Display and clock settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub width: f64, // play area width in pixels
    pub height: f64, // play area height in pixels
    pub max_frame_gap: f64, // clock deltas at or above this are skipped (s)
    pub start_timescale: usize, // index into `timescales`
    pub timescales: Vec<f64>, // ordered signed speed multipliers
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            max_frame_gap: MAX_FRAME_GAP,
            start_timescale: DEFAULT_TIMESCALE,
            timescales: TIME_SCALES.to_vec(),
        }
    }
}

/// A user-created material
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MaterialConfig {
    pub name: String, // full display name, e.g. "Foam - 30.0kgm^-3"
    pub density: f64, // kg/m^3
    pub colour: [u8; 3],
}

/// Persisted state of one particle
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ParticleRecord {
    pub has_random_velocity: bool,
    pub has_trace: bool,
    pub restitution: f64,
    pub material: String,
    pub radius: f64, // m
    pub density: f64, // kg/m^3
    pub mass: f64, // kg
    pub volume: f64, // m^3
    pub velocity: [f64; 2], // m/s
    pub colour: [u8; 3],
    pub position: [f64; 2], // pixels
    pub acceleration: [f64; 2], // m/s^2
}

/// Top-level scenario file
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub materials: Vec<MaterialConfig>,
    pub scale: f64, // pixels per metre
    #[serde(default)]
    pub particles: Vec<ParticleRecord>,
}

impl ScenarioConfig {
    pub fn from_yaml_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening scenario {}", path.display()))?;
        let cfg: ScenarioConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        Ok(cfg)
    }

    pub fn to_yaml_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_yaml::to_writer(BufWriter::new(file), self)
            .with_context(|| format!("writing scenario {}", path.display()))?;
        Ok(())
    }
}

/// Custom materials file: a plain YAML list of [`MaterialConfig`]
pub fn load_materials(path: &Path) -> Result<Vec<MaterialConfig>> {
    let file = File::open(path).with_context(|| format!("opening materials {}", path.display()))?;
    let list = serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing materials {}", path.display()))?;
    Ok(list)
}

pub fn save_materials(path: &Path, materials: &[MaterialConfig]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_yaml::to_writer(BufWriter::new(file), materials)
        .with_context(|| format!("writing materials {}", path.display()))?;
    Ok(())
}
