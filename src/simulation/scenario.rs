//! Build a runnable sandbox from configuration, and turn one back into
//! configuration for saving.
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a `Scenario` holding:
//! - the simulation with every particle at frame 0
//! - the material registry with the scenario's custom materials added
//!
//! Particles are rebuilt from the persisted tuple as-is: mass and volume
//! come from the file rather than being derived again.

use anyhow::{bail, Result};
use bevy::log::info;

use crate::configuration::config::{EngineConfig, MaterialConfig, ParticleRecord, ScenarioConfig};
use crate::simulation::engine::{Simulation, SimulationContext};
use crate::simulation::material::MaterialRegistry;
use crate::simulation::params::Bounds;
use crate::simulation::particle::{Particle, Trace};
use crate::simulation::states::{NVec2, ParticleId, Rgb};
use crate::simulation::timescale::{FrameClock, TimeController};

/// Fully initialised sandbox
#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: EngineConfig,
    pub simulation: Simulation,
    pub materials: MaterialRegistry,
}

impl Scenario {
    /// Empty sandbox with default settings
    pub fn empty(engine: EngineConfig) -> Self {
        let context = context_from(&engine, None);
        Self {
            engine,
            simulation: Simulation::with_context(context),
            materials: MaterialRegistry::new(),
        }
    }

    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        if !(cfg.scale > 0.0 && cfg.scale.is_finite()) {
            bail!("scenario scale must be positive, got {}", cfg.scale);
        }

        let mut materials = MaterialRegistry::new();
        for m in &cfg.materials {
            if m.density <= 0.0 {
                bail!("material {:?} has non-positive density {}", m.name, m.density);
            }
            materials.insert_named(m.name.clone(), m.density, Rgb::from(m.colour));
        }

        let context = context_from(&cfg.engine, Some(cfg.scale));
        let mut simulation = Simulation::with_context(context);

        for (i, rec) in cfg.particles.iter().enumerate() {
            if rec.radius <= 0.0 || rec.density <= 0.0 {
                bail!("particle {i}: radius and density must be positive");
            }
            // records may name materials this registry has never seen
            if materials.get(&rec.material).is_none() {
                materials.insert_named(rec.material.clone(), rec.density, Rgb::from(rec.colour));
            }
            let id = simulation.next_id();
            let p = particle_from_record(rec, id, simulation.context.t_now);
            simulation.insert(p);
        }

        info!("loaded scenario with {} particles at scale {}", simulation.len(), cfg.scale);

        Ok(Self {
            engine: cfg.engine,
            simulation,
            materials,
        })
    }

    /// Snapshot the current particles into a saveable config
    pub fn to_config(&self) -> ScenarioConfig {
        export_scenario(&self.engine, &self.simulation, &self.materials)
    }
}

/// Saveable config for a running sandbox: the current scale followed by one
/// record per particle, plus every custom material
pub fn export_scenario(engine: &EngineConfig, simulation: &Simulation, materials: &MaterialRegistry) -> ScenarioConfig {
    ScenarioConfig {
        engine: engine.clone(),
        materials: custom_materials(materials),
        scale: simulation.context.scale,
        particles: simulation.particles().iter().map(record_from_particle).collect(),
    }
}

/// Every custom material in the registry, as saved to YAML
pub fn custom_materials(materials: &MaterialRegistry) -> Vec<MaterialConfig> {
    materials
        .custom()
        .map(|(name, m)| MaterialConfig {
            name: name.to_string(),
            density: m.density,
            colour: m.colour.to_array(),
        })
        .collect()
}

fn context_from(engine: &EngineConfig, scale: Option<f64>) -> SimulationContext {
    let bounds = Bounds::new(engine.width, engine.height);
    let mut ctx = SimulationContext::new(bounds);
    if let Some(s) = scale {
        ctx.scale = s;
    }
    ctx.time = TimeController::with_scales(engine.timescales.clone(), engine.start_timescale);
    ctx.clock = FrameClock::new(engine.max_frame_gap);
    ctx
}

/// Rebuild a particle from its persisted tuple
pub fn particle_from_record(rec: &ParticleRecord, id: ParticleId, t_now: f64) -> Particle {
    let colour = Rgb::from(rec.colour);
    let mut p = Particle::new(
        id,
        rec.restitution,
        rec.material.clone(),
        rec.radius,
        rec.density,
        NVec2::new(rec.velocity[0], rec.velocity[1]),
        colour,
        NVec2::new(rec.position[0], rec.position[1]),
        NVec2::new(rec.acceleration[0], rec.acceleration[1]),
        t_now,
    );
    p.set_dimensions_raw(rec.radius, rec.density, rec.mass, rec.volume);
    p.has_random_velocity = rec.has_random_velocity;
    if rec.has_trace {
        p.trace = Some(Trace::new(colour));
    }
    p
}

/// Persisted tuple for a particle
pub fn record_from_particle(p: &Particle) -> ParticleRecord {
    ParticleRecord {
        has_random_velocity: p.has_random_velocity,
        has_trace: p.trace.is_some(),
        restitution: p.restitution,
        material: p.material.clone(),
        radius: p.radius(),
        density: p.density(),
        mass: p.mass(),
        volume: p.volume(),
        velocity: [p.velocity.x, p.velocity.y],
        colour: p.colour.to_array(),
        position: [p.position.x, p.position.y],
        acceleration: [p.acceleration.x, p.acceleration.y],
    }
}
