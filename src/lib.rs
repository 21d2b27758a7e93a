pub mod simulation;
pub mod configuration;
pub mod visualization;

pub use simulation::states::{NVec2, ParticleId, Rgb, Snapshot};
pub use simulation::numeric::{round_to_sig_fig, distance};
pub use simulation::params::{Bounds, RadiusLimits};
pub use simulation::material::{Material, MaterialKind, MaterialRegistry, DEFAULT_MATERIAL};
pub use simulation::history::{FrameIndex, History};
pub use simulation::particle::{Dimension, Particle, Trace};
pub use simulation::collision::{CollisionGraph, elastic_response};
pub use simulation::timescale::{FrameClock, TimeController, TIME_SCALES};
pub use simulation::engine::{NewParticle, Simulation, SimulationContext, TickOutcome};
pub use simulation::editor::{ParticleForm, ParticleSettings, Placement};
pub use simulation::scenario::{Scenario, custom_materials, export_scenario};

pub use configuration::config::{EngineConfig, MaterialConfig, ParticleRecord, ScenarioConfig, load_materials, save_materials};

pub use visualization::overlay::{DrawCommand, DrawList, RenderSink, render_simulation};
pub use visualization::sandbox2d::run_sandbox;
