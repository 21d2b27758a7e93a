pub mod numeric;
pub mod states;
pub mod params;
pub mod material;
pub mod history;
pub mod particle;
pub mod integrator;
pub mod collision;
pub mod timescale;
pub mod engine;
pub mod editor;
pub mod scenario;
