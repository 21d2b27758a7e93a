//! Editor form for a single particle
//!
//! The GUI owns a set of text fields per particle; this module reads them,
//! validates each value where it is assigned and writes corrected or derived
//! values back into the fields. A field that does not parse aborts the update
//! for that tick and the particle keeps its previous values.

use rand::Rng;

use super::engine::Simulation;
use super::material::MaterialRegistry;
use super::numeric::round_to_sig_fig;
use super::particle::{Dimension, Trace};
use super::states::{NVec2, ParticleId};

/// Raw field contents as typed by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleForm {
    pub restitution: String,
    pub velocity_x: String,
    pub velocity_y: String,
    pub acceleration_x: String,
    pub acceleration_y: String,
    pub radius: String,
    pub mass: String,
    pub height: String, // metres above the floor
    pub lock_height: bool,
    pub random_velocity: bool,
    pub draw_trace: bool,
    pub material: String,
}

/// Parsed form values
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSettings {
    pub restitution: f64,
    pub velocity: NVec2,
    pub acceleration: NVec2,
    pub radius: f64,
    pub mass: f64,
    pub height: f64,
    pub lock_height: bool,
    pub random_velocity: bool,
    pub draw_trace: bool,
    pub material: String,
}

/// Where to put the particle while applying the form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Not yet placed; follows the cursor
    Cursor(NVec2),
    /// Already placed; keep the current position
    Keep,
}

impl ParticleForm {
    /// Form showing the current state of a particle
    pub fn from_particle(sim: &Simulation, id: ParticleId) -> Option<Self> {
        let p = sim.get(id)?;
        let ctx = &sim.context;
        let height = (ctx.bounds.height - p.position.y) / ctx.scale - p.radius();
        Some(Self {
            restitution: p.restitution.to_string(),
            velocity_x: round_to_sig_fig(p.velocity.x, 3).to_string(),
            velocity_y: round_to_sig_fig(p.velocity.y, 3).to_string(),
            acceleration_x: p.acceleration.x.to_string(),
            acceleration_y: p.acceleration.y.to_string(),
            radius: round_to_sig_fig(p.radius(), 3).to_string(),
            mass: round_to_sig_fig(p.mass(), 3).to_string(),
            height: round_to_sig_fig(height, 3).to_string(),
            lock_height: false,
            random_velocity: p.has_random_velocity,
            draw_trace: p.trace.is_some(),
            material: p.material.clone(),
        })
    }

    /// Parse every numeric field; `None` if any of them is malformed
    pub fn parse(&self) -> Option<ParticleSettings> {
        let num = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        Some(ParticleSettings {
            restitution: num(&self.restitution)?,
            velocity: NVec2::new(num(&self.velocity_x)?, num(&self.velocity_y)?),
            acceleration: NVec2::new(num(&self.acceleration_x)?, num(&self.acceleration_y)?),
            radius: num(&self.radius)?,
            mass: num(&self.mass)?,
            height: num(&self.height)?,
            lock_height: self.lock_height,
            random_velocity: self.random_velocity,
            draw_trace: self.draw_trace,
            material: self.material.clone(),
        })
    }

    /// Apply the form to particle `id`, writing back any value that was
    /// corrected or derived. Returns `false` if nothing was applied
    /// (malformed field, unknown material or unknown particle).
    pub fn apply<R: Rng>(
        &mut self,
        sim: &mut Simulation,
        id: ParticleId,
        materials: &MaterialRegistry,
        placement: Placement,
        rng: &mut R,
    ) -> bool {
        let Some(settings) = self.parse() else {
            return false;
        };
        let Some(material) = materials.get(&settings.material) else {
            return false;
        };
        let (density, colour) = (material.density, material.colour);

        let scale = sim.context.scale;
        let floor = sim.context.bounds.height;
        let limits = sim.context.radius_limits();
        let Some(p) = sim.get_mut(id) else {
            return false;
        };

        p.colour = colour;

        // restitution is clamped into [0, 1] and the field corrected
        if settings.restitution > 1.0 {
            p.restitution = 1.0;
            self.restitution = "1".to_string();
        } else if settings.restitution < 0.0 {
            p.restitution = 0.0;
            self.restitution = "0".to_string();
        } else {
            p.restitution = settings.restitution;
        }

        // velocity: typed value, or a fresh random one when the flag turns on
        if !settings.random_velocity {
            p.velocity = settings.velocity;
            p.has_random_velocity = false;
        } else if !p.has_random_velocity {
            let upper = p.radius() * 5.0;
            let vx = round_to_sig_fig(rng.gen_range(-upper..=upper), 3);
            let vy = round_to_sig_fig(rng.gen_range(-upper..=upper), 3);
            p.velocity = NVec2::new(vx, vy);
            self.velocity_x = vx.to_string();
            self.velocity_y = vy.to_string();
            p.has_random_velocity = true;
        }

        match (settings.draw_trace, p.trace.is_some()) {
            (false, true) => p.trace = None,
            (true, false) => p.trace = Some(Trace::new(colour)),
            _ => {}
        }

        p.acceleration = settings.acceleration;

        if let Placement::Cursor(cursor) = placement {
            p.position = cursor;
        }
        if settings.lock_height {
            p.position.y = floor - (settings.height * scale).trunc() - p.radius() * scale;
        }

        // exactly one of radius or mass drives the size this update
        if density != p.density() {
            p.set_density(density, settings.radius);
            self.radius = p.radius().to_string();
            self.mass = p.mass().to_string();
        } else if settings.radius != p.radius() && limits.contains(settings.radius) {
            p.update_dimension(Dimension::Radius(settings.radius));
            self.mass = p.mass().to_string();
        } else if settings.mass != p.mass() && settings.mass > 0.0 {
            p.update_dimension(Dimension::Mass(settings.mass));
            self.radius = p.radius().to_string();
        }

        if p.clamp_radius(&limits) {
            self.radius = p.radius().to_string();
            self.mass = p.mass().to_string();
        }

        p.material = settings.material;
        sim.commit_edit(id);
        true
    }
}

impl Default for ParticleForm {
    fn default() -> Self {
        Self {
            restitution: "1".to_string(),
            velocity_x: "0".to_string(),
            velocity_y: "0".to_string(),
            acceleration_x: "0".to_string(),
            acceleration_y: "0".to_string(),
            radius: "1".to_string(),
            mass: "0".to_string(),
            height: "0".to_string(),
            lock_height: false,
            random_velocity: false,
            draw_trace: false,
            material: super::material::DEFAULT_MATERIAL.to_string(),
        }
    }
}
