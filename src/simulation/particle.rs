//! Particle entity
//!
//! A particle owns its physical state, its timeline and an optional trace.
//! Radius, mass, density and volume are tied together by
//! `mass = density * (4/3) * pi * r^3`; whichever of radius or mass is set
//! explicitly is authoritative and the other is derived and rounded to three
//! significant figures.

use std::f64::consts::PI;

use super::history::{FrameIndex, History};
use super::numeric::round_to_sig_fig;
use super::params::RadiusLimits;
use super::states::{NVec2, ParticleId, Rgb, Snapshot};

/// Which of radius or mass drives a dimension update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Radius(f64),
    Mass(f64),
}

/// Screen-space path drawn behind a particle
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub points: Vec<NVec2>,
    pub colour: Rgb,
}

impl Trace {
    pub fn new(colour: Rgb) -> Self {
        Self { points: Vec::new(), colour }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub id: ParticleId,
    pub position: NVec2, // pixel space, centre
    pub velocity: NVec2, // m/s
    pub acceleration: NVec2, // m/s^2
    pub restitution: f64, // 0..=1
    pub material: String,
    pub colour: Rgb,
    pub has_random_velocity: bool,
    pub trace: Option<Trace>,
    pub(crate) radius: f64, // m
    pub(crate) mass: f64, // kg
    pub(crate) density: f64, // kg/m^3
    pub(crate) volume: f64, // m^3
    pub(crate) history: History,
}

impl Particle {
    /// Build a particle from its radius; mass and volume are derived.
    /// The creation state is recorded at frame 0 with time `t_now`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ParticleId,
        restitution: f64,
        material: impl Into<String>,
        radius: f64,
        density: f64,
        velocity: NVec2,
        colour: Rgb,
        centre: NVec2,
        acceleration: NVec2,
        t_now: f64,
    ) -> Self {
        let mut p = Self {
            id,
            position: centre,
            velocity,
            acceleration,
            restitution: restitution.clamp(0.0, 1.0),
            material: material.into(),
            colour,
            has_random_velocity: false,
            trace: None,
            radius,
            mass: 0.0,
            density,
            volume: 0.0,
            history: History::new(),
        };
        p.update_dimension(Dimension::Radius(radius));
        p.history.record(FrameIndex::ZERO, p.snapshot(t_now));
        p
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Radius in pixels at the given scale
    pub fn scaled_radius(&self, scale: f64) -> f64 {
        self.radius * scale
    }

    /// Direction of travel in radians, measured anticlockwise on screen
    pub fn direction(&self) -> f64 {
        -self.velocity.y.atan2(self.velocity.x)
    }

    pub fn momentum(&self) -> NVec2 {
        self.mass * self.velocity
    }

    pub fn snapshot(&self, time: f64) -> Snapshot {
        Snapshot {
            position: self.position,
            velocity: self.velocity,
            time,
        }
    }

    /// Restore position and velocity verbatim from a snapshot
    pub fn restore(&mut self, s: &Snapshot) {
        self.position = s.position;
        self.velocity = s.velocity;
    }

    /// Re-derive the dependent quantities from radius or mass
    pub fn update_dimension(&mut self, dim: Dimension) {
        match dim {
            Dimension::Radius(r) => {
                self.radius = r;
                self.volume = sphere_volume(r);
                self.mass = round_to_sig_fig(self.volume * self.density, 3);
            }
            Dimension::Mass(m) => {
                self.mass = m;
                self.volume = m / self.density;
                let r = ((3.0 * self.volume) / (4.0 * PI)).cbrt();
                self.radius = round_to_sig_fig(r, 3);
            }
        }
    }

    /// Change the density (material switch) keeping `radius` authoritative
    pub fn set_density(&mut self, density: f64, radius: f64) {
        self.density = density;
        self.update_dimension(Dimension::Radius(radius));
    }

    /// Pull the radius back into range, re-deriving mass if it moved.
    /// Returns `true` when the radius was changed.
    pub fn clamp_radius(&mut self, limits: &RadiusLimits) -> bool {
        if self.radius > limits.max {
            self.update_dimension(Dimension::Radius(limits.max));
            true
        } else if self.radius < limits.min {
            self.update_dimension(Dimension::Radius(limits.min));
            true
        } else {
            false
        }
    }

    /// Overwrite the derived quantities verbatim (scenario load)
    pub(crate) fn set_dimensions_raw(&mut self, radius: f64, density: f64, mass: f64, volume: f64) {
        self.radius = radius;
        self.density = density;
        self.mass = mass;
        self.volume = volume;
    }

    /// Whether the point lies inside the drawn circle
    pub fn contains_point(&self, point: &NVec2, scale: f64) -> bool {
        (self.position - point).norm() <= self.scaled_radius(scale)
    }

    /// Forget the timeline and record the current state as the creation
    /// state at `frame`
    pub(crate) fn restart_history(&mut self, frame: FrameIndex, t_now: f64) {
        let s = self.snapshot(t_now);
        self.history.reset(frame, s);
    }

    pub(crate) fn push_trace_point(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.points.push(self.position);
        }
    }
}

/// (4/3) * pi * r^3
pub fn sphere_volume(radius: f64) -> f64 {
    (4.0 / 3.0) * PI * radius.powi(3)
}
