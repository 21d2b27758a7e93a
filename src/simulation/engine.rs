//! World step
//!
//! `SimulationContext` holds the session-wide state (scale, simulated time,
//! frame index, timescale) and `Simulation` owns every particle plus the
//! collision graph. One call to [`Simulation::tick`] is one frame of the
//! control loop:
//!
//! - forward rate: each particle either replays the frame from its history
//!   (already simulated once) or bounces, integrates and resolves collisions;
//!   the frame is recorded once every particle is done
//! - negative rate: each particle restores the recorded state for the target
//!   frame, or holds still if nothing was recorded there
//!
//! History entries are first-writer-wins and written after the whole frame
//! is resolved, so the order particles are visited in never changes what a
//! rewind plays back.

use bevy::log::debug;
use bevy::prelude::Resource;

use super::collision::{self, CollisionGraph};
use super::history::FrameIndex;
use super::integrator::{bounce_off_walls, integrate, record_with_backfill};
use super::material::{DEFAULT_COLOUR, DEFAULT_MATERIAL};
use super::params::{Bounds, RadiusLimits};
use super::particle::Particle;
use super::states::{NVec2, ParticleId, Rgb};
use super::timescale::{FrameClock, TimeController};

#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub scale: f64, // pixels per metre
    pub t_now: f64, // simulated seconds
    pub frame: FrameIndex, // current frame
    pub bounds: Bounds, // play area in pixels
    pub time: TimeController,
    pub clock: FrameClock,
}

impl SimulationContext {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            scale: bounds.default_scale(),
            t_now: 0.0,
            frame: FrameIndex::ZERO,
            bounds,
            time: TimeController::new(),
            clock: FrameClock::default(),
        }
    }

    pub fn radius_limits(&self) -> RadiusLimits {
        self.bounds.radius_limits(self.scale)
    }

    /// True until the first forward tick has been simulated
    pub fn at_start(&self) -> bool {
        self.frame == FrameIndex::ZERO && self.t_now <= 0.0
    }
}

/// What a call to [`Simulation::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    Rewound,
    /// Clock delta rejected, nothing changed
    Skipped,
    /// Rate is negative and simulated time is already back at zero
    RewindExhausted,
}

/// Initial values for a new particle
#[derive(Debug, Clone)]
pub struct NewParticle {
    pub centre: NVec2,
    pub velocity: NVec2,
    pub acceleration: NVec2,
    pub radius: f64,
    pub density: f64,
    pub restitution: f64,
    pub material: String,
    pub colour: Rgb,
}

impl Default for NewParticle {
    fn default() -> Self {
        Self {
            centre: NVec2::zeros(),
            velocity: NVec2::zeros(),
            acceleration: NVec2::zeros(),
            radius: 1.0,
            density: 1.0,
            restitution: 1.0,
            material: DEFAULT_MATERIAL.to_string(),
            colour: DEFAULT_COLOUR,
        }
    }
}

/// Bevy resource owning the whole sandbox
#[derive(Resource, Debug, Clone)]
pub struct Simulation {
    pub context: SimulationContext,
    particles: Vec<Particle>,
    graph: CollisionGraph,
    next_id: u64,
}

impl Simulation {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_context(SimulationContext::new(bounds))
    }

    pub fn with_context(context: SimulationContext) -> Self {
        Self {
            context,
            particles: Vec::new(),
            graph: CollisionGraph::new(),
            next_id: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.iter_mut().find(|p| p.id == id)
    }

    pub fn collision_graph(&self) -> &CollisionGraph {
        &self.graph
    }

    /// Allocate a fresh handle
    pub fn next_id(&mut self) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place a new particle; mass and volume come from radius and density
    pub fn spawn(&mut self, new: NewParticle) -> ParticleId {
        let id = self.next_id();
        let mut p = Particle::new(
            id,
            new.restitution,
            new.material,
            new.radius,
            new.density,
            new.velocity,
            new.colour,
            new.centre,
            new.acceleration,
            self.context.t_now,
        );
        if self.context.frame != FrameIndex::ZERO {
            p.restart_history(self.context.frame, self.context.t_now);
        }
        self.insert(p);
        id
    }

    /// Add an already built particle. Its id must come from [`Self::next_id`].
    pub fn insert(&mut self, p: Particle) {
        debug!("adding particle {:?} at {:?}", p.id, p.position);
        self.next_id = self.next_id.max(p.id.0 + 1);
        self.particles.push(p);
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let idx = self.particles.iter().position(|p| p.id == id)?;
        self.graph.remove_particle(id);
        debug!("removing particle {id:?}");
        Some(self.particles.remove(idx))
    }

    /// Drop every particle and rewind the session to its start
    pub fn clear(&mut self) {
        debug!("clearing {} particles", self.particles.len());
        self.particles.clear();
        self.graph.clear();
        self.context.t_now = 0.0;
        self.context.frame = FrameIndex::ZERO;
    }

    /// Topmost particle drawn under a screen point
    pub fn particle_at(&self, point: &NVec2) -> Option<ParticleId> {
        self.particles
            .iter()
            .rev()
            .find(|p| p.contains_point(point, self.context.scale))
            .map(|p| p.id)
    }

    /// Change the zoom, moving particles so they keep their place relative
    /// to `anchor_x` (usually the cursor) and to the floor.
    ///
    /// History is stored in pixels, so zooming is only possible before the
    /// first tick; later calls are ignored and return `false`.
    pub fn rescale(&mut self, new_scale: f64, anchor_x: f64) -> bool {
        let old = self.context.scale;
        if new_scale <= 0.0 || !new_scale.is_finite() || new_scale == old {
            return false;
        }
        if !self.context.at_start() {
            debug!("ignoring zoom after the simulation has started");
            return false;
        }
        let ratio = new_scale / old;
        let floor = self.context.bounds.height;
        let t_now = self.context.t_now;
        for p in self.particles.iter_mut() {
            p.position.x = anchor_x - (anchor_x - p.position.x) * ratio;
            p.position.y = floor - (floor - p.position.y) * ratio;
            p.restart_history(FrameIndex::ZERO, t_now);
        }
        self.context.scale = new_scale;
        true
    }

    /// Re-record a particle's creation state after the editor changed it.
    /// Only has an effect before the first tick.
    pub fn commit_edit(&mut self, id: ParticleId) {
        if !self.context.at_start() {
            return;
        }
        let t_now = self.context.t_now;
        if let Some(p) = self.get_mut(id) {
            p.restart_history(FrameIndex::ZERO, t_now);
        }
    }

    /// Prepare to leave pause. A rewind that already reached the start
    /// would stop again immediately, so the timescale goes back to its
    /// starting entry. Returns `true` if it was reset.
    pub fn resume(&mut self) -> bool {
        if self.context.time.rewind_exhausted(self.context.t_now) {
            self.context.time.reset();
            return true;
        }
        false
    }

    /// Advance one frame using `wall_dt` seconds of real time
    pub fn tick(&mut self, wall_dt: f64) -> TickOutcome {
        let Some(elapsed) = self.context.clock.accept(wall_dt) else {
            return TickOutcome::Skipped;
        };
        if self.context.time.rewind_exhausted(self.context.t_now) {
            return TickOutcome::RewindExhausted;
        }

        let dt = self.context.time.effective_dt(elapsed);
        self.context.frame = self.context.time.advance(self.context.frame);

        if self.context.time.is_rewinding() {
            self.rewind_step();
            TickOutcome::Rewound
        } else {
            self.forward_step(dt);
            TickOutcome::Advanced
        }
    }

    /// Restore every particle to its recorded state at the current frame
    fn rewind_step(&mut self) {
        let frame = self.context.frame;
        for p in self.particles.iter_mut() {
            if let Some(s) = p.history.get(frame).copied() {
                p.restore(&s);
                self.context.t_now = s.time;
            }
        }
    }

    fn forward_step(&mut self, dt: f64) {
        let frame = self.context.frame;
        let step = self.context.time.frame_step();
        let scale = self.context.scale;
        let bounds = self.context.bounds;
        let t_end = self.context.t_now + dt;
        let mut replayed_time = None;
        let mut fresh = Vec::new();

        // cached particles first; fresh ones collide against their restored state
        for i in 0..self.particles.len() {
            match self.particles[i].history.get(frame).copied() {
                Some(s) => {
                    self.particles[i].restore(&s);
                    replayed_time = Some(s.time);
                }
                None => fresh.push(i),
            }
        }
        for i in fresh {
            self.simulate_particle(i, &bounds, scale, dt);
        }

        // collisions may have changed particles visited earlier
        for p in self.particles.iter_mut() {
            record_with_backfill(p, frame, step, scale, dt, t_end);
        }

        self.context.t_now = replayed_time.unwrap_or(t_end);
    }

    /// Walls, integration, then pairwise collisions for `particles[i]`
    fn simulate_particle(&mut self, i: usize, bounds: &Bounds, scale: f64, dt: f64) {
        bounce_off_walls(&mut self.particles[i], bounds, scale, dt);
        integrate(&mut self.particles[i], scale, dt);

        let id = self.particles[i].id;
        let hits = collision::overlapping(&self.particles, i, scale);
        let hit_ids: Vec<ParticleId> = hits.iter().map(|&j| self.particles[j].id).collect();

        for (&j, &other) in hits.iter().zip(hit_ids.iter()) {
            if !self.graph.contains(id, other) && collision::collide(&mut self.particles, i, j) {
                self.graph.insert(id, other);
            }
        }
        self.graph.release_separated(id, &hit_ids);

        self.particles[i].push_trace_point();
    }
}
