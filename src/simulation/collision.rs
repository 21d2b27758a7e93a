//! Pairwise collision detection and elastic response
//!
//! The "recently collided" relation is kept as a set of unordered pairs so it
//! is symmetric by construction. A pair enters the set when its collision is
//! resolved and leaves it on the first forward frame where the two circles no
//! longer overlap; while it is in the set the response is not applied again.

use std::collections::HashSet;

use bevy::log::warn;

use super::particle::Particle;
use super::states::{NVec2, ParticleId};

/// Unordered particle pair, stored smallest id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair(ParticleId, ParticleId);

impl Pair {
    pub fn new(a: ParticleId, b: ParticleId) -> Self {
        if a <= b { Pair(a, b) } else { Pair(b, a) }
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.0 == id || self.1 == id
    }

    pub fn other(&self, id: ParticleId) -> Option<ParticleId> {
        if self.0 == id {
            Some(self.1)
        } else if self.1 == id {
            Some(self.0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionGraph {
    pairs: HashSet<Pair>,
}

impl CollisionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: ParticleId, b: ParticleId) {
        self.pairs.insert(Pair::new(a, b));
    }

    pub fn contains(&self, a: ParticleId, b: ParticleId) -> bool {
        self.pairs.contains(&Pair::new(a, b))
    }

    /// Partners currently recorded for `id`
    pub fn partners(&self, id: ParticleId) -> Vec<ParticleId> {
        self.pairs.iter().filter_map(|p| p.other(id)).collect()
    }

    /// Forget every pair of `id` whose partner is not in `overlapping`
    pub fn release_separated(&mut self, id: ParticleId, overlapping: &[ParticleId]) {
        self.pairs
            .retain(|p| match p.other(id) {
                Some(other) => overlapping.contains(&other),
                None => true,
            });
    }

    /// Remove every pair involving `id` (particle deleted)
    pub fn remove_particle(&mut self, id: ParticleId) {
        self.pairs.retain(|p| !p.contains(id));
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Whether two circles touch or overlap at the given scale
pub fn overlaps(a: &Particle, b: &Particle, scale: f64) -> bool {
    let total = a.scaled_radius(scale) + b.scaled_radius(scale);
    (a.position - b.position).norm() <= total
}

/// Indices of every particle overlapping `particles[i]`
pub fn overlapping(particles: &[Particle], i: usize, scale: f64) -> Vec<usize> {
    let p = &particles[i];
    particles
        .iter()
        .enumerate()
        .filter(|(j, other)| *j != i && overlaps(p, other, scale))
        .map(|(j, _)| j)
        .collect()
}

/// Post-collision velocities of a 2d elastic collision between two discs,
/// ignoring rotation. `None` when the centres coincide, since the collision
/// normal is undefined there.
pub fn elastic_response(
    m1: f64,
    v1: NVec2,
    p1: NVec2,
    m2: f64,
    v2: NVec2,
    p2: NVec2,
) -> Option<(NVec2, NVec2)> {
    let d = p1 - p2;
    let d2 = d.norm_squared();
    if d2 == 0.0 {
        return None;
    }
    let total = m1 + m2;

    // v1' = v1 - 2 m2/(m1+m2) * <v1-v2, p1-p2>/|p1-p2|^2 * (p1-p2)
    let v1_new = v1 - (2.0 * m2 / total) * ((v1 - v2).dot(&d) / d2) * d;
    // v2' = v2 - 2 m1/(m1+m2) * <v2-v1, p2-p1>/|p2-p1|^2 * (p2-p1)
    let v2_new = v2 - (2.0 * m1 / total) * ((v2 - v1).dot(&-d) / d2) * -d;

    Some((v1_new, v2_new))
}

/// Apply the elastic response to `particles[i]` and `particles[j]`.
/// Returns `false` (and leaves both untouched) for coincident centres.
pub fn collide(particles: &mut [Particle], i: usize, j: usize) -> bool {
    let (a, b) = pair_mut(particles, i, j);
    match elastic_response(a.mass, a.velocity, a.position, b.mass, b.velocity, b.position) {
        Some((va, vb)) => {
            a.velocity = va;
            b.velocity = vb;
            true
        }
        None => {
            if cfg!(debug_assertions) {
                warn!("particles {:?} and {:?} share a centre, collision skipped", a.id, b.id);
            }
            false
        }
    }
}

/// Two distinct mutable borrows into one slice
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    assert_ne!(i, j, "a particle cannot collide with itself");
    if i < j {
        let (lo, hi) = particles.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = particles.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}
