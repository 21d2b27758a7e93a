//! Forward step for a single particle
//!
//! Explicit Euler in pixel space: velocity is in m/s, so the position update
//! is multiplied by the scale (px/m). `dt` is the signed, speed-scaled wall
//! clock time of the tick.

use super::history::{FrameIndex, SUBDIVISIONS};
use super::numeric::round_to_sig_fig;
use super::params::Bounds;
use super::particle::Particle;

/// Significant figures kept on a bounced velocity component
const BOUNCE_SIG_FIGS: i32 = 4;

/// Reflect the particle off any wall it touches while moving into it.
///
/// Axes are checked independently; within an axis the floor/right wall wins
/// over the ceiling/left wall. The velocity guard keeps a particle that was
/// clamped onto the wall last tick from bouncing again.
/// Returns `true` if any component was reflected.
pub fn bounce_off_walls(p: &mut Particle, bounds: &Bounds, scale: f64, dt: f64) -> bool {
    let r = p.scaled_radius(scale);
    let e = p.restitution;
    let mut bounced = false;

    // floor
    if p.position.y + r >= bounds.height && p.velocity.y * dt > 0.0 {
        p.velocity.y = round_to_sig_fig(p.velocity.y * e * -1.0, BOUNCE_SIG_FIGS);
        p.position.y = bounds.height - r;
        bounced = true;
    }
    // ceiling
    else if p.position.y - r <= 0.0 && p.velocity.y * dt < 0.0 {
        p.velocity.y = round_to_sig_fig(p.velocity.y * e * -1.0, BOUNCE_SIG_FIGS);
        p.position.y = r;
        bounced = true;
    }

    // right wall
    if p.position.x + r >= bounds.width && p.velocity.x * dt > 0.0 {
        p.velocity.x = round_to_sig_fig(p.velocity.x * e * -1.0, BOUNCE_SIG_FIGS);
        p.position.x = bounds.width - r;
        bounced = true;
    }
    // left wall
    else if p.position.x - r <= 0.0 && p.velocity.x * dt < 0.0 {
        p.velocity.x = round_to_sig_fig(p.velocity.x * e * -1.0, BOUNCE_SIG_FIGS);
        p.position.x = r;
        bounced = true;
    }

    bounced
}

/// v += a dt, x += v scale dt
pub fn integrate(p: &mut Particle, scale: f64, dt: f64) {
    p.velocity += p.acceleration * dt;
    p.position += p.velocity * scale * dt;
}

/// Record the current state at `frame`, first filling in the half frames
/// between the previous frame and this one.
///
/// `frame_step` is the forward step of this tick in quarter frames. Each
/// missing half frame `k` back is extrapolated at constant velocity as
/// `x - v * scale * dt * k`, so rewinding at half speed after faster play
/// still finds an entry at every half frame.
pub fn record_with_backfill(p: &mut Particle, frame: FrameIndex, frame_step: i64, scale: f64, dt: f64, t_now: f64) {
    let pos = p.position;
    let vel = p.velocity;
    let half = SUBDIVISIONS / 2;

    let mut back = half;
    while back < frame_step {
        let at = FrameIndex::from_quarters(frame.quarters() - back);
        if at.quarters() >= 0 && !p.history.contains(at) {
            let k = back as f64 / SUBDIVISIONS as f64;
            let mut s = p.snapshot(t_now);
            s.position = pos - vel * scale * dt * k;
            p.history.record(at, s);
        }
        back += half;
    }

    p.history.record(frame, p.snapshot(t_now));
}
