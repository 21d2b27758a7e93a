use circlesim::simulation::collision::CollisionGraph;
use circlesim::simulation::integrator::bounce_off_walls;
use circlesim::{
    custom_materials, distance, elastic_response, export_scenario, load_materials, render_simulation,
    round_to_sig_fig, save_materials, Bounds, Dimension, DrawList,
    EngineConfig, FrameClock, FrameIndex, History, MaterialRegistry, NVec2, NewParticle, ParticleForm, ParticleId,
    Placement, Rgb, Scenario, ScenarioConfig, Simulation, Snapshot, TickOutcome, TimeController, DEFAULT_MATERIAL,
};

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::path::PathBuf;

const DT: f64 = 1.0 / 60.0;

/// 1920x1080 sandbox at the default scale of 100 px/m
pub fn sandbox() -> Simulation {
    Simulation::new(Bounds::new(1920.0, 1080.0))
}

/// Add a particle with density 1000 kg/m^3
pub fn ball(sim: &mut Simulation, centre: [f64; 2], v: [f64; 2], a: [f64; 2], radius: f64) -> ParticleId {
    sim.spawn(NewParticle {
        centre: NVec2::new(centre[0], centre[1]),
        velocity: NVec2::new(v[0], v[1]),
        acceleration: NVec2::new(a[0], a[1]),
        radius,
        density: 1000.0,
        restitution: 1.0,
        ..Default::default()
    })
}

/// Move the controller to `index` in the default timescale table
pub fn set_timescale(sim: &mut Simulation, index: usize) {
    while sim.context.time.index() < index {
        sim.context.time.speed_up();
    }
    while sim.context.time.index() > index {
        sim.context.time.slow_down();
    }
}

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

// ==================================================================================
// Numeric tests
// ==================================================================================

#[test]
fn sig_fig_rounding() {
    assert_eq!(round_to_sig_fig(123456.0, 3), 123000.0);
    assert!(approx(round_to_sig_fig(0.0012345, 3), 0.00123, 1e-15));
    assert!(approx(round_to_sig_fig(-3.14159, 4), -3.142, 1e-12));
    assert_eq!(round_to_sig_fig(0.0, 3), 0.0);
}

#[test]
fn sig_fig_rounding_of_subnormals() {
    let tiny = f64::from_bits(1); // smallest subnormal
    assert_eq!(round_to_sig_fig(tiny, 3), tiny);

    let r = round_to_sig_fig(1.234e-320, 2);
    assert!(r.is_finite());
    assert!(approx(r / 1.2e-320, 1.0, 1e-2), "got {r:e}");
}

#[test]
fn distance_is_euclidean() {
    let a = NVec2::new(0.0, 0.0);
    let b = NVec2::new(3.0, 4.0);
    assert_eq!(distance(&a, &b), 5.0);
}

// ==================================================================================
// Particle dimension tests
// ==================================================================================

#[test]
fn mass_follows_radius() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [500.0, 500.0], [0.0, 0.0], [0.0, 0.0], 0.5);
    let p = sim.get(id).unwrap();

    // (4/3) pi 0.5^3 * 1000 = 523.6 -> 524
    assert_eq!(p.mass(), 524.0);
    assert!(approx(p.volume(), 0.523_598_775, 1e-8));
}

#[test]
fn radius_mass_round_trip() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [500.0, 500.0], [0.0, 0.0], [0.0, 0.0], 0.73);
    let p = sim.get_mut(id).unwrap();

    let mass = p.mass();
    p.update_dimension(Dimension::Mass(mass));

    // both directions round to 3 significant figures
    assert!(approx(p.radius(), 0.73, 0.005), "radius drifted to {}", p.radius());
}

#[test]
fn radius_clamped_to_limits() {
    let mut sim = sandbox();
    let limits = sim.context.radius_limits();
    assert_eq!(limits.min, 0.1);
    assert_eq!(limits.max, 4.8);

    let id = ball(&mut sim, [500.0, 500.0], [0.0, 0.0], [0.0, 0.0], 10.0);
    let p = sim.get_mut(id).unwrap();
    assert!(p.clamp_radius(&limits));
    assert_eq!(p.radius(), 4.8);
    assert!(!p.clamp_radius(&limits));
}

// ==================================================================================
// Integration and wall tests
// ==================================================================================

#[test]
fn free_flight_step_is_exact() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [960.0, 400.0], [1.0, 2.0], [0.0, 9.81], 0.2);
    let x0 = sim.get(id).unwrap().position;
    let v0 = sim.get(id).unwrap().velocity;
    let a = NVec2::new(0.0, 9.81);

    assert_eq!(sim.tick(DT), TickOutcome::Advanced);

    let v1 = v0 + a * DT;
    let x1 = x0 + v1 * 100.0 * DT;
    let p = sim.get(id).unwrap();
    assert!((p.velocity - v1).norm() < 1e-12);
    assert!((p.position - x1).norm() < 1e-9);
    assert!(approx(sim.context.t_now, DT, 1e-15));
}

#[test]
fn floor_bounce_scales_by_restitution() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [960.0, 1080.0 - 50.0], [0.0, 4.321], [0.0, 0.0], 0.5);
    let bounds = sim.context.bounds;
    let p = sim.get_mut(id).unwrap();
    p.restitution = 0.73;

    assert!(bounce_off_walls(p, &bounds, 100.0, DT));
    // 4.321 * 0.73 = 3.15433 -> 3.154
    assert_eq!(p.velocity.y, -3.154);
    assert_eq!(p.position.y, 1080.0 - 50.0);

    // still touching the floor but moving away: no second bounce
    assert!(!bounce_off_walls(p, &bounds, 100.0, DT));
    assert_eq!(p.velocity.y, -3.154);
}

#[test]
fn side_walls_and_ceiling_reflect() {
    let mut sim = sandbox();
    let bounds = sim.context.bounds;
    let left = ball(&mut sim, [10.0, 500.0], [-2.0, 0.0], [0.0, 0.0], 0.5);
    let right = ball(&mut sim, [1915.0, 500.0], [2.0, 0.0], [0.0, 0.0], 0.5);
    let top = ball(&mut sim, [900.0, 5.0], [0.0, -1.0], [0.0, 0.0], 0.5);

    for id in [left, right, top] {
        assert!(bounce_off_walls(sim.get_mut(id).unwrap(), &bounds, 100.0, DT));
    }
    assert_eq!(sim.get(left).unwrap().velocity.x, 2.0);
    assert_eq!(sim.get(left).unwrap().position.x, 50.0);
    assert_eq!(sim.get(right).unwrap().velocity.x, -2.0);
    assert_eq!(sim.get(right).unwrap().position.x, 1920.0 - 50.0);
    assert_eq!(sim.get(top).unwrap().velocity.y, 1.0);
    assert_eq!(sim.get(top).unwrap().position.y, 50.0);
}

#[test]
fn falling_ball_never_leaves_the_floor() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [960.0, 900.0], [0.0, 0.0], [0.0, 9.81], 0.5);
    sim.get_mut(id).unwrap().restitution = 0.8;

    for _ in 0..600 {
        sim.tick(DT);
        let p = sim.get(id).unwrap();
        // one tick of travel past the clamp is allowed
        assert!(p.position.y <= 1080.0 - 50.0 + p.velocity.y.abs() * 100.0 * DT + 1e-9);
    }
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn equal_masses_exchange_velocities() {
    let (v1, v2) = elastic_response(
        2.0,
        NVec2::new(2.0, 0.0),
        NVec2::new(500.0, 500.0),
        2.0,
        NVec2::new(-2.0, 0.0),
        NVec2::new(599.0, 500.0),
    )
    .unwrap();

    assert!((v1 - NVec2::new(-2.0, 0.0)).norm() < 1e-12);
    assert!((v2 - NVec2::new(2.0, 0.0)).norm() < 1e-12);
}

#[test]
fn collision_conserves_momentum_and_energy() {
    let (m1, m2) = (2.0, 5.0);
    let (u1, u2) = (NVec2::new(3.0, -1.0), NVec2::new(-0.5, 2.0));
    let (p1, p2) = (NVec2::new(100.0, 100.0), NVec2::new(130.0, 120.0));

    let (v1, v2) = elastic_response(m1, u1, p1, m2, u2, p2).unwrap();

    let before = m1 * u1 + m2 * u2;
    let after = m1 * v1 + m2 * v2;
    assert!((before - after).norm() < 1e-9, "momentum changed: {before:?} -> {after:?}");

    let ke = |a: NVec2, b: NVec2| 0.5 * m1 * a.norm_squared() + 0.5 * m2 * b.norm_squared();
    assert!(approx(ke(u1, u2), ke(v1, v2), 1e-9));
}

#[test]
fn coincident_centres_are_skipped() {
    let p = NVec2::new(10.0, 10.0);
    assert!(elastic_response(1.0, NVec2::new(1.0, 0.0), p, 1.0, NVec2::zeros(), p).is_none());

    let mut sim = sandbox();
    let a = ball(&mut sim, [500.0, 500.0], [0.0, 0.0], [0.0, 0.0], 0.5);
    let b = ball(&mut sim, [500.0, 500.0], [0.0, 0.0], [0.0, 0.0], 0.5);
    sim.tick(DT);

    assert_eq!(sim.get(a).unwrap().velocity, NVec2::zeros());
    assert_eq!(sim.get(b).unwrap().velocity, NVec2::zeros());
    assert!(sim.collision_graph().is_empty());
}

#[test]
fn head_on_collision_resolves_once() {
    let mut sim = sandbox();
    let a = ball(&mut sim, [500.0, 500.0], [2.0, 0.0], [0.0, 0.0], 0.5);
    let b = ball(&mut sim, [599.0, 500.0], [-2.0, 0.0], [0.0, 0.0], 0.5);

    sim.tick(DT);
    assert!((sim.get(a).unwrap().velocity - NVec2::new(-2.0, 0.0)).norm() < 1e-9);
    assert!((sim.get(b).unwrap().velocity - NVec2::new(2.0, 0.0)).norm() < 1e-9);
    assert!(sim.collision_graph().contains(b, a), "pair should be marked as recently collided");

    // separating: no second response, and the pair is released
    sim.tick(DT);
    assert!((sim.get(a).unwrap().velocity - NVec2::new(-2.0, 0.0)).norm() < 1e-9);
    assert!((sim.get(b).unwrap().velocity - NVec2::new(2.0, 0.0)).norm() < 1e-9);
    assert!(sim.collision_graph().is_empty());
}

#[test]
fn collision_graph_is_symmetric() {
    let (a, b, c) = (ParticleId(1), ParticleId(2), ParticleId(3));
    let mut g = CollisionGraph::new();
    g.insert(b, a);
    g.insert(a, c);

    assert!(g.contains(a, b) && g.contains(b, a));
    let mut partners = g.partners(a);
    partners.sort();
    assert_eq!(partners, vec![b, c]);

    // a still overlaps c only
    g.release_separated(a, &[c]);
    assert!(!g.contains(a, b));
    assert!(g.contains(c, a));

    g.remove_particle(c);
    assert!(g.is_empty());
}

// ==================================================================================
// History tests
// ==================================================================================

#[test]
fn history_is_write_once() {
    let first = Snapshot { position: NVec2::new(1.0, 2.0), velocity: NVec2::zeros(), time: 0.5 };
    let second = Snapshot { position: NVec2::new(9.0, 9.0), velocity: NVec2::zeros(), time: 0.7 };
    let frame = FrameIndex::from_frames(2.5);

    let mut h = History::new();
    assert!(h.record(frame, first));
    assert!(!h.record(frame, second));
    assert_eq!(h.get(frame), Some(&first));
}

#[test]
fn frame_index_uses_quarter_steps() {
    assert_eq!(FrameIndex::from_frames(1.5).quarters(), 6);
    assert_eq!(FrameIndex::from_frames(0.25).quarters(), 1);
    assert_eq!(FrameIndex::from_frames(3.0).as_frames(), 3.0);
    assert_eq!(FrameIndex::from_frames(1.0).offset(-8), FrameIndex::ZERO);
}

// ==================================================================================
// Time controller tests
// ==================================================================================

#[test]
fn timescale_stays_in_bounds() {
    let mut t = TimeController::new();
    assert_eq!(t.multiplier(), 1.0);

    for _ in 0..10 {
        t.speed_up();
    }
    assert_eq!(t.index(), 5);
    assert_eq!(t.multiplier(), 2.0);
    assert!(!t.speed_up());

    for _ in 0..10 {
        t.slow_down();
    }
    assert_eq!(t.index(), 0);
    assert_eq!(t.multiplier(), -2.0);
    assert!(!t.slow_down());
}

#[test]
fn timescale_scales_dt_and_frames() {
    let mut t = TimeController::new();
    t.slow_down();
    t.slow_down();
    assert_eq!(t.multiplier(), -0.5);
    assert_eq!(t.effective_dt(0.02), -0.01);
    assert_eq!(t.frame_step(), -2);
    assert!(t.rewind_exhausted(0.0));
    assert!(!t.rewind_exhausted(1.0));
}

#[test]
fn clock_skips_long_gaps() {
    let clock = FrameClock::default();
    assert_eq!(clock.accept(0.016), Some(0.016));
    assert_eq!(clock.accept(0.25), None);

    let mut sim = sandbox();
    ball(&mut sim, [500.0, 500.0], [1.0, 0.0], [0.0, 0.0], 0.5);
    assert_eq!(sim.tick(0.5), TickOutcome::Skipped);
    assert_eq!(sim.context.frame, FrameIndex::ZERO);
}

// ==================================================================================
// Time travel tests
// ==================================================================================

/// Two balls under gravity that hit each other and the floor
fn busy_sandbox() -> (Simulation, ParticleId, ParticleId) {
    let mut sim = sandbox();
    let a = ball(&mut sim, [400.0, 800.0], [3.0, 0.0], [0.0, 9.81], 0.5);
    let b = ball(&mut sim, [700.0, 780.0], [-3.0, -1.0], [0.0, 9.81], 0.6);
    sim.get_mut(a).unwrap().restitution = 0.8;
    (sim, a, b)
}

#[test]
fn full_rewind_restores_initial_state() {
    let (mut sim, a, b) = busy_sandbox();
    let start_a = *sim.get(a).unwrap().history().get(FrameIndex::ZERO).unwrap();
    let start_b = *sim.get(b).unwrap().history().get(FrameIndex::ZERO).unwrap();

    for _ in 0..120 {
        sim.tick(DT);
    }
    assert_eq!(sim.context.frame, FrameIndex::from_frames(120.0));

    set_timescale(&mut sim, 1);
    let mut ticks = 0;
    while sim.tick(DT) != TickOutcome::RewindExhausted {
        ticks += 1;
        assert!(ticks <= 200, "rewind never reached the start");
    }

    assert_eq!(ticks, 120);
    assert_eq!(sim.context.frame, FrameIndex::ZERO);
    assert_eq!(sim.context.t_now, 0.0);
    assert_eq!(sim.get(a).unwrap().position, start_a.position);
    assert_eq!(sim.get(a).unwrap().velocity, start_a.velocity);
    assert_eq!(sim.get(b).unwrap().position, start_b.position);
}

#[test]
fn replaying_a_frame_is_idempotent() {
    let (mut sim, a, _) = busy_sandbox();
    for _ in 0..40 {
        sim.tick(DT);
    }
    let at = FrameIndex::from_frames(21.0);
    let recorded = *sim.get(a).unwrap().history().get(at).unwrap();

    for _ in 0..3 {
        // back to frame 20, then forward over frame 21 from the cache
        set_timescale(&mut sim, 1);
        while sim.context.frame > FrameIndex::from_frames(20.0) {
            sim.tick(DT);
        }
        set_timescale(&mut sim, 4);
        sim.tick(DT);

        let p = sim.get(a).unwrap();
        assert_eq!(sim.context.frame, at);
        assert_eq!(p.position, recorded.position);
        assert_eq!(p.velocity, recorded.velocity);
        assert_eq!(sim.context.t_now, recorded.time);
    }
}

#[test]
fn fast_forward_backfills_half_frames() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [500.0, 500.0], [1.0, 0.0], [0.0, 0.0], 0.5);
    set_timescale(&mut sim, 5);
    sim.tick(DT);

    let h = sim.get(id).unwrap().history();
    for f in [0.5, 1.0, 1.5, 2.0] {
        assert!(h.contains(FrameIndex::from_frames(f)), "missing frame {f}");
    }

    // constant-velocity extrapolation, one frame back
    let dt = DT * 2.0;
    let now = h.get(FrameIndex::from_frames(2.0)).unwrap().position;
    let one_back = h.get(FrameIndex::from_frames(1.0)).unwrap().position;
    assert!((one_back - (now - NVec2::new(1.0, 0.0) * 100.0 * dt)).norm() < 1e-9);
}

#[test]
fn half_speed_rewind_after_normal_play() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [500.0, 500.0], [1.0, 0.5], [0.0, 0.0], 0.5);
    for _ in 0..4 {
        sim.tick(DT);
    }

    set_timescale(&mut sim, 2);
    assert_eq!(sim.tick(DT), TickOutcome::Rewound);
    let at = FrameIndex::from_frames(3.5);
    assert_eq!(sim.context.frame, at);
    let expected = *sim.get(id).unwrap().history().get(at).unwrap();
    assert_eq!(sim.get(id).unwrap().position, expected.position);
}

#[test]
fn rewind_without_history_holds_position() {
    let mut sim = sandbox();
    ball(&mut sim, [500.0, 500.0], [1.0, 0.0], [0.0, 0.0], 0.5);
    for _ in 0..4 {
        sim.tick(DT);
    }
    // placed at frame 4, so it has nothing recorded before that
    let late = ball(&mut sim, [1200.0, 300.0], [0.0, 0.0], [0.0, 0.0], 0.5);
    let before = sim.get(late).unwrap().position;

    set_timescale(&mut sim, 1);
    sim.tick(DT);
    assert_eq!(sim.get(late).unwrap().position, before);
}

#[test]
fn rewinding_at_start_is_exhausted() {
    let mut sim = sandbox();
    ball(&mut sim, [500.0, 500.0], [1.0, 0.0], [0.0, 0.0], 0.5);
    set_timescale(&mut sim, 0);
    assert_eq!(sim.tick(DT), TickOutcome::RewindExhausted);
    assert_eq!(sim.context.frame, FrameIndex::ZERO);
}

/// Resting ball with the lower id, struck by a later one on the first tick
fn struck_from_behind() -> (Simulation, ParticleId, ParticleId) {
    let mut sim = sandbox();
    let a = ball(&mut sim, [500.0, 500.0], [0.0, 0.0], [0.0, 0.0], 0.5);
    let b = ball(&mut sim, [602.0, 500.0], [-2.0, 0.0], [0.0, 0.0], 0.5);
    (sim, a, b)
}

fn total_momentum(sim: &Simulation) -> NVec2 {
    sim.particles().iter().fold(NVec2::zeros(), |acc, p| acc + p.momentum())
}

#[test]
fn collision_frame_is_recorded_after_resolution() {
    let (mut sim, a, _) = struck_from_behind();
    sim.tick(DT);

    // `a` was visited before `b` hit it; its cached frame must still hold the hit
    let live = sim.get(a).unwrap().velocity;
    let cached = sim.get(a).unwrap().history().get(FrameIndex::from_frames(1.0)).unwrap().velocity;
    assert!((live - NVec2::new(-2.0, 0.0)).norm() < 1e-9);
    assert_eq!(cached, live);
}

#[test]
fn replaying_a_collision_keeps_momentum() {
    let (mut control, ca, cb) = struck_from_behind();
    control.tick(DT);
    control.tick(DT);

    let (mut sim, a, b) = struck_from_behind();
    sim.tick(DT);
    set_timescale(&mut sim, 1);
    assert_eq!(sim.tick(DT), TickOutcome::Rewound);
    set_timescale(&mut sim, 4);
    sim.tick(DT);
    sim.tick(DT);

    assert_eq!(sim.get(a).unwrap().velocity, control.get(ca).unwrap().velocity);
    assert_eq!(sim.get(b).unwrap().velocity, control.get(cb).unwrap().velocity);
    assert_eq!(sim.get(a).unwrap().position, control.get(ca).unwrap().position);
    assert!((total_momentum(&sim) - total_momentum(&control)).norm() < 1e-9);
    assert!((total_momentum(&sim) - NVec2::new(-1048.0, 0.0)).norm() < 1e-6);
}

#[test]
fn resume_after_full_rewind_plays_forward() {
    let mut sim = sandbox();
    ball(&mut sim, [500.0, 500.0], [1.0, 0.0], [0.0, 0.0], 0.5);
    for _ in 0..5 {
        sim.tick(DT);
    }
    set_timescale(&mut sim, 1);
    let mut ticks = 0;
    while sim.tick(DT) != TickOutcome::RewindExhausted {
        ticks += 1;
        assert!(ticks <= 10, "rewind never reached the start");
    }

    assert!(sim.resume());
    assert_eq!(sim.context.time.multiplier(), 1.0);
    assert_eq!(sim.tick(DT), TickOutcome::Advanced);

    // away from the start the selected rate is kept
    set_timescale(&mut sim, 2);
    assert!(!sim.resume());
    assert_eq!(sim.context.time.multiplier(), -0.5);
}

// ==================================================================================
// Editor tests
// ==================================================================================

fn form_for(sim: &Simulation, id: ParticleId) -> ParticleForm {
    ParticleForm::from_particle(sim, id).unwrap()
}

#[test]
fn malformed_field_leaves_particle_unchanged() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = ball(&mut sim, [500.0, 500.0], [1.0, 0.0], [0.0, 0.0], 0.5);

    let mut form = form_for(&sim, id);
    form.velocity_x = "fast".into();
    form.acceleration_y = "9.81".into();

    assert!(!form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng));
    let p = sim.get(id).unwrap();
    assert_eq!(p.velocity, NVec2::new(1.0, 0.0));
    assert_eq!(p.acceleration, NVec2::zeros());
}

#[test]
fn restitution_is_clamped_and_written_back() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = sim.spawn(NewParticle { centre: NVec2::new(500.0, 500.0), ..Default::default() });

    let mut form = form_for(&sim, id);
    form.restitution = "1.7".into();
    assert!(form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng));
    assert_eq!(sim.get(id).unwrap().restitution, 1.0);
    assert_eq!(form.restitution, "1");

    form.restitution = "-0.2".into();
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);
    assert_eq!(sim.get(id).unwrap().restitution, 0.0);
    assert_eq!(form.restitution, "0");
}

#[test]
fn editing_radius_or_mass_derives_the_other() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = sim.spawn(NewParticle { centre: NVec2::new(500.0, 500.0), ..Default::default() });

    let mut form = form_for(&sim, id);
    form.radius = "2".into();
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);
    // density 1: (4/3) pi 8 = 33.51 -> 33.5
    assert_eq!(sim.get(id).unwrap().mass(), 33.5);
    assert_eq!(form.mass, "33.5");

    form.mass = "268".into();
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);
    // cube root of 3 * 268 / 4 pi rounds to 4.00
    assert_eq!(sim.get(id).unwrap().radius(), 4.0);
    assert_eq!(form.radius, "4");
}

#[test]
fn switching_material_updates_density_and_colour() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = sim.spawn(NewParticle { centre: NVec2::new(500.0, 500.0), ..Default::default() });

    let mut form = form_for(&sim, id);
    form.material = "Steel - 7850kgm^-3".into();
    form.radius = "0.5".into();
    assert!(form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng));

    let p = sim.get(id).unwrap();
    assert_eq!(p.density(), 7850.0);
    assert_eq!(p.colour, materials.colour("Steel - 7850kgm^-3").unwrap());
    assert_eq!(p.mass(), 4110.0);
    assert_eq!(p.material, "Steel - 7850kgm^-3");

    form.material = "Unobtainium".into();
    assert!(!form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng));
}

#[test]
fn oversized_radius_is_clamped() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = sim.spawn(NewParticle { centre: NVec2::new(500.0, 500.0), radius: 30.0, ..Default::default() });

    let mut form = form_for(&sim, id);
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);
    assert_eq!(sim.get(id).unwrap().radius(), 4.8);
    assert_eq!(form.radius, "4.8");
}

#[test]
fn random_velocity_is_drawn_once() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(7);
    let id = sim.spawn(NewParticle { centre: NVec2::new(500.0, 500.0), radius: 0.5, ..Default::default() });

    let mut form = form_for(&sim, id);
    form.random_velocity = true;
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);

    let v = sim.get(id).unwrap().velocity;
    assert!(sim.get(id).unwrap().has_random_velocity);
    assert!(v.x.abs() <= 2.5 && v.y.abs() <= 2.5);
    assert_eq!(form.velocity_x, v.x.to_string());

    // flag still on: the velocity is kept
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);
    assert_eq!(sim.get(id).unwrap().velocity, v);
}

#[test]
fn lock_height_and_trace_flags() {
    let mut sim = sandbox();
    let materials = MaterialRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = sim.spawn(NewParticle { centre: NVec2::new(500.0, 500.0), radius: 0.5, ..Default::default() });

    let mut form = form_for(&sim, id);
    form.lock_height = true;
    form.height = "2".into();
    form.draw_trace = true;
    form.apply(&mut sim, id, &materials, Placement::Cursor(NVec2::new(300.0, 100.0)), &mut rng);

    let p = sim.get(id).unwrap();
    assert_eq!(p.position, NVec2::new(300.0, 1080.0 - 200.0 - 50.0));
    assert!(p.trace.is_some());
    // the edited state becomes the frame 0 state
    assert_eq!(p.history().get(FrameIndex::ZERO).unwrap().position, p.position);

    form.draw_trace = false;
    form.apply(&mut sim, id, &materials, Placement::Keep, &mut rng);
    assert!(sim.get(id).unwrap().trace.is_none());
}

// ==================================================================================
// Scene management tests
// ==================================================================================

#[test]
fn zoom_keeps_particles_anchored() {
    let mut sim = sandbox();
    let id = ball(&mut sim, [600.0, 880.0], [0.0, 0.0], [0.0, 0.0], 0.5);

    assert!(sim.rescale(200.0, 400.0));
    let p = sim.get(id).unwrap();
    assert_eq!(p.position, NVec2::new(800.0, 680.0));
    assert_eq!(sim.context.scale, 200.0);

    sim.tick(DT);
    assert!(!sim.rescale(100.0, 400.0), "zoom must be locked once playing");
}

#[test]
fn pick_remove_and_clear() {
    let mut sim = sandbox();
    let a = ball(&mut sim, [300.0, 300.0], [0.0, 0.0], [0.0, 0.0], 0.5);
    let b = ball(&mut sim, [900.0, 300.0], [0.0, 0.0], [0.0, 0.0], 0.5);

    assert_eq!(sim.particle_at(&NVec2::new(320.0, 310.0)), Some(a));
    assert_eq!(sim.particle_at(&NVec2::new(600.0, 300.0)), None);

    assert!(sim.remove(a).is_some());
    assert!(sim.get(a).is_none());
    assert_eq!(sim.len(), 1);

    sim.tick(DT);
    sim.clear();
    assert!(sim.is_empty() && sim.get(b).is_none());
    assert_eq!(sim.context.frame, FrameIndex::ZERO);
}

#[test]
fn custom_materials_are_listed_first() {
    let mut materials = MaterialRegistry::new();
    let name = materials.register_custom("Foam", 30.0, Rgb(250, 240, 200));
    assert_eq!(name, "Foam - 30.0kgm^-3");
    assert_eq!(materials.density(&name), Some(30.0));

    let names = materials.names();
    let steel = names.iter().position(|n| *n == "Steel - 7850kgm^-3").unwrap();
    let foam = names.iter().position(|n| *n == name).unwrap();
    assert!(foam < steel);
    assert!(names.contains(&DEFAULT_MATERIAL));
}

#[test]
fn registering_the_default_material_reuses_it() {
    let mut materials = MaterialRegistry::new();
    let before = materials.names().len();

    let name = materials.register_custom("Custom Material 1", 1.0, Rgb(144, 202, 249));
    assert_eq!(name, DEFAULT_MATERIAL);
    assert_eq!(materials.names().len(), before);
}

#[test]
fn custom_materials_file_round_trip() {
    let mut materials = MaterialRegistry::new();
    let foam = materials.register_custom("Foam", 30.0, Rgb(250, 240, 200));
    let saved = custom_materials(&materials);

    let path = std::env::temp_dir().join(format!("circlesim_materials_{}.yaml", std::process::id()));
    save_materials(&path, &saved).unwrap();
    let loaded = load_materials(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, saved);
    assert!(loaded.iter().any(|m| m.name == foam && m.density == 30.0 && m.colour == [250, 240, 200]));
    assert!(loaded.iter().any(|m| m.name == DEFAULT_MATERIAL));
    assert!(loaded.iter().all(|m| !m.name.starts_with("Steel")));
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn scenario_round_trip_preserves_particles() {
    let (mut sim, a, _) = busy_sandbox();
    {
        let p = sim.get_mut(a).unwrap();
        p.trace = Some(circlesim::Trace::new(p.colour));
        p.has_random_velocity = true;
    }
    let materials = MaterialRegistry::new();
    let cfg = export_scenario(&EngineConfig::default(), &sim, &materials);

    let text = serde_yaml::to_string(&cfg).unwrap();
    let parsed: ScenarioConfig = serde_yaml::from_str(&text).unwrap();
    let loaded = Scenario::build_scenario(parsed).unwrap();

    assert_eq!(loaded.simulation.context.scale, sim.context.scale);
    assert_eq!(loaded.simulation.len(), sim.len());
    for (orig, back) in sim.particles().iter().zip(loaded.simulation.particles()) {
        assert_eq!(orig.position, back.position);
        assert_eq!(orig.velocity, back.velocity);
        assert_eq!(orig.acceleration, back.acceleration);
        assert_eq!(orig.radius(), back.radius());
        assert_eq!(orig.mass(), back.mass());
        assert_eq!(orig.restitution, back.restitution);
        assert_eq!(orig.material, back.material);
        assert_eq!(orig.trace.is_some(), back.trace.is_some());
        assert_eq!(orig.has_random_velocity, back.has_random_velocity);
    }
}

#[test]
fn scenario_keeps_stored_mass_and_volume() {
    let yaml = r#"
scale: 50.0
particles:
  - has_random_velocity: false
    has_trace: false
    restitution: 0.5
    material: "Mystery - 3kgm^-3"
    radius: 1.0
    density: 3.0
    mass: 123.0
    volume: 7.0
    velocity: [1.0, 2.0]
    colour: [10, 20, 30]
    position: [100.0, 200.0]
    acceleration: [0.0, 9.81]
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let scenario = Scenario::build_scenario(cfg).unwrap();
    let p = &scenario.simulation.particles()[0];

    assert_eq!(p.mass(), 123.0);
    assert_eq!(p.volume(), 7.0);
    assert_eq!(scenario.simulation.context.scale, 50.0);
    // unknown materials are registered from the record
    assert_eq!(scenario.materials.density("Mystery - 3kgm^-3"), Some(3.0));
}

#[test]
fn scenario_rejects_bad_scale() {
    let cfg: ScenarioConfig = serde_yaml::from_str("scale: 0.0\n").unwrap();
    assert!(Scenario::build_scenario(cfg).is_err());
}

#[test]
fn bundled_scenarios_load() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    for name in ["demo.yaml", "head_on.yaml"] {
        let cfg = ScenarioConfig::from_yaml_path(&dir.join(name)).unwrap();
        let scenario = Scenario::build_scenario(cfg).unwrap();
        assert!(!scenario.simulation.is_empty(), "{name} has no particles");
    }
}

// ==================================================================================
// Overlay tests
// ==================================================================================

#[test]
fn overlay_draws_circles_arrows_and_traces() {
    let mut sim = sandbox();
    let moving = ball(&mut sim, [300.0, 300.0], [2.0, 0.0], [0.0, 0.0], 0.5);
    ball(&mut sim, [900.0, 300.0], [0.0, 0.0], [0.0, 0.0], 0.25);
    {
        let p = sim.get_mut(moving).unwrap();
        p.trace = Some(circlesim::Trace::new(Rgb(255, 0, 0)));
    }
    for _ in 0..3 {
        sim.tick(DT);
    }

    let mut list = DrawList::new();
    render_simulation(&sim, &mut list);

    let circles: Vec<_> = list.circles().collect();
    assert_eq!(circles.len(), 2);
    assert_eq!(circles[0].1, 50.0);
    assert_eq!(circles[1].1, 25.0);

    // trace + two arrow strokes for the moving ball, nothing for the resting one
    let lines: Vec<_> = list.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].0.len(), 3);
    assert_eq!(lines[0].1, Rgb(255, 0, 0));

    // arrow points along +x
    let shaft = lines[1].0;
    assert!(shaft[1].x > shaft[0].x && (shaft[1].y - shaft[0].y).abs() < 1e-9);
}
