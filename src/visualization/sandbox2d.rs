use std::path::PathBuf;

use bevy::input::mouse::MouseWheel;
use bevy::math::primitives::Circle;
use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};
use bevy::window::PrimaryWindow;

use crate::configuration::config::{save_materials, EngineConfig};
use crate::simulation::editor::{ParticleForm, Placement};
use crate::simulation::engine::{NewParticle, Simulation, TickOutcome};
use crate::simulation::material::MaterialRegistry;
use crate::simulation::scenario::{custom_materials, export_scenario, Scenario};
use crate::simulation::states::{NVec2, Rgb};
use crate::visualization::overlay::{render_simulation, DrawList};

/// Zoom factor per mouse wheel notch
const ZOOM_STEP: f64 = 1.1;
const GRAVITY: &str = "9.81";
const BG_COLOUR: Color = Color::srgb(0.957, 0.957, 0.957);

/// Which control loop is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Editing,
    Running,
    Paused,
}

#[derive(Resource)]
struct Sandbox {
    mode: Mode,
    form: ParticleForm, // template applied to newly placed particles
    engine: EngineConfig,
    save_path: PathBuf,
    materials_path: Option<PathBuf>, // custom materials are saved here too
}

#[derive(Resource, Default)]
struct FrameDraw(DrawList);

#[derive(Resource)]
struct CircleMesh(Handle<Mesh>);

/// Pooled circle entity, reused for the n-th circle of the draw list
#[derive(Component)]
struct CircleSlot(usize);

pub fn run_sandbox(scenario: Scenario, save_path: PathBuf, materials_path: Option<PathBuf>) {
    info!("run_sandbox: starting viewer with {} particles", scenario.simulation.len());

    let Scenario { engine, simulation, materials } = scenario;
    let window = Window {
        title: "circlesim".into(),
        resolution: (engine.width as f32, engine.height as f32).into(),
        resizable: false,
        ..default()
    };

    App::new()
        .insert_resource(ClearColor(BG_COLOUR))
        .insert_resource(simulation)
        .insert_resource(materials)
        .insert_resource(Sandbox {
            mode: Mode::Editing,
            form: ParticleForm::default(),
            engine,
            save_path,
            materials_path,
        })
        .init_resource::<FrameDraw>()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin { primary_window: Some(window), ..default() })
                .set(bevy::log::LogPlugin {
                    level: bevy::log::Level::INFO,
                    filter: "wgpu=warn,naga=warn,info".into(),
                    ..default()
                }),
        )
        .add_systems(Startup, setup_system)
        .add_systems(
            Update,
            (
                editor_input_system,
                time_control_system,
                physics_step_system,
                draw_system,
                sync_circles_system,
                title_system,
            )
                .chain(),
        )
        .run();
}

fn setup_system(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.spawn(Camera2dBundle::default());
    commands.insert_resource(CircleMesh(meshes.add(Circle::new(1.0))));
}

/// Pixel space (origin top-left, y down) to Bevy world space
fn to_world(p: &NVec2, sim: &Simulation) -> Vec2 {
    let b = &sim.context.bounds;
    Vec2::new((p.x - b.width / 2.0) as f32, (b.height / 2.0 - p.y) as f32)
}

fn to_color(c: Rgb) -> Color {
    Color::srgb_u8(c.0, c.1, c.2)
}

#[allow(clippy::too_many_arguments)]
fn editor_input_system(
    mut sandbox: ResMut<Sandbox>,
    mut sim: ResMut<Simulation>,
    materials: Res<MaterialRegistry>,
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut wheel: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if sandbox.mode != Mode::Editing {
        wheel.clear();
        return;
    }
    let cursor = windows
        .get_single()
        .ok()
        .and_then(|w| w.cursor_position())
        .map(|c| NVec2::new(c.x as f64, c.y as f64));

    if let Some(cursor) = cursor {
        if buttons.just_pressed(MouseButton::Left) {
            let limits = sim.context.radius_limits();
            let id = sim.spawn(NewParticle { centre: cursor, radius: limits.max, ..default() });
            let mut rng = rand::thread_rng();
            let mut form = sandbox.form.clone();
            if !form.apply(&mut sim, id, &materials, Placement::Cursor(cursor), &mut rng) {
                debug!("placed particle {id:?} with defaults, form did not parse");
            }
            sandbox.form = form;
        }
        if buttons.just_pressed(MouseButton::Right) {
            if let Some(id) = sim.particle_at(&cursor) {
                sim.remove(id);
            }
        }
        for ev in wheel.read() {
            let new_scale = (sim.context.scale * ZOOM_STEP.powf(ev.y as f64)).round().max(1.0);
            sim.rescale(new_scale, cursor.x);
        }
    } else {
        wheel.clear();
    }

    let form = &mut sandbox.form;
    if keys.just_pressed(KeyCode::KeyR) {
        form.random_velocity = !form.random_velocity;
    }
    if keys.just_pressed(KeyCode::KeyT) {
        form.draw_trace = !form.draw_trace;
    }
    if keys.just_pressed(KeyCode::KeyG) {
        form.acceleration_y = if form.acceleration_y == GRAVITY { "0".into() } else { GRAVITY.into() };
    }
    if keys.just_pressed(KeyCode::KeyM) {
        let names = materials.names();
        let next = names
            .iter()
            .position(|n| *n == form.material)
            .map_or(0, |i| (i + 1) % names.len());
        if let Some(name) = names.get(next) {
            form.material = name.to_string();
            info!("material: {name}");
        }
    }
    if keys.just_pressed(KeyCode::KeyC) {
        sim.clear();
    }
    if keys.just_pressed(KeyCode::KeyS) {
        let cfg = export_scenario(&sandbox.engine, &sim, &materials);
        match cfg.to_yaml_path(&sandbox.save_path) {
            Ok(()) => info!("saved scenario to {}", sandbox.save_path.display()),
            Err(e) => error!("save failed: {e:#}"),
        }
        if let Some(path) = &sandbox.materials_path {
            match save_materials(path, &custom_materials(&materials)) {
                Ok(()) => info!("saved custom materials to {}", path.display()),
                Err(e) => error!("saving materials failed: {e:#}"),
            }
        }
    }
    if keys.just_pressed(KeyCode::Enter) && !sim.is_empty() {
        sandbox.mode = Mode::Running;
    }
}

fn time_control_system(mut sandbox: ResMut<Sandbox>, mut sim: ResMut<Simulation>, keys: Res<ButtonInput<KeyCode>>) {
    if sandbox.mode == Mode::Editing {
        return;
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        sim.context.time.speed_up();
    }
    if keys.just_pressed(KeyCode::ArrowLeft) {
        sim.context.time.slow_down();
    }
    if keys.any_just_pressed([KeyCode::Space, KeyCode::Escape]) {
        sandbox.mode = match sandbox.mode {
            Mode::Running => Mode::Paused,
            _ => {
                sim.resume();
                Mode::Running
            }
        };
    }
}

fn physics_step_system(mut sandbox: ResMut<Sandbox>, mut sim: ResMut<Simulation>, time: Res<Time>) {
    if sandbox.mode != Mode::Running {
        return;
    }
    if sim.tick(time.delta_seconds_f64()) == TickOutcome::RewindExhausted {
        info!("reached the start of the recording, pausing");
        sandbox.mode = Mode::Paused;
    }
}

fn draw_system(sim: Res<Simulation>, mut draw: ResMut<FrameDraw>, mut gizmos: Gizmos) {
    draw.0.clear();
    render_simulation(&sim, &mut draw.0);

    // gizmo line width is global, per-line widths are not honoured
    for (points, colour, _width) in draw.0.lines() {
        gizmos.linestrip_2d(points.iter().map(|p| to_world(p, &sim)), to_color(colour));
    }
}

fn sync_circles_system(
    mut commands: Commands,
    sim: Res<Simulation>,
    draw: Res<FrameDraw>,
    mesh: Option<Res<CircleMesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut slots: Query<(&CircleSlot, &mut Transform, &mut Visibility, &Handle<ColorMaterial>)>,
) {
    let Some(mesh) = mesh else {
        return;
    };
    let circles: Vec<_> = draw.0.circles().collect();

    let mut existing = 0;
    for (CircleSlot(i), mut transform, mut visibility, material) in &mut slots {
        existing = existing.max(*i + 1);
        match circles.get(*i) {
            Some((centre, radius, colour)) => {
                let at = to_world(centre, &sim);
                *transform = Transform::from_xyz(at.x, at.y, *i as f32 * 0.001)
                    .with_scale(Vec3::new(*radius as f32, *radius as f32, 1.0));
                *visibility = Visibility::Visible;
                if let Some(m) = materials.get_mut(material) {
                    m.color = to_color(*colour);
                }
            }
            None => *visibility = Visibility::Hidden,
        }
    }

    for (i, (centre, radius, colour)) in circles.iter().enumerate().skip(existing) {
        let at = to_world(centre, &sim);
        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(mesh.0.clone()),
                material: materials.add(ColorMaterial::from(to_color(*colour))),
                transform: Transform::from_xyz(at.x, at.y, i as f32 * 0.001)
                    .with_scale(Vec3::new(*radius as f32, *radius as f32, 1.0)),
                ..default()
            },
            CircleSlot(i),
        ));
    }
}

fn title_system(sandbox: Res<Sandbox>, sim: Res<Simulation>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    let ctx = &sim.context;
    let title = format!(
        "circlesim | {:?} | T+{:.4} | x{} | frame {}",
        sandbox.mode,
        ctx.t_now,
        ctx.time.multiplier(),
        ctx.frame
    );
    if window.title != title {
        window.title = title;
    }
}
