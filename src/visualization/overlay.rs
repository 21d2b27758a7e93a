//! Per-frame drawing of the sandbox, independent of any window backend.
//!
//! The simulation is described through [`RenderSink`]: one filled circle and
//! one direction arrow per particle, plus the particle's trace when it has
//! one. [`DrawList`] is a sink that just records the calls; the Bevy viewer
//! turns it into meshes and gizmo lines.

use crate::simulation::engine::Simulation;
use crate::simulation::particle::Particle;
use crate::simulation::states::{NVec2, Rgb};

/// Arrow length relative to the drawn radius
const ARROW_LENGTH: f64 = 1.5;
const ARROW_HEAD: f64 = 0.35; // fraction of the arrow length
const ARROW_COLOUR: Rgb = Rgb(33, 33, 33);
const TRACE_WIDTH: f32 = 2.0;
const ARROW_WIDTH: f32 = 2.0;

/// What the core needs from a renderer. Coordinates are pixels, origin at
/// the top-left, y pointing down.
pub trait RenderSink {
    fn draw_circle(&mut self, centre: NVec2, radius: f64, colour: Rgb);
    fn draw_line(&mut self, points: &[NVec2], colour: Rgb, width: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle { centre: NVec2, radius: f64, colour: Rgb },
    Line { points: Vec<NVec2>, colour: Rgb, width: f32 },
}

/// Sink that keeps every call, in order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn circles(&self) -> impl Iterator<Item = (&NVec2, f64, Rgb)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Circle { centre, radius, colour } => Some((centre, *radius, *colour)),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = (&[NVec2], Rgb, f32)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Line { points, colour, width } => Some((points.as_slice(), *colour, *width)),
            _ => None,
        })
    }
}

impl RenderSink for DrawList {
    fn draw_circle(&mut self, centre: NVec2, radius: f64, colour: Rgb) {
        self.commands.push(DrawCommand::Circle { centre, radius, colour });
    }

    fn draw_line(&mut self, points: &[NVec2], colour: Rgb, width: f32) {
        self.commands.push(DrawCommand::Line { points: points.to_vec(), colour, width });
    }
}

/// Draw every particle: traces first so circles sit on top of them
pub fn render_simulation(sim: &Simulation, sink: &mut impl RenderSink) {
    let scale = sim.context.scale;

    for p in sim.particles() {
        if let Some(trace) = &p.trace {
            if trace.points.len() > 1 {
                sink.draw_line(&trace.points, trace.colour, TRACE_WIDTH);
            }
        }
    }

    for p in sim.particles() {
        sink.draw_circle(p.position, p.scaled_radius(scale), p.colour);
        draw_direction_arrow(p, scale, sink);
    }
}

/// Arrow from the centre along the direction of travel. Nothing is drawn
/// for a particle at rest.
fn draw_direction_arrow(p: &Particle, scale: f64, sink: &mut impl RenderSink) {
    if p.velocity.norm_squared() == 0.0 {
        return;
    }
    let length = p.scaled_radius(scale) * ARROW_LENGTH;
    // screen angle is measured anticlockwise, y points down
    let angle = p.direction();
    let dir = NVec2::new(angle.cos(), -angle.sin());
    let tip = p.position + dir * length;

    sink.draw_line(&[p.position, tip], ARROW_COLOUR, ARROW_WIDTH);

    let head = length * ARROW_HEAD;
    let back = -dir * head;
    let side = NVec2::new(-dir.y, dir.x) * head * 0.5;
    sink.draw_line(&[tip + back + side, tip, tip + back - side], ARROW_COLOUR, ARROW_WIDTH);
}
