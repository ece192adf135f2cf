use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec3};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use tau_draw::batch::{LineVertex, PointVertex, Topology};
use tau_draw::core::{App, AppControl, FrameCtx};
use tau_draw::device::GpuInit;
use tau_draw::logging::{init_logging, LoggingConfig};
use tau_draw::mesh::MeshVertex;
use tau_draw::paint::{color_heatmap, color_spark, Color4u};
use tau_draw::particles::ParticleBuffer;
use tau_draw::render::BatchRenderer;
use tau_draw::shapes::{ArrowDescriptor, ShapeRenderer};
use tau_draw::state::{BackfaceCull, DepthTest};
use tau_draw::window::{Runtime, RuntimeConfig};

const TRAIL_CAPACITY: usize = 256;
const TRAIL_PARTICLES: usize = 4096;
const SPARK_PARTICLES: usize = 2048;
const EXPLOSION_PERIOD: f32 = 1.5;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "tau-draw sandbox".to_string(),
        ..Default::default()
    };
    Runtime::run(config, GpuInit::default(), Sandbox::new())
}

/// Draws every primitive each frame around a comet whose path is kept in a
/// wrapped vertex ring and whose exhaust feeds two particle pools.
struct Sandbox {
    shapes: ShapeRenderer,
    batch: BatchRenderer,

    trail_particles: ParticleBuffer,
    sparks: ParticleBuffer,
    next_explosion: f32,

    trail: Vec<LineVertex>,
    trail_head: usize,
    trail_len: usize,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            shapes: ShapeRenderer::new(),
            batch: BatchRenderer::new(),
            trail_particles: ParticleBuffer::new(TRAIL_PARTICLES),
            sparks: ParticleBuffer::new(SPARK_PARTICLES),
            next_explosion: EXPLOSION_PERIOD,
            trail: vec![LineVertex::new(Vec3::ZERO, Color4u::BLACK); TRAIL_CAPACITY],
            trail_head: 0,
            trail_len: 0,
        }
    }

    /// Appends to the trail ring, overwriting the oldest vertex when full.
    fn record_trail(&mut self, p: Vec3, color: Color4u) {
        let slot = (self.trail_head + self.trail_len) % TRAIL_CAPACITY;
        self.trail[slot] = LineVertex::new(p, color);
        if self.trail_len < TRAIL_CAPACITY {
            self.trail_len += 1;
        } else {
            self.trail_head = (self.trail_head + 1) % TRAIL_CAPACITY;
        }
    }

    fn draw_scene(&mut self, t: f32) {
        let s = &mut self.shapes;

        s.push_states(Color4u::GRAY.with_alpha(160));
        s.push_grid(Vec3::ZERO, 20, 20);
        s.pop_states::<Color4u>();

        s.push_basis(&Mat4::IDENTITY, 1.5, &ArrowDescriptor::default(), None);

        // Spinning cube with its wireframe on top.
        let spin = Mat4::from_rotation_translation(
            Quat::from_euler(glam::EulerRot::YXZ, t, t * 0.7, 0.0),
            Vec3::new(-3.0, 1.0, 0.0),
        );
        s.push_states((spin, Color4u::ORANGE));
        s.push_cube();
        s.push_states(Color4u::BLACK);
        s.push_cube_wireframe();
        s.pop_states::<Color4u>();
        s.pop_states::<(Mat4, Color4u)>();

        let heat = Color4u::from_vec3(color_heatmap(0.5 + 0.5 * t.sin()));
        s.push_states((Mat4::from_translation(Vec3::new(3.0, 1.0, 0.0)), heat));
        s.push_sphere(1.0, 0.8);
        s.push_states(Color4u::WHITE);
        s.push_sphere_wireframe(1.05, 0.85);
        s.pop_states::<Color4u>();
        s.pop_states::<(Mat4, Color4u)>();

        s.push_states((Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)), Color4u::TEAL));
        s.push_cylinder(1.5, 0.4, None);
        s.push_states(Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0)));
        s.push_cone(0.8, 0.6, false);
        s.pop_states::<Mat4>();
        s.pop_states::<(Mat4, Color4u)>();

        s.push_states(Color4u::PURPLE);
        s.push_cone_between(Vec3::new(-5.0, 0.0, 3.0), Vec3::new(-5.0, 2.0, 3.0), 0.5);
        s.push_arrow(
            Vec3::new(5.0, 0.0, 3.0),
            Vec3::new(5.0 + t.cos(), 2.0, 3.0 + t.sin()),
            ArrowDescriptor::default(),
            None,
        );
        s.pop_states::<Color4u>();

        s.push_states(Color4u::GOLD);
        s.push_helix_between(Vec3::new(-6.0, 0.0, -4.0), Vec3::new(-6.0, 3.0, -4.0), 0.5, 0.3, 4.0);
        s.pop_states::<Color4u>();

        // Double-sided quad, then the same quad outlined.
        let quad = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_x(-PI / 2.0),
            Vec3::new(0.0, 0.01, 4.0),
        );
        s.push_states((quad, Color4u::NAVY.with_alpha(128), BackfaceCull::False));
        s.push_quad();
        s.push_states(Color4u::CYAN);
        s.push_quad_wireframe();
        s.pop_states::<Color4u>();
        s.pop_states::<(Mat4, Color4u, BackfaceCull)>();

        s.push_states(Color4u::LIME);
        s.push_quad_points(
            &[
                Vec3::new(6.0, 0.0, -1.0),
                Vec3::new(7.0, 0.0, -1.0),
                Vec3::new(7.0, 1.0, -1.0),
                Vec3::new(6.0, 1.0, -1.0),
            ],
            Vec3::Z,
        );
        s.pop_states::<Color4u>();

        // Tetrahedron through the raw mesh path.
        let tetra = tetrahedron();
        s.push_states((
            Mat4::from_translation(Vec3::new(0.0, 0.5, 2.0)) * Mat4::from_rotation_y(t),
            Color4u::PINK,
        ));
        s.push_mesh(&tetra, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11], Topology::TriangleList);
        s.pop_states::<(Mat4, Color4u)>();

        s.push_states(Color4u::YELLOW);
        s.push_line(Vec3::new(-8.0, 0.0, 0.0), Vec3::new(-8.0, 4.0, 0.0));
        s.push_lines(&[
            Vec3::new(-8.5, 0.0, 0.5),
            Vec3::new(-8.5, 3.0, 0.5),
            Vec3::new(-7.5, 0.0, 0.5),
            Vec3::new(-7.5, 3.0, 0.5),
        ]);
        s.push_lines_indexed(
            &[
                Vec3::new(-9.0, 0.0, -1.0),
                Vec3::new(-7.0, 0.0, -1.0),
                Vec3::new(-8.0, 2.0, -1.0),
            ],
            &[0, 1, 1, 2, 2, 0],
        );
        s.pop_states::<Color4u>();

        s.push_states((
            Mat4::from_scale_rotation_translation(
                Vec3::splat(1.2),
                Quat::from_rotation_x(PI / 2.0),
                Vec3::new(0.0, 0.02, 0.0),
            ),
            Color4u::SILVER,
        ));
        s.push_circle_ring(64);
        s.pop_states::<(Mat4, Color4u)>();

        // A small orbiting probe camera, shown by its frustum.
        let probe_eye = Vec3::new(8.0 * (t * 0.3).cos(), 3.0, 8.0 * (t * 0.3).sin());
        let probe = Mat4::perspective_rh(PI / 6.0, 1.5, 0.5, 4.0)
            * Mat4::look_at_rh(probe_eye, Vec3::ZERO, Vec3::Y);
        s.push_states(Color4u::MAGENTA);
        s.push_frustum(&probe.inverse());
        s.pop_states::<Color4u>();

        // Overlay axes, visible through geometry.
        s.push_states(DepthTest::False);
        s.push_basis_basic(&Mat4::from_translation(probe_eye), 0.5);
        s.push_basis_basic_2d(&Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0)), 1.0);
        s.pop_states::<DepthTest>();

        s.push_states(Color4u::RED);
        s.push_point(Vec3::new(0.0, 4.0, 0.0), 10);
        s.pop_states::<Color4u>();

        let markers: Vec<PointVertex> = (0..12)
            .map(|i| {
                let a = i as f32 / 12.0 * TAU;
                let c = Color4u::from_vec3(color_spark(i as f32 / 11.0));
                PointVertex::new(Vec3::new(2.5 * a.cos(), 0.05, 2.5 * a.sin()), c)
            })
            .collect();
        s.push_points(&markers, 6);
    }

    /// Advances the comet, its trail ring and both particle pools.
    fn simulate(&mut self, t: f32, dt: f32) {
        let comet = comet_position(t);
        let velocity = (comet_position(t + 0.01) - comet) / 0.01;
        let hue = 0.5 + 0.5 * (t * 0.5).sin();

        self.record_trail(comet, Color4u::from_vec3(color_spark(hue)));
        self.trail_particles
            .push_trail(comet, -velocity, 6, Color4u::from_vec3(color_spark(hue)));

        if t >= self.next_explosion {
            self.next_explosion = t + EXPLOSION_PERIOD;
            self.sparks.push_explosion(comet, velocity * 0.2, 400, Color4u::GOLD);
            log::debug!("explosion at {comet:?}, {} sparks live", self.sparks.size());
        }

        self.trail_particles.update(dt);
        self.sparks.update_explosion(dt);

        self.shapes.push_lines_from_cyclic_source(
            &self.trail,
            self.trail_head,
            self.trail_len,
            TRAIL_CAPACITY,
        );
        self.trail_particles.render(&mut self.shapes);
        self.sparks.render(&mut self.shapes);

        self.shapes.push_states(Color4u::WHITE);
        self.shapes.push_sphere(0.15, 0.15);
        self.shapes.pop_states::<Color4u>();
    }
}

impl App for Sandbox {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.logical_key == Key::Named(NamedKey::Escape)
            {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let t = ctx.time.elapsed;
        let dt = ctx.time.dt;

        let eye = Vec3::new(14.0 * (t * 0.1).cos(), 7.0, 14.0 * (t * 0.1).sin());
        let view_projection = Mat4::perspective_rh(PI / 3.0, ctx.window.aspect_ratio(), 0.1, 100.0)
            * Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);

        self.draw_scene(t);
        self.simulate(t, dt);

        let Self { shapes, batch, .. } = self;
        let control = ctx.render(Color4u::rgb(24, 24, 32), |rctx, target| {
            let mut backend = batch.backend(rctx, target);
            shapes.render(&mut backend, view_projection);
        });
        shapes.post_render();

        control
    }
}

/// Lissajous path above the grid.
fn comet_position(t: f32) -> Vec3 {
    Vec3::new(6.0 * (t * 0.7).sin(), 2.5 + (t * 1.3).sin(), 6.0 * (t * 0.9).cos())
}

/// Flat-shaded tetrahedron as an unindexed triangle list.
fn tetrahedron() -> Vec<MeshVertex> {
    let corners = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ]
    .map(|c| c * 0.5);
    let faces = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];

    faces
        .iter()
        .flat_map(|&[a, b, c]| {
            let (pa, pb, pc) = (corners[a], corners[b], corners[c]);
            let normal = (pb - pa).cross(pc - pa).normalize_or_zero();
            [pa, pb, pc].map(|p| MeshVertex { p, normal })
        })
        .collect()
}
