//! Engine: the frame loop.
//!
//! Owns the scene, the camera, the render toggles and the frame buffer, and
//! turns them into one finished character grid per call to `render_frame`.
//! The engine never touches the terminal; whoever drives it decides when
//! frames happen and where the grid goes.

pub mod visibility;

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::camera::{Camera, Control, Projection};
use crate::config::{Glyphs, ViewerConfig};
use crate::math::Point2D;
use crate::mesh::loader::{LoadStatus, MeshSlot};
use crate::mesh::Mesh;
use crate::renderer::FrameBuffer;
use crate::types::GridSize;

use visibility::prepare_faces;

/// The four display toggles input can flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub cull_backfaces: bool,
    pub show_ground: bool,
    /// Gate pixel writes on the depth buffer instead of relying on face
    /// order alone.
    pub depth_test: bool,
    /// Fill faces before outlining them; off renders wireframe only.
    pub filled: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            cull_backfaces: false,
            show_ground: true,
            depth_test: true,
            filled: true,
        }
    }
}

/// Scale the primary mesh once, the first frame at or after `at_frame`
/// on which it has finished loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedScale {
    pub at_frame: u64,
    pub factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Degrees of yaw added to the primary mesh every frame.
    pub spin_per_frame: f64,
    pub scripted_scale: Option<ScriptedScale>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            spin_per_frame: 0.5,
            scripted_scale: Some(ScriptedScale {
                at_frame: 100,
                factor: 20.0,
            }),
        }
    }
}

/// Frames per second, resampled once a second.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    last_sample: Option<Instant>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn tick(&mut self, now: Instant) {
        let last = *self.last_sample.get_or_insert(now);
        self.frames += 1;
        if now.saturating_duration_since(last) >= Duration::from_secs(1) {
            self.fps = self.frames;
            self.frames = 0;
            self.last_sample = Some(now);
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Per-frame face accounting across the whole scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub culled: usize,
    pub unresolved: usize,
    pub unprojectable: usize,
}

/// Snapshot of engine state for a status line.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub camera: Camera,
    pub settings: RenderSettings,
    pub fps: u32,
    pub frame: u64,
    pub primary: Option<LoadStatus>,
    pub stats: FrameStats,
}

fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.camera;
        let s = &self.settings;
        write!(
            f,
            "yaw {:.2} pitch {:.2} | pos {:.2}, {:.2}, {:.2} | {} fps | cull {} | wire {} | depth {} | ground {}",
            c.yaw,
            c.pitch,
            c.offset_x,
            c.offset_y,
            c.zoom,
            self.fps,
            on_off(s.cull_backfaces),
            on_off(!s.filled),
            on_off(s.depth_test),
            on_off(s.show_ground),
        )?;
        if let Some(status) = self.primary {
            write!(f, " | mesh {status:?}")?;
        }
        Ok(())
    }
}

pub struct Engine {
    pub camera: Camera,
    pub settings: RenderSettings,
    glyphs: Glyphs,
    animation: AnimationConfig,
    aspect: f64,
    scene: Vec<MeshSlot>,
    ground: Mesh,
    buffer: FrameBuffer,
    frame: u64,
    scale_fired: bool,
    fps: FpsCounter,
    stats: FrameStats,
    /// Unresolved-face count last reported per scene slot.
    reported_unresolved: Vec<usize>,
}

impl Engine {
    pub fn new(config: &ViewerConfig, size: GridSize) -> Self {
        Engine {
            camera: config.camera,
            settings: config.render,
            glyphs: config.glyphs,
            animation: config.animation,
            aspect: config.display.cell_aspect,
            scene: Vec::new(),
            ground: Mesh::ground_plane(config.ground.y, config.ground.half_extent),
            buffer: FrameBuffer::new(size),
            frame: 0,
            scale_fired: false,
            fps: FpsCounter::default(),
            stats: FrameStats::default(),
            reported_unresolved: Vec::new(),
        }
    }

    /// Append a mesh to the scene. The first one added is the primary mesh.
    pub fn add_mesh(&mut self, slot: MeshSlot) {
        self.scene.push(slot);
        self.reported_unresolved.push(0);
    }

    pub fn scene(&self) -> &[MeshSlot] {
        &self.scene
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn resize(&mut self, size: GridSize) {
        if size != self.buffer.size() {
            debug!(width = size.width, height = size.height, "resizing frame buffer");
            self.buffer.resize(size);
        }
    }

    pub fn apply(&mut self, control: Control) {
        let s = &mut self.settings;
        match control {
            Control::Rotate { d_yaw, d_pitch } => self.camera.rotate(d_yaw, d_pitch),
            Control::Pan { dx, dy } => self.camera.pan(dx, dy),
            Control::Zoom(delta) => self.camera.zoom_by(delta),
            Control::ToggleCulling => s.cull_backfaces = !s.cull_backfaces,
            Control::ToggleGround => s.show_ground = !s.show_ground,
            Control::ToggleDepthTest => s.depth_test = !s.depth_test,
            Control::ToggleFill => s.filled = !s.filled,
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            camera: self.camera,
            settings: self.settings,
            fps: self.fps.fps(),
            frame: self.frame,
            primary: self.scene.first().map(MeshSlot::status),
            stats: self.stats,
        }
    }

    /// Produce the next frame.
    pub fn render_frame(&mut self, now: Instant) -> &FrameBuffer {
        // Camera and toggles are read once; input lands between frames.
        let camera = self.camera;
        let settings = self.settings;
        let projection = Projection::new(self.buffer.size(), self.aspect);

        self.buffer.clear();
        self.buffer.depth_test = settings.depth_test;
        self.fps.tick(now);
        for slot in &mut self.scene {
            slot.poll();
        }

        if settings.show_ground {
            self.draw_ground(&projection, &camera);
        }

        self.run_scripted_scale();
        let spin = self.animation.spin_per_frame;
        if let Some(primary) = self.scene.first_mut().and_then(MeshSlot::mesh_mut) {
            primary.rotate_y(spin);
        }

        let mut stats = FrameStats::default();
        for (i, slot) in self.scene.iter().enumerate() {
            let Some(mesh) = slot.mesh() else {
                continue;
            };
            let mesh_stats = draw_mesh(
                &mut self.buffer,
                mesh,
                &camera,
                &projection,
                &settings,
                &self.glyphs,
            );
            if mesh_stats.unresolved != self.reported_unresolved[i] {
                if mesh_stats.unresolved > 0 {
                    warn!(
                        mesh = slot.name(),
                        faces = mesh_stats.unresolved,
                        "skipping faces that reference missing vertices"
                    );
                }
                self.reported_unresolved[i] = mesh_stats.unresolved;
            }
            stats.drawn += mesh_stats.drawn;
            stats.culled += mesh_stats.culled;
            stats.unresolved += mesh_stats.unresolved;
            stats.unprojectable += mesh_stats.unprojectable;
        }
        if stats != self.stats {
            debug!(
                frame = self.frame,
                drawn = stats.drawn,
                culled = stats.culled,
                unresolved = stats.unresolved,
                unprojectable = stats.unprojectable,
                "face counts changed"
            );
        }
        self.stats = stats;

        self.frame += 1;
        &self.buffer
    }

    fn draw_ground(&mut self, projection: &Projection, camera: &Camera) {
        let corners: Option<Vec<Point2D>> = self
            .ground
            .vertices
            .iter()
            .map(|&v| projection.project(camera.view(v), camera))
            .collect();
        match corners.as_deref() {
            Some(&[a, b, c, d]) => self.buffer.fill_quad([a, b, c, d], self.glyphs.ground),
            _ => debug!("ground plane not projectable this frame"),
        }
    }

    fn run_scripted_scale(&mut self) {
        let Some(script) = self.animation.scripted_scale else {
            return;
        };
        if self.scale_fired || self.frame < script.at_frame {
            return;
        }
        let Some(primary) = self.scene.first_mut() else {
            return;
        };
        let name = primary.name().to_string();
        if let Some(mesh) = primary.mesh_mut().filter(|m| !m.is_empty()) {
            let f = script.factor;
            mesh.scale(f, f, f);
            self.scale_fired = true;
            info!(mesh = %name, factor = f, frame = self.frame, "scripted scale applied");
        }
    }
}

/// Run visibility and rasterization for one mesh.
pub fn draw_mesh(
    buffer: &mut FrameBuffer,
    mesh: &Mesh,
    camera: &Camera,
    projection: &Projection,
    settings: &RenderSettings,
    glyphs: &Glyphs,
) -> FrameStats {
    let view: Vec<_> = mesh.vertices.iter().map(|&v| camera.view(v)).collect();
    let (faces, vis) = prepare_faces(&mesh.faces, &view, camera.anchor(), settings.cull_backfaces);

    let mut stats = FrameStats {
        culled: vis.culled,
        unresolved: vis.unresolved,
        ..FrameStats::default()
    };

    for face in &faces {
        let projected: Option<Vec<Point2D>> = face
            .corners
            .iter()
            .map(|&p| projection.project(p, camera))
            .collect();
        let Some(points) = projected else {
            stats.unprojectable += 1;
            continue;
        };

        if settings.filled {
            match *points.as_slice() {
                [a, b, c] => buffer.fill_triangle(a, b, c, glyphs.fill),
                [a, b, c, d] => buffer.fill_quad([a, b, c, d], glyphs.fill),
                _ => {}
            }
        }
        buffer.draw_outline(&points, glyphs.edge);
        stats.drawn += 1;
    }

    stats
}
