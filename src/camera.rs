//! Camera state and the fixed-FOV perspective projection.

use serde::{Deserialize, Serialize};

use crate::math::{round_half_up, rotate_x, rotate_y, Point2D, Point3D};
use crate::types::GridSize;

/// Field of view, in the same units as `Camera::zoom`.
pub const FOV: f64 = 2.0;

/// Projected coordinates beyond this magnitude are treated as unprojectable.
/// Keeps a vertex sitting on the camera plane from turning into a line the
/// rasterizer would have to walk for billions of steps.
pub const MAX_SCREEN_COORD: f64 = 16_384.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Rotation about Y, degrees.
    pub yaw: f64,
    /// Rotation about X, degrees.
    pub pitch: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Depth offset between the camera and the world origin.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            yaw: -100.0,
            pitch: -30.0,
            offset_x: 0.0,
            offset_y: 1.0,
            zoom: 20.0,
        }
    }
}

impl Camera {
    /// Where the visibility pipeline measures face distances from.
    pub fn anchor(&self) -> Point3D {
        Point3D::new(self.offset_x, self.offset_y, self.zoom)
    }

    /// Apply yaw then pitch to a world-space point.
    pub fn view(&self, point: Point3D) -> Point3D {
        rotate_x(rotate_y(point, self.yaw), self.pitch)
    }

    pub fn rotate(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw += d_yaw;
        self.pitch += d_pitch;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom += delta;
    }
}

/// Maps camera-space points onto a character grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub grid: GridSize,
    /// Character cell width divided by cell height.
    pub aspect: f64,
}

impl Projection {
    pub fn new(grid: GridSize, aspect: f64) -> Self {
        Projection { grid, aspect }
    }

    /// Project a point that has already been rotated into view space.
    ///
    /// Returns `None` when the result is not finite or is absurdly far off
    /// the grid (a vertex at or behind the camera plane). Points merely
    /// outside the grid are returned so the rasterizer can clip per pixel.
    pub fn project(&self, point: Point3D, camera: &Camera) -> Option<Point2D> {
        let x = point.x - camera.offset_x;
        let y = -point.y + camera.offset_y;
        let z = -point.z + camera.zoom;

        let factor = FOV / (FOV + z);
        let w = f64::from(self.grid.width);
        let h = f64::from(self.grid.height);
        let sx = round_half_up((x * factor * self.aspect + 1.0) * w / 2.0);
        let sy = round_half_up((y * factor + 1.0) * h / 2.0);

        let usable = |v: f64| v.is_finite() && v.abs() <= MAX_SCREEN_COORD;
        if !usable(sx) || !usable(sy) || !z.is_finite() {
            return None;
        }
        Some(Point2D::new(sx as i32, sy as i32, z))
    }
}

/// Everything an input collaborator can do to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Rotate { d_yaw: f64, d_pitch: f64 },
    Pan { dx: f64, dy: f64 },
    Zoom(f64),
    ToggleCulling,
    ToggleGround,
    ToggleDepthTest,
    ToggleFill,
}
