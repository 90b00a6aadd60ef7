//! Vector math: points in world/camera space and on the character grid.
//!
//! `Point3D` is a plain value type: every operation returns a new point and
//! never touches its operands. Non-finite components are not sanitized; they
//! flow through the pipeline and are dropped at projection time.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Point3D { x, y, z }
    }

    pub fn add(self, other: Point3D) -> Point3D {
        Point3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Point3D) -> Point3D {
        Point3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn negate(self) -> Point3D {
        Point3D::new(-self.x, -self.y, -self.z)
    }

    pub fn scale(self, factor: f64) -> Point3D {
        Point3D::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn dot(self, other: Point3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    pub fn cross(self, other: Point3D) -> Point3D {
        Point3D::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance(self, other: Point3D) -> f64 {
        let d = self.sub(other);
        d.dot(d).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D::add(self, rhs)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D::sub(self, rhs)
    }
}

impl Neg for Point3D {
    type Output = Point3D;

    fn neg(self) -> Point3D {
        self.negate()
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, rhs: f64) -> Point3D {
        self.scale(rhs)
    }
}

/// A projected point on the character grid. `depth` is the camera-space
/// distance used by the rasterizer's depth buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
    pub depth: f64,
}

impl Point2D {
    pub const fn new(x: i32, y: i32, depth: f64) -> Self {
        Point2D { x, y, depth }
    }
}

// ---------------------------------------------------------------------------
// Axis rotations
// ---------------------------------------------------------------------------

/// Rotate `point` about the Y axis through the origin by `degrees`.
pub fn rotate_y(point: Point3D, degrees: f64) -> Point3D {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point3D::new(
        cos * point.x - sin * point.z,
        point.y,
        sin * point.x + cos * point.z,
    )
}

/// Rotate `point` about the X axis through the origin by `degrees`.
pub fn rotate_x(point: Point3D, degrees: f64) -> Point3D {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point3D::new(
        point.x,
        cos * point.y + sin * point.z,
        -sin * point.y + cos * point.z,
    )
}

/// Round half-way values towards positive infinity (`-2.5 → -2`, `2.5 → 3`).
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
