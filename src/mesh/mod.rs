//! Mesh model: vertices plus triangle/quad faces, and the per-vertex
//! transforms that replace a mesh's vertex sequence wholesale.

pub mod loader;
pub mod obj;

use crate::math::{rotate_x, rotate_y, Point3D};

/// Zero-based indices into the owning mesh's vertex list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Face {
    Triangle([usize; 3]),
    Quad([usize; 4]),
}

impl Face {
    pub fn indices(&self) -> &[usize] {
        match self {
            Face::Triangle(i) => &i[..],
            Face::Quad(i) => &i[..],
        }
    }

    /// Build a face from a corner list. Returns `None` unless there are
    /// exactly three or four corners.
    pub fn from_indices(indices: &[usize]) -> Option<Face> {
        match *indices {
            [a, b, c] => Some(Face::Triangle([a, b, c])),
            [a, b, c, d] => Some(Face::Quad([a, b, c, d])),
            _ => None,
        }
    }

    /// Look every corner up in `vertices`; `None` if any index is out of range.
    pub fn resolve(&self, vertices: &[Point3D]) -> Option<Vec<Point3D>> {
        self.indices()
            .iter()
            .map(|&i| vertices.get(i).copied())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3D>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3D>, faces: Vec<Face>) -> Self {
        Mesh { vertices, faces }
    }

    /// Flat square at height `y`, spanning `±half_extent` in X and Z.
    ///
    /// Corners run `(-s, s) → (s, s) → (s, -s) → (-s, -s)` so that the frame
    /// loop can fill them directly as a quad; no face list is attached.
    pub fn ground_plane(y: f64, half_extent: f64) -> Self {
        let s = half_extent;
        Mesh {
            vertices: vec![
                Point3D::new(-s, y, s),
                Point3D::new(s, y, s),
                Point3D::new(s, y, -s),
                Point3D::new(-s, y, -s),
            ],
            faces: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn rotate_x(&mut self, degrees: f64) {
        self.transform_vertices(|v| rotate_x(v, degrees));
    }

    pub fn rotate_y(&mut self, degrees: f64) {
        self.transform_vertices(|v| rotate_y(v, degrees));
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        let offset = Point3D::new(dx, dy, dz);
        self.transform_vertices(|v| v + offset);
    }

    /// Per-axis scale anchored at the origin, not at the mesh centre.
    pub fn scale(&mut self, sx: f64, sy: f64, sz: f64) {
        self.transform_vertices(|v| Point3D::new(v.x * sx, v.y * sy, v.z * sz));
    }

    /// Replace the vertex sequence with `f` applied to every vertex.
    pub fn transform_vertices(&mut self, f: impl Fn(Point3D) -> Point3D) {
        self.vertices = self.vertices.iter().copied().map(f).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_from_indices_accepts_three_or_four() {
        assert_eq!(Face::from_indices(&[0, 1, 2]), Some(Face::Triangle([0, 1, 2])));
        assert_eq!(
            Face::from_indices(&[0, 1, 2, 3]),
            Some(Face::Quad([0, 1, 2, 3]))
        );
        assert_eq!(Face::from_indices(&[0, 1]), None);
        assert_eq!(Face::from_indices(&[0, 1, 2, 3, 4]), None);
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let verts = vec![Point3D::ORIGIN; 3];
        assert!(Face::Triangle([0, 1, 2]).resolve(&verts).is_some());
        assert!(Face::Triangle([0, 1, 3]).resolve(&verts).is_none());
    }

    #[test]
    fn scale_is_anchored_at_origin() {
        let mut mesh = Mesh::new(vec![Point3D::new(1.0, 1.0, 1.0)], Vec::new());
        mesh.scale(2.0, 3.0, 4.0);
        assert_eq!(mesh.vertices[0], Point3D::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn translate_moves_every_vertex() {
        let mut mesh = Mesh::ground_plane(0.0, 1.0);
        mesh.translate(0.0, 2.0, 0.0);
        assert!(mesh.vertices.iter().all(|v| v.y == 2.0));
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn ground_plane_corners() {
        let mesh = Mesh::ground_plane(-1.0, 10.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.vertices[0], Point3D::new(-10.0, -1.0, 10.0));
        assert_eq!(mesh.vertices[2], Point3D::new(10.0, -1.0, -10.0));
    }
}
