//! Visibility: which faces to draw, and in what order.
//!
//! Faces are ordered far-to-near by the distance from the camera anchor to
//! their centroid (painter's algorithm), optionally dropping faces that
//! point away from the camera.

use crate::math::Point3D;
use crate::mesh::Face;

/// A face resolved against view-space vertices, ready for projection.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFace {
    pub corners: Vec<Point3D>,
    pub centroid: Point3D,
    /// Distance from the camera anchor to `centroid`.
    pub distance: f64,
}

/// Counts of faces left out of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityStats {
    /// Faces whose indices did not resolve.
    pub unresolved: usize,
    pub culled: usize,
}

pub fn centroid(points: &[Point3D]) -> Point3D {
    let sum = points.iter().fold(Point3D::ORIGIN, |acc, &p| acc + p);
    sum.scale(1.0 / points.len() as f64)
}

/// Normal from the two edges leaving the first corner.
pub fn normal(points: &[Point3D]) -> Point3D {
    let edge1 = points[1] - points[0];
    let edge2 = points[2] - points[0];
    edge1.cross(edge2)
}

/// True when the face points away from `anchor`.
pub fn is_back_facing(points: &[Point3D], centroid: Point3D, anchor: Point3D) -> bool {
    let camera_to_face = centroid - anchor;
    normal(points).dot(camera_to_face) >= 0.0
}

/// Stable descending sort on distance; equal distances keep their order.
pub fn sort_far_to_near(faces: &mut [PreparedFace]) {
    faces.sort_by(|a, b| b.distance.total_cmp(&a.distance));
}

/// Resolve, cull and sort `faces` against view-space `vertices`.
pub fn prepare_faces(
    faces: &[Face],
    vertices: &[Point3D],
    anchor: Point3D,
    cull_backfaces: bool,
) -> (Vec<PreparedFace>, VisibilityStats) {
    let mut stats = VisibilityStats::default();
    let mut prepared = Vec::with_capacity(faces.len());

    for face in faces {
        let Some(corners) = face.resolve(vertices) else {
            stats.unresolved += 1;
            continue;
        };
        let centroid = centroid(&corners);
        if cull_backfaces && is_back_facing(&corners, centroid, anchor) {
            stats.culled += 1;
            continue;
        }
        prepared.push(PreparedFace {
            distance: anchor.distance(centroid),
            corners,
            centroid,
        });
    }

    sort_far_to_near(&mut prepared);
    (prepared, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_quad() {
        let pts = [
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
            Point3D::new(2.0, 2.0, 0.0),
            Point3D::new(0.0, 2.0, 0.0),
        ];
        assert_eq!(centroid(&pts), Point3D::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn unresolved_faces_are_counted_not_fatal() {
        let verts = vec![Point3D::ORIGIN; 3];
        let faces = vec![Face::Triangle([0, 1, 2]), Face::Triangle([0, 1, 7])];
        let (out, stats) = prepare_faces(&faces, &verts, Point3D::ORIGIN, false);
        assert_eq!(out.len(), 1);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn equal_distances_keep_insertion_order() {
        let face = |x: f64, d: f64| PreparedFace {
            corners: Vec::new(),
            centroid: Point3D::new(x, 0.0, 0.0),
            distance: d,
        };
        let mut faces = vec![face(1.0, 2.0), face(2.0, 2.0), face(3.0, 4.0)];
        sort_far_to_near(&mut faces);
        let xs: Vec<f64> = faces.iter().map(|f| f.centroid.x).collect();
        assert_eq!(xs, vec![3.0, 1.0, 2.0]);
    }
}
