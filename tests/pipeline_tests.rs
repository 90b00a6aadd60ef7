use std::time::Instant;

use ascii3d::camera::{Camera, Projection};
use ascii3d::config::ViewerConfig;
use ascii3d::engine::visibility::prepare_faces;
use ascii3d::engine::{draw_mesh, AnimationConfig, Engine, RenderSettings};
use ascii3d::math::Point3D;
use ascii3d::mesh::loader::MeshSlot;
use ascii3d::mesh::obj::{parse_obj, SkipReason};
use ascii3d::mesh::{Face, Mesh};
use ascii3d::types::GridSize;

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    /// Camera sitting at the origin looking straight down -Z.
    fn straight_camera() -> Camera {
        Camera {
            yaw: 0.0,
            pitch: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 0.0,
        }
    }

    fn triangle_at(z: f64) -> [Point3D; 3] {
        [
            Point3D::new(-1.0, 0.0, z),
            Point3D::new(1.0, 0.0, z),
            Point3D::new(0.0, 1.0, z),
        ]
    }

    fn still_config() -> ViewerConfig {
        let mut config = ViewerConfig::default();
        config.animation = AnimationConfig {
            spin_per_frame: 0.0,
            scripted_scale: None,
        };
        config
    }

    #[test]
    fn test_origin_projects_to_grid_centre() {
        let projection = Projection::new(GridSize::new(80, 40), 0.5);
        let p = projection
            .project(Point3D::ORIGIN, &straight_camera())
            .unwrap();
        assert_eq!((p.x, p.y), (40, 20));
    }

    #[test]
    fn test_faces_sorted_far_to_near() {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for z in [1.0, 5.0, 3.0] {
            let base = vertices.len();
            vertices.extend(triangle_at(z));
            faces.push(Face::Triangle([base, base + 1, base + 2]));
        }

        let (prepared, stats) = prepare_faces(&faces, &vertices, Point3D::ORIGIN, false);
        let order: Vec<f64> = prepared.iter().map(|f| f.centroid.z.round()).collect();
        assert_eq!(order, vec![5.0, 3.0, 1.0]);
        assert_eq!(stats.culled, 0);
    }

    #[test]
    fn test_backface_culling_follows_toggle() {
        let vertices = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        ];
        let facing = Face::Triangle([0, 1, 2]);
        let away = Face::Triangle([0, 2, 1]);
        let anchor = Point3D::new(0.0, 0.0, 10.0);
        let faces = vec![facing, away];

        let (kept, stats) = prepare_faces(&faces, &vertices, anchor, true);
        assert_eq!(kept.len(), 1);
        assert_eq!(stats.culled, 1);
        assert_eq!(kept[0].corners[1], Point3D::new(1.0, 0.0, 0.0));

        let (kept, stats) = prepare_faces(&faces, &vertices, anchor, false);
        assert_eq!(kept.len(), 2);
        assert_eq!(stats.culled, 0);
    }

    #[test]
    fn test_out_of_range_face_is_dropped_at_load() {
        let report = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nf 1 2 9\n");
        assert_eq!(report.mesh.faces.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 5);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::OutOfRange {
                index: 8,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn test_unresolved_face_is_skipped_while_others_draw() {
        let mesh = Mesh::new(
            triangle_at(0.0).to_vec(),
            vec![Face::Triangle([0, 1, 2]), Face::Triangle([0, 1, 7])],
        );
        let mut buffer = ascii3d::renderer::FrameBuffer::new(GridSize::new(20, 20));
        let config = ViewerConfig::default();

        let stats = draw_mesh(
            &mut buffer,
            &mesh,
            &straight_camera(),
            &Projection::new(GridSize::new(20, 20), 1.0),
            &RenderSettings::default(),
            &config.glyphs,
        );

        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.unresolved, 1);
        assert!(buffer.lines().iter().any(|row| row.contains('@')));
    }

    #[test]
    fn test_depth_test_keeps_outline_of_tilted_face() {
        let mesh = Mesh::new(
            vec![
                Point3D::new(-0.4, -0.4, 0.5),
                Point3D::new(0.4, -0.3, -1.5),
                Point3D::new(0.0, 0.45, -3.0),
            ],
            vec![Face::Triangle([0, 1, 2])],
        );
        let config = ViewerConfig::default();
        let projection = Projection::new(GridSize::new(40, 40), 1.0);
        let render = |depth_test: bool| {
            let mut buffer = ascii3d::renderer::FrameBuffer::new(GridSize::new(40, 40));
            buffer.depth_test = depth_test;
            let stats = draw_mesh(
                &mut buffer,
                &mesh,
                &straight_camera(),
                &projection,
                &RenderSettings::default(),
                &config.glyphs,
            );
            assert_eq!(stats.drawn, 1);
            buffer.lines()
        };

        let tested = render(true);
        assert!(tested.iter().any(|row| row.contains('@')));
        assert_eq!(tested, render(false));
    }

    #[test]
    fn test_engine_draws_ground_while_mesh_is_missing() {
        let mut engine = Engine::new(&still_config(), GridSize::new(80, 40));
        engine.add_mesh(MeshSlot::empty("pending"));

        let frame = engine.render_frame(Instant::now());
        assert!(frame.lines().iter().any(|row| row.contains('.')));
        assert_eq!(engine.frame_count(), 1);
        assert_eq!(engine.diagnostics().stats.drawn, 0);
    }

    #[test]
    fn test_engine_without_ground_renders_blank() {
        let mut config = still_config();
        config.render.show_ground = false;
        let mut engine = Engine::new(&config, GridSize::new(20, 10));

        let frame = engine.render_frame(Instant::now());
        assert!(frame.lines().iter().all(|row| row.trim().is_empty()));
    }

    #[test]
    fn test_engine_resize_changes_grid() {
        let mut engine = Engine::new(&still_config(), GridSize::new(20, 10));
        engine.resize(GridSize::new(30, 12));
        let frame = engine.render_frame(Instant::now());
        assert_eq!(frame.size(), GridSize::new(30, 12));
        assert_eq!(frame.lines().len(), 12);
        assert!(frame.lines().iter().all(|row| row.chars().count() == 30));
    }
}
