use std::fs;
use std::path::PathBuf;

use ascii3d::config::ViewerConfig;
use ascii3d::engine::Engine;
use ascii3d::error::MeshError;
use ascii3d::mesh::loader::{LoadStatus, MeshSlot};
use ascii3d::snapshot::render_snapshot;
use ascii3d::types::GridSize;

const CUBE: &str = "\
# unit cube
v -1 -1 -1
v  1 -1 -1
v  1  1 -1
v -1  1 -1
v -1 -1  1
v  1 -1  1
v  1  1  1
v -1  1  1
f 1 2 3 4
f 5 8 7 6
f 1 5 6 2
f 2 6 7 3
f 3 7 8 4
f 5 1 4 8
";

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ascii3d-{}-{name}", std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[cfg(test)]
mod snapshot_tests {
    use super::*;

    #[test]
    fn test_snapshot_of_cube() {
        let path = write_temp("cube.obj", CUBE);
        let mut slot = MeshSlot::spawn_load(&path);
        slot.wait().unwrap();
        assert_eq!(slot.status(), LoadStatus::Ready);
        assert_eq!(slot.mesh().unwrap().faces.len(), 6);

        let mut config = ViewerConfig::default();
        config.render.show_ground = false;
        let mut engine = Engine::new(&config, GridSize::new(40, 20));
        engine.add_mesh(slot);

        let shot = render_snapshot(&mut engine, 3);
        assert_eq!(shot.frames, 3);
        assert_eq!(shot.size, GridSize::new(40, 20));
        assert_eq!(shot.rows.len(), 20);
        assert!(shot.rows.iter().all(|r| r.chars().count() == 40));
        assert!(shot.text().contains('@'));
        assert!(shot.drawn_faces > 0);

        let json = serde_json::to_string(&shot).unwrap();
        assert!(json.contains("\"rows\""));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_zero_frames_still_renders_one() {
        let mut engine = Engine::new(&ViewerConfig::default(), GridSize::new(10, 5));
        let shot = render_snapshot(&mut engine, 0);
        assert_eq!(shot.frames, 1);
        assert_eq!(shot.rows.len(), 5);
    }

    #[test]
    fn test_missing_file_fails_and_empties_slot() {
        let mut slot = MeshSlot::spawn_load("/definitely/not/here.obj");
        let err = slot.wait().unwrap_err();
        assert!(matches!(err, MeshError::FileNotFound { .. }));
        assert_eq!(slot.status(), LoadStatus::Empty);
    }
}
