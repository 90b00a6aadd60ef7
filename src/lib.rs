//! ascii3d: a software 3D renderer that draws polygon meshes onto a
//! character grid.
//!
//! Pipeline, leaf first: `math` → `mesh` → `camera` → `engine::visibility`
//! → `renderer` → `engine` (the frame loop). `player` and `snapshot` are the
//! two ways frames leave the crate: an interactive terminal and a headless
//! text dump.

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod menubar;
pub mod mesh;
pub mod player;
pub mod renderer;
pub mod snapshot;
pub mod types;
