//! Background mesh loading.
//!
//! A `MeshSlot` moves `Empty → Loading → Ready` (or `Failed`). The loader
//! thread parses into its own buffers and hands the finished mesh over a
//! channel; the frame loop swaps it in with a single assignment in `poll`,
//! so a frame never sees a half-built vertex or face list.

use std::mem;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{error, info};

use crate::error::{MeshError, MeshResult};

use super::obj::{load_obj, LoadReport};
use super::Mesh;

pub enum LoadState {
    Empty,
    Loading {
        path: PathBuf,
        rx: Receiver<MeshResult<LoadReport>>,
    },
    Ready(Mesh),
    Failed(MeshError),
}

/// Payload-free view of a `LoadState`, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Empty,
    Loading,
    Ready,
    Failed,
}

pub struct MeshSlot {
    name: String,
    state: LoadState,
}

impl MeshSlot {
    pub fn empty(name: impl Into<String>) -> Self {
        MeshSlot {
            name: name.into(),
            state: LoadState::Empty,
        }
    }

    pub fn ready(name: impl Into<String>, mesh: Mesh) -> Self {
        MeshSlot {
            name: name.into(),
            state: LoadState::Ready(mesh),
        }
    }

    /// Start loading `path` on a background thread.
    pub fn spawn_load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (tx, rx) = mpsc::channel();
        let job_path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("load-{name}"))
            .spawn(move || {
                // The slot may have been dropped; nothing to report to then.
                let _ = tx.send(load_obj(&job_path));
            });

        let state = match spawned {
            Ok(_) => LoadState::Loading { path, rx },
            Err(e) => LoadState::Failed(MeshError::Read { path, source: e }),
        };
        MeshSlot { name, state }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> LoadStatus {
        match self.state {
            LoadState::Empty => LoadStatus::Empty,
            LoadState::Loading { .. } => LoadStatus::Loading,
            LoadState::Ready(_) => LoadStatus::Ready,
            LoadState::Failed(_) => LoadStatus::Failed,
        }
    }

    /// Publish a finished load, if there is one. Returns `true` when the
    /// slot changed state.
    pub fn poll(&mut self) -> bool {
        let LoadState::Loading { rx, .. } = &self.state else {
            return false;
        };
        let received = match rx.try_recv() {
            Err(TryRecvError::Empty) => return false,
            Ok(result) => result,
            Err(TryRecvError::Disconnected) => Err(MeshError::LoaderVanished {
                path: self.loading_path(),
            }),
        };
        self.publish(received);
        true
    }

    /// Block until the slot leaves `Loading`.
    ///
    /// # Errors
    ///
    /// Returns the load error if the mesh could not be read. The error is
    /// handed to the caller and the slot drops back to `Empty`.
    pub fn wait(&mut self) -> MeshResult<()> {
        if let LoadState::Loading { rx, .. } = &self.state {
            let received = rx.recv().unwrap_or_else(|_| {
                Err(MeshError::LoaderVanished {
                    path: self.loading_path(),
                })
            });
            self.publish(received);
        }
        match mem::replace(&mut self.state, LoadState::Empty) {
            LoadState::Failed(e) => Err(e),
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// The loaded mesh, once the slot is `Ready`.
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.state {
            LoadState::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.state {
            LoadState::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }

    fn loading_path(&self) -> PathBuf {
        match &self.state {
            LoadState::Loading { path, .. } => path.clone(),
            _ => PathBuf::from(&self.name),
        }
    }

    fn publish(&mut self, received: MeshResult<LoadReport>) {
        self.state = match received {
            Ok(report) => {
                info!(
                    mesh = %self.name,
                    vertices = report.mesh.vertices.len(),
                    faces = report.mesh.faces.len(),
                    skipped = report.skipped.len(),
                    "mesh ready"
                );
                LoadState::Ready(report.mesh)
            }
            Err(e) => {
                error!(mesh = %self.name, "mesh load failed: {e}");
                LoadState::Failed(e)
            }
        };
    }
}
