//! Headless rendering: run the frame loop without a terminal and keep the
//! last grid.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::engine::{Engine, FrameStats};
use crate::types::GridSize;

/// Nominal spacing between headless frames.
pub const FRAME_STEP: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub size: GridSize,
    /// Frames rendered to get here.
    pub frames: u64,
    pub drawn_faces: usize,
    pub rows: Vec<String>,
}

impl Snapshot {
    pub fn text(&self) -> String {
        self.rows.join("\n")
    }
}

/// Render `frames` frames back to back (at least one) and capture the last.
pub fn render_snapshot(engine: &mut Engine, frames: u64) -> Snapshot {
    let start = Instant::now();
    let mut stats = FrameStats::default();
    for i in 0..frames.max(1) {
        let at = start + FRAME_STEP * u32::try_from(i).unwrap_or(u32::MAX);
        engine.render_frame(at);
        stats = engine.diagnostics().stats;
    }
    let buffer = engine.buffer();
    Snapshot {
        size: buffer.size(),
        frames: engine.frame_count(),
        drawn_faces: stats.drawn,
        rows: buffer.lines(),
    }
}
