//! Text mesh format support.
//!
//! A small, forgiving subset of Wavefront OBJ:
//!
//! - `v <x> <y> <z>` defines a vertex. Tokens that are missing or not numbers
//!   become `NaN` and the vertex is kept.
//! - `f <i>[/…] <i>[/…] <i>[/…] …` defines a face. Indices are 1-based (or
//!   negative, counting back from the latest vertex); `/attr` suffixes are
//!   ignored. Quads stay quads, larger polygons are fan-triangulated.
//! - Every other line is ignored.
//!
//! Faces that cannot be used are dropped and listed in the `LoadReport`;
//! parsing itself never fails.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{MeshError, MeshResult};
use crate::math::Point3D;

use super::{Face, Mesh};

/// A parsed mesh plus the faces that had to be left out.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub mesh: Mesh,
    pub skipped: Vec<SkippedFace>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFace {
    /// 1-based source line.
    pub line: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    TooFewCorners(usize),
    BadIndex(String),
    OutOfRange { index: usize, vertex_count: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewCorners(n) => write!(f, "face has {n} corners, need at least 3"),
            SkipReason::BadIndex(tok) => write!(f, "unusable vertex index {tok:?}"),
            SkipReason::OutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "vertex index {} is past the last vertex ({vertex_count} defined)",
                index + 1
            ),
        }
    }
}

/// Load and parse a mesh file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not UTF-8. Content
/// problems are reported through `LoadReport::skipped` instead.
pub fn load_obj<P: AsRef<Path>>(path: P) -> MeshResult<LoadReport> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MeshError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MeshError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let text = String::from_utf8(bytes).map_err(|_| MeshError::NotUtf8 {
        path: path.to_path_buf(),
    })?;
    Ok(parse_obj(&text))
}

/// Parse mesh source text.
pub fn parse_obj(text: &str) -> LoadReport {
    let mut vertices = Vec::new();
    // (source line, corner indices), range-checked once every vertex is known.
    let mut pending: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut skipped = Vec::new();

    for (n, raw) in text.lines().enumerate() {
        let line_no = n + 1;
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("v") => vertices.push(parse_vertex(tokens)),
            Some("f") => match parse_face(tokens, vertices.len()) {
                Ok(corners) if corners.len() < 3 => skipped.push(SkippedFace {
                    line: line_no,
                    reason: SkipReason::TooFewCorners(corners.len()),
                }),
                Ok(corners) => pending.push((line_no, corners)),
                Err(reason) => skipped.push(SkippedFace {
                    line: line_no,
                    reason,
                }),
            },
            _ => {}
        }
    }

    let vertex_count = vertices.len();
    let mut faces = Vec::with_capacity(pending.len());
    for (line, corners) in pending {
        if let Some(&index) = corners.iter().find(|&&i| i >= vertex_count) {
            skipped.push(SkippedFace {
                line,
                reason: SkipReason::OutOfRange {
                    index,
                    vertex_count,
                },
            });
            continue;
        }
        faces.extend(split_polygon(&corners));
    }

    skipped.sort_by_key(|s| s.line);
    for s in &skipped {
        warn!(line = s.line, "dropping face: {}", s.reason);
    }
    debug!(
        vertices = vertex_count,
        faces = faces.len(),
        skipped = skipped.len(),
        "parsed mesh source"
    );

    LoadReport {
        mesh: Mesh::new(vertices, faces),
        skipped,
    }
}

fn parse_vertex<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Point3D {
    let mut next = || {
        tokens
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    };
    let x = next();
    let y = next();
    let z = next();
    Point3D::new(x, y, z)
}

/// Resolve face tokens to zero-based indices. `seen` is the number of
/// vertices defined so far, which anchors negative (relative) indices.
fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    seen: usize,
) -> Result<Vec<usize>, SkipReason> {
    tokens
        .map(|tok| {
            let head = tok.split('/').next().unwrap_or_default();
            let bad = || SkipReason::BadIndex(tok.to_string());
            let index: i64 = head.parse().map_err(|_| bad())?;
            match index {
                0 => Err(bad()),
                i if i > 0 => usize::try_from(i - 1).map_err(|_| bad()),
                i => {
                    let back = usize::try_from(i.unsigned_abs()).map_err(|_| bad())?;
                    seen.checked_sub(back).ok_or_else(bad)
                }
            }
        })
        .collect()
}

/// Keep triangles and quads as they are; fan anything larger into triangles.
fn split_polygon(corners: &[usize]) -> Vec<Face> {
    if let Some(face) = Face::from_indices(corners) {
        return vec![face];
    }
    (1..corners.len() - 1)
        .map(|i| Face::Triangle([corners[0], corners[i], corners[i + 1]]))
        .collect()
}
