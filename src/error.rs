//! Error types for mesh loading.
//!
//! Only reading the source can fail. Bad content inside a readable file never
//! produces an error: it degrades into NaN geometry or dropped faces.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for mesh loading.
pub type MeshResult<T> = Result<T, MeshError>;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },

    #[error("mesh loader for {path} stopped before publishing a result")]
    LoaderVanished { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_cause_once() {
        let err = MeshError::Read {
            path: PathBuf::from("model.obj"),
            source: std::io::Error::other("disk unplugged"),
        };
        assert_eq!(err.to_string(), "failed to read model.obj");
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches("disk unplugged").count(), 1);
    }
}
