//! Move error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a move.
///
/// Files moved before the error stay where they were moved to.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("{path} is not inside {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("{path} has no file name")]
    NoFileName { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MoveError {
    /// Create an error from an I/O error, singling out existing destinations.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::AlreadyExists => Self::DestinationExists { path },
            _ => Self::Io { path, source },
        }
    }
}
