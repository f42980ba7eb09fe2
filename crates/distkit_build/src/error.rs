//! Error types for the build steps

use std::path::PathBuf;
use std::process::ExitStatus;

use distkit_io_fs::MirrorTreeError;
use thiserror::Error;

/// Result type alias for build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Failure of a build step. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The packaging tool could not be started
    #[error("Failed to start packager `{command}`: {source}")]
    PackagerSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The packaging tool ran and reported failure
    #[error("Packager `{command}` failed with {status}")]
    PackagerFailed { command: String, status: ExitStatus },

    /// The packaging tool succeeded but left no artifact behind
    #[error("Artifact not found at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// Directory mirror failure
    #[error(transparent)]
    Mirror(#[from] MirrorTreeError),

    /// Any other filesystem failure
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Create a path-scoped I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
