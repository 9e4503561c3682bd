//! Error taxonomy for the pipeline.

use std::path::{Path, PathBuf};

use stevedore_qbit::ClientError;
use thiserror::Error;

/// Convenience alias for pipeline results.
pub type SweepResult<T> = Result<T, SweepError>;

/// Failures surfaced by the pipeline.
///
/// Client failures terminate the current pass; filesystem failures are
/// scoped to a single item and logged by the driver.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The download client was unreachable or rejected a call.
    #[error("download client call failed")]
    Client {
        /// Underlying client error.
        #[from]
        source: ClientError,
    },

    /// A filesystem step failed for one path.
    #[error("{operation} failed for {path}")]
    Io {
        /// Dotted pipeline step tag, e.g. `reconcile.copy`.
        operation: &'static str,
        /// Path the step was operating on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Walking a directory tree failed.
    #[error("directory walk failed under {path}")]
    Walk {
        /// Root of the attempted walk.
        path: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// An external command could not be spawned or waited on.
    #[error("failed to run command {command}")]
    Command {
        /// Program name from the configured argument vector.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },
}

impl SweepError {
    pub(crate) fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn walk(path: &Path, source: walkdir::Error) -> Self {
        Self::Walk {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn command(command: &str, source: std::io::Error) -> Self {
        Self::Command {
            command: command.to_string(),
            source,
        }
    }

    /// Whether the failure is scoped to one item's files rather than the
    /// client connection.
    #[must_use]
    pub const fn is_per_item(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Walk { .. })
    }
}
