//! Application-level errors and their process exit codes.
//!
//! Usage and configuration mistakes exit with `2`; runtime failures exit
//! with `3`.

use stevedore_config::ConfigError;
use stevedore_qbit::ClientError;
use stevedore_sweep::SweepError;
use thiserror::Error;

/// Convenience alias for application results.
pub type AppResult<T> = Result<T, AppError>;

/// Failures surfaced by the `stevedore` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration could not be loaded or failed validation.
    #[error("configuration error")]
    Config {
        /// Underlying configuration failure.
        #[from]
        source: ConfigError,
    },
    /// A command argument referenced something the configuration does not
    /// define.
    #[error("{message}")]
    Usage {
        /// Human-readable description of the mistake.
        message: String,
    },
    /// The download client rejected or failed a call.
    #[error("download client error")]
    Client {
        /// Underlying client failure.
        #[from]
        source: ClientError,
    },
    /// A reconciliation or share-limit pass failed.
    #[error("pipeline error")]
    Sweep {
        /// Underlying pass failure.
        #[from]
        source: SweepError,
    },
    /// The filesystem watcher could not be started.
    #[error("watcher {operation} failed")]
    Watch {
        /// Short verb describing the watcher call.
        operation: &'static str,
        /// Underlying watcher failure.
        #[source]
        source: notify::Error,
    },
    /// The tracing subscriber could not be installed.
    #[error("failed to install tracing subscriber: {message}")]
    Logging {
        /// Subscriber error rendered as text.
        message: String,
    },
}

impl AppError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub(crate) const fn watch(operation: &'static str, source: notify::Error) -> Self {
        Self::Watch { operation, source }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Usage { .. } => 2,
            Self::Client { .. } | Self::Sweep { .. } | Self::Watch { .. } | Self::Logging { .. } => {
                3
            }
        }
    }

    /// Render the error with its source chain on one line.
    #[must_use]
    pub fn render(&self) -> String {
        use std::error::Error as _;
        use std::fmt::Write as _;

        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(message, ": {cause}");
            source = cause.source();
        }
        message
    }
}
