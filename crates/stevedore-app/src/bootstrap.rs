//! Logging, configuration, and download-client wiring shared by every
//! subcommand.

use std::path::PathBuf;

use stevedore_config::{ConfigLoader, LoadedSettings, Settings};
use stevedore_qbit::QbitClient;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{AppError, AppResult};

/// Default logging filter when `RUST_LOG` is not provided.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Structured single-line JSON records.
    Json,
    /// Human-readable records for interactive runs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Configure and install the global tracing subscriber.
///
/// # Errors
/// Returns [`AppError::Logging`] when another subscriber has already been
/// installed.
pub fn init_logging() -> AppResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false);

    let installed = match LogFormat::infer() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|err| AppError::Logging {
        message: err.to_string(),
    })
}

/// Locate, parse, and validate the configuration file.
///
/// An explicit path wins over the `STEVEDORE_CONFIG` environment variable,
/// which wins over the default search locations.
///
/// # Errors
/// Returns [`AppError::Config`] when no file resolves or the document is
/// invalid.
pub fn load_settings(explicit: Option<PathBuf>) -> AppResult<LoadedSettings> {
    let loader = explicit.map_or_else(ConfigLoader::new, |path| {
        ConfigLoader::new().with_path(path)
    });
    Ok(loader.load()?)
}

/// Authenticate against the configured download client.
///
/// # Errors
/// Returns [`AppError::Client`] when the base URL is malformed or the login
/// is rejected.
pub async fn connect(settings: &Settings) -> AppResult<QbitClient> {
    let client = QbitClient::connect(
        &settings.client.base_url,
        &settings.client.username,
        &settings.client.password,
        settings.client.timeout(),
    )
    .await?;
    info!(url = %settings.client.base_url, "download client session opened");
    Ok(client)
}
