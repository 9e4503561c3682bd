//! Locates, parses, and validates the configuration file.

use std::env;
use std::fs;
use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "STEVEDORE_CONFIG";

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("stevedore.toml"),
        PathBuf::from("config/stevedore.toml"),
    ]
});

/// Configuration file loader with flag, environment, and default-path
/// resolution, in that order.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    explicit: Option<PathBuf>,
}

/// A parsed and validated configuration plus its source path.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    /// The validated settings document.
    pub settings: Settings,
    /// Path the settings were read from.
    pub path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader with no explicit path override.
    #[must_use]
    pub const fn new() -> Self {
        Self { explicit: None }
    }

    /// Use an explicit configuration path, bypassing env and defaults.
    #[must_use]
    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Resolve, read, parse, and validate the configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] or [`ConfigError::NotFound`] when no
    /// file can be resolved, [`ConfigError::Io`]/[`ConfigError::Parse`] when
    /// reading or decoding fails, and [`ConfigError::InvalidField`] when the
    /// document violates a cross-field invariant.
    pub fn load(&self) -> ConfigResult<LoadedSettings> {
        let path = self.resolve_path()?;
        let contents = fs::read_to_string(&path).map_err(|err| ConfigError::Io {
            operation: "read_config",
            path: path.clone(),
            source: err,
        })?;
        let settings: Settings = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.clone(),
            source: err,
        })?;
        settings.validate()?;
        Ok(LoadedSettings { settings, path })
    }

    fn resolve_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.explicit {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ConfigError::Missing { path: path.clone() });
        }
        if let Ok(value) = env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(value);
            if path.exists() {
                return Ok(path);
            }
            return Err(ConfigError::Missing { path });
        }
        DEFAULT_CONFIG_LOCATIONS
            .iter()
            .find(|candidate| candidate.exists())
            .cloned()
            .ok_or(ConfigError::NotFound)
    }
}
