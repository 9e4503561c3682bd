//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers deserialized once at startup and shared read-only.
//! - Validation runs at load time so the pipeline can trust the invariants
//!   (unique genre target directories, absolute paths) without re-checking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Name of the share-limit group applied when nothing else matches.
pub const DEFAULT_LIMIT_GROUP: &str = "default";

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Connection details for the external download client.
    pub client: ClientSettings,
    /// Trigger and timing knobs for the daemon.
    pub watch: WatchSettings,
    /// Optional external library rescan command.
    #[serde(default)]
    pub rescan: Option<RescanSettings>,
    /// Post-processing profiles keyed by genre name.
    pub genres: BTreeMap<String, GenreProfile>,
    /// Share-limit groups keyed by group name.
    #[serde(default)]
    pub limits: BTreeMap<String, LimitGroup>,
}

/// Connection details for the qBittorrent Web API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the Web API, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Username presented to the login endpoint.
    pub username: String,
    /// Password presented to the login endpoint.
    pub password: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientSettings {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trigger and timing configuration for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Directory the client writes in-progress downloads to.
    pub incomplete_dir: PathBuf,
    /// Delay between a download starting and the share-limit pass.
    #[serde(default = "default_limits_settle_secs")]
    pub limits_settle_secs: u64,
    /// Delay between a download finishing and the reconciliation pass.
    #[serde(default = "default_sweep_settle_secs")]
    pub sweep_settle_secs: u64,
    /// Interval between unconditional timer-driven sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Completions younger than this many seconds are skipped for one pass.
    #[serde(default = "default_ignore_age_secs")]
    pub ignore_age_secs: u64,
}

impl WatchSettings {
    /// Settle delay before a share-limit pass.
    #[must_use]
    pub const fn limits_settle(&self) -> Duration {
        Duration::from_secs(self.limits_settle_secs)
    }

    /// Settle delay before an event-driven sweep.
    #[must_use]
    pub const fn sweep_settle(&self) -> Duration {
        Duration::from_secs(self.sweep_settle_secs)
    }

    /// Interval between timer-driven sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Age below which a completion is deferred to a later pass.
    #[must_use]
    pub const fn ignore_age(&self) -> Duration {
        Duration::from_secs(self.ignore_age_secs)
    }
}

/// External library rescan command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescanSettings {
    /// Argument vector of the rescan command; first element is the program.
    pub command: Vec<String>,
    /// Output marker meaning the library was already current; when unset the
    /// process exit status classifies the outcome instead.
    #[serde(default)]
    pub up_to_date_marker: Option<String>,
}

/// Post-processing profile for one genre of completed download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreProfile {
    /// Directory completed files are reconciled into.
    pub target_dir: PathBuf,
    /// Preserve the source directory layout instead of flattening.
    pub preserve_structure: bool,
    /// File extensions retained during reconciliation; empty keeps all.
    #[serde(default)]
    pub keep_extensions: Vec<String>,
    /// Whether completions in this genre trigger a library rescan.
    #[serde(default)]
    pub scan_library: bool,
    /// Delete the item record from the client instead of tagging it.
    #[serde(default)]
    pub delete_from_client: bool,
    /// Command spawned after the terminal client mutation, if any.
    #[serde(default)]
    pub on_done: Option<Vec<String>>,
    /// Template for provisioning RSS auto-download rules.
    #[serde(default)]
    pub rss: Option<RssTemplate>,
}

/// Genre-level template for qBittorrent RSS auto-download rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssTemplate {
    /// Pattern appended after the series name in the rule's must-contain.
    #[serde(default)]
    pub must_contain_suffix: String,
    /// Exclusion pattern forwarded verbatim; empty disables it.
    #[serde(default)]
    pub must_not_contain: String,
    /// RSS feed URLs the rule applies to.
    pub affected_feeds: Vec<String>,
    /// Save path override for matched items; defaults to a per-name
    /// subdirectory of the genre target.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
    /// Interpret patterns as regular expressions.
    #[serde(default)]
    pub use_regex: bool,
    /// Episode filter expression forwarded verbatim.
    #[serde(default)]
    pub episode_filter: String,
    /// Enable the client's smart episode filter.
    #[serde(default)]
    pub smart_filter: bool,
    /// Add matched torrents in the paused state.
    #[serde(default)]
    pub add_paused: bool,
    /// Ignore matches older than this many days; `0` disables the window.
    #[serde(default)]
    pub ignore_days: i64,
}

/// Share-limit profile applied to not-yet-tagged downloading items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitGroup {
    /// Substrings matched against announce URLs.
    #[serde(default)]
    pub tracker_contains: Vec<String>,
    /// Category labels matched exactly.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Share ratio limit; `-2` defers to the client default, `-1` is
    /// unlimited.
    #[serde(default = "default_share_ratio")]
    pub ratio_limit: f64,
    /// Seeding time limit in minutes; `-2`/`-1` as for `ratio_limit`.
    #[serde(default = "default_share_minutes")]
    pub seeding_time_limit: i64,
    /// Upload speed cap in bytes per second; `-1` is unlimited.
    #[serde(default = "default_upload_limit")]
    pub upload_limit: i64,
    /// Tags applied to items claimed by this group.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Promote claimed items to the top of the queue.
    #[serde(default)]
    pub top_priority: bool,
}

impl Settings {
    /// Check the cross-field invariants the pipeline relies on.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidField`] describing the first violated
    /// constraint.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.client.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("client", "base_url", "must not be empty"));
        }
        Url::parse(&self.client.base_url).map_err(|err| {
            ConfigError::invalid("client", "base_url", format!("not a valid URL: {err}"))
        })?;

        if self.genres.is_empty() {
            return Err(ConfigError::invalid(
                "genres",
                "genres",
                "at least one genre must be configured",
            ));
        }

        let mut seen_targets: BTreeMap<&Path, &str> = BTreeMap::new();
        for (name, genre) in &self.genres {
            let section = format!("genres.{name}");
            if !genre.target_dir.is_absolute() {
                return Err(ConfigError::invalid(
                    &section,
                    "target_dir",
                    "must be an absolute path",
                ));
            }
            if let Some(previous) = seen_targets.insert(genre.target_dir.as_path(), name) {
                return Err(ConfigError::invalid(
                    &section,
                    "target_dir",
                    format!("duplicates the target directory of genre '{previous}'"),
                ));
            }
            for extension in &genre.keep_extensions {
                if !extension.starts_with('.') || extension.len() < 2 {
                    return Err(ConfigError::invalid(
                        &section,
                        "keep_extensions",
                        format!("'{extension}' must start with a dot"),
                    ));
                }
            }
            if genre.on_done.as_ref().is_some_and(Vec::is_empty) {
                return Err(ConfigError::invalid(
                    &section,
                    "on_done",
                    "command vector must not be empty",
                ));
            }
        }

        if self.genres.values().any(|genre| genre.scan_library)
            && self
                .rescan
                .as_ref()
                .is_none_or(|rescan| rescan.command.is_empty())
        {
            return Err(ConfigError::invalid(
                "rescan",
                "command",
                "required because at least one genre sets scan_library",
            ));
        }

        self.validate_limits()
    }

    fn validate_limits(&self) -> ConfigResult<()> {
        if self.limits.is_empty() {
            return Ok(());
        }
        if !self.limits.contains_key(DEFAULT_LIMIT_GROUP) {
            return Err(ConfigError::invalid(
                "limits",
                DEFAULT_LIMIT_GROUP,
                "a fallback group is required when any limit group is configured",
            ));
        }
        for (name, group) in &self.limits {
            let section = format!("limits.{name}");
            if name != DEFAULT_LIMIT_GROUP
                && group.tracker_contains.is_empty()
                && group.categories.is_empty()
            {
                return Err(ConfigError::invalid(
                    &section,
                    "tracker_contains",
                    "non-default groups need tracker or category match terms",
                ));
            }
            if group.ratio_limit < -2.0 {
                return Err(ConfigError::invalid(
                    &section,
                    "ratio_limit",
                    "must be -2, -1, or a non-negative ratio",
                ));
            }
            if group.seeding_time_limit < -2 {
                return Err(ConfigError::invalid(
                    &section,
                    "seeding_time_limit",
                    "must be -2, -1, or a non-negative number of minutes",
                ));
            }
            if group.upload_limit < -1 {
                return Err(ConfigError::invalid(
                    &section,
                    "upload_limit",
                    "must be -1 or a non-negative byte rate",
                ));
            }
            // Tags are how claimed items are recognized on later passes.
            if group.tags.is_empty() {
                return Err(ConfigError::invalid(
                    &section,
                    "tags",
                    "at least one tag is required to mark claimed items",
                ));
            }
        }
        Ok(())
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_limits_settle_secs() -> u64 {
    3
}

const fn default_sweep_settle_secs() -> u64 {
    30
}

const fn default_sweep_interval_secs() -> u64 {
    900
}

const fn default_ignore_age_secs() -> u64 {
    120
}

const fn default_share_ratio() -> f64 {
    -2.0
}

const fn default_share_minutes() -> i64 {
    -2
}

const fn default_upload_limit() -> i64 {
    -1
}
