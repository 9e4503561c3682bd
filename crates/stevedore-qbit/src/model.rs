//! Wire-format data carriers for the qBittorrent Web API v2.
//!
//! Serde names mirror the client's JSON and form fields exactly; the only
//! translation applied at this boundary is splitting the comma-separated
//! `tags` string into a tag list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One tracked item as reported by `torrents/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    /// Opaque identifying hash.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Absolute path of the item's file or root directory.
    pub content_path: PathBuf,
    /// Directory the item was saved into.
    pub save_path: PathBuf,
    /// Category label; empty when uncategorized.
    #[serde(default)]
    pub category: String,
    /// Tag list, parsed from the client's comma-separated string.
    #[serde(default, with = "tag_list")]
    pub tags: Vec<String>,
    /// Completion timestamp in Unix seconds.
    pub completion_on: i64,
}

/// Status filter accepted by the `torrents/info` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentFilter {
    /// Items that finished downloading.
    Completed,
    /// Items actively seeding.
    Seeding,
    /// Items actively downloading.
    Downloading,
}

impl TorrentFilter {
    /// The filter's wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Seeding => "seeding",
            Self::Downloading => "downloading",
        }
    }
}

/// One tracker entry as reported by `torrents/trackers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerEntry {
    /// Announce URL; the client prefixes virtual entries (DHT, PeX) with `**`.
    pub url: String,
    /// Status message attached to the entry.
    #[serde(default)]
    pub msg: String,
}

/// One category as reported by `torrents/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Category name.
    pub name: String,
    /// Save path associated with the category.
    #[serde(rename = "savePath")]
    pub save_path: PathBuf,
}

/// RSS auto-download rule definition for `rss/setRule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssRuleDef {
    /// Whether the rule is active.
    pub enabled: bool,
    /// Pattern a title must contain.
    pub must_contain: String,
    /// Pattern a title must not contain.
    pub must_not_contain: String,
    /// Interpret patterns as regular expressions.
    pub use_regex: bool,
    /// Episode filter expression.
    pub episode_filter: String,
    /// Enable the smart episode filter.
    pub smart_filter: bool,
    /// Episodes already matched by this rule.
    pub previously_matched_episodes: Vec<String>,
    /// RSS feed URLs the rule applies to.
    pub affected_feeds: Vec<String>,
    /// Ignore matches published within this many days of the last one.
    pub ignore_days: i64,
    /// Timestamp of the rule's last match, empty when never matched.
    pub last_match: String,
    /// Add matched torrents in the paused state.
    pub add_paused: bool,
    /// Category assigned to matched torrents.
    pub assigned_category: String,
    /// Save path assigned to matched torrents.
    pub save_path: String,
}

/// Ratio and seeding-time limits for `torrents/setShareLimits`.
///
/// `-2` defers to the client's global default and `-1` means unlimited, per
/// the client's conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareLimits {
    /// Share ratio limit.
    pub ratio_limit: f64,
    /// Seeding time limit in minutes.
    pub seeding_time_limit: i64,
}

pub(crate) fn join_hashes(hashes: &[String]) -> String {
    hashes.join("|")
}

pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

mod tag_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&tags.join(", "))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(super::parse_tags(&raw))
    }
}
