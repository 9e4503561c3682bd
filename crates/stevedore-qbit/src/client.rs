//! The trait seam between the pipeline and the download client.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::model::{Category, RssRuleDef, ShareLimits, Torrent, TorrentFilter, TrackerEntry};

/// Operations the pipeline needs from the external download client.
///
/// Implementations must be safe to share across tasks; all mutating calls
/// are batch-shaped (a set of hashes per call) to match the client's API.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// List tracked items matching `filter`.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or the response
    /// cannot be decoded.
    async fn torrents(&self, filter: TorrentFilter) -> ClientResult<Vec<Torrent>>;

    /// Fetch the tracker list for one item.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or the response
    /// cannot be decoded.
    async fn trackers(&self, hash: &str) -> ClientResult<Vec<TrackerEntry>>;

    /// Delete item records, optionally removing their files on disk.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn delete_torrents(&self, hashes: &[String], delete_files: bool) -> ClientResult<()>;

    /// Add tags to a set of items.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn add_tags(&self, hashes: &[String], tags: &[String]) -> ClientResult<()>;

    /// List configured categories keyed by name.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or the response
    /// cannot be decoded.
    async fn categories(&self) -> ClientResult<BTreeMap<String, Category>>;

    /// Create a category with the given save path.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn create_category(&self, name: &str, save_path: &Path) -> ClientResult<()>;

    /// List the names of configured RSS auto-download rules.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or the response
    /// cannot be decoded.
    async fn rss_rule_names(&self) -> ClientResult<Vec<String>>;

    /// Create or replace the named RSS auto-download rule.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn set_rss_rule(&self, rule_name: &str, rule: &RssRuleDef) -> ClientResult<()>;

    /// Apply ratio/seeding-time share limits to a set of items.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn set_share_limits(&self, hashes: &[String], limits: ShareLimits) -> ClientResult<()>;

    /// Apply an upload speed cap in bytes per second; `-1` lifts the cap.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn set_upload_limit(&self, hashes: &[String], limit: i64) -> ClientResult<()>;

    /// Move a set of items to the top of the download queue.
    ///
    /// # Errors
    /// Returns an error when the client is unreachable or rejects the call.
    async fn top_priority(&self, hashes: &[String]) -> ClientResult<()>;
}
