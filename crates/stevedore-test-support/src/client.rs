//! A scripted, in-memory [`DownloadClient`] for pipeline tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::StatusCode;
use stevedore_qbit::{
    Category, ClientError, ClientResult, DownloadClient, RssRuleDef, ShareLimits, Torrent,
    TorrentFilter, TrackerEntry,
};
use tokio::sync::RwLock;

/// Fake download client seeded with snapshots and recording every mutation.
///
/// Tag additions and deletions are applied back to the seeded snapshots so a
/// second pass over the same client observes the first pass's effects, which
/// is what the idempotence tests rely on.
#[derive(Default)]
pub struct ScriptedClient {
    completed: RwLock<Vec<Torrent>>,
    seeding: RwLock<Vec<Torrent>>,
    downloading: RwLock<Vec<Torrent>>,
    trackers: RwLock<BTreeMap<String, Vec<TrackerEntry>>>,
    categories: RwLock<BTreeMap<String, Category>>,
    rule_names: RwLock<Vec<String>>,
    added_tags: RwLock<Vec<(Vec<String>, Vec<String>)>>,
    deleted: RwLock<Vec<(Vec<String>, bool)>>,
    created_categories: RwLock<Vec<(String, PathBuf)>>,
    rules: RwLock<Vec<(String, RssRuleDef)>>,
    share_limits: RwLock<Vec<(Vec<String>, ShareLimits)>>,
    upload_limits: RwLock<Vec<(Vec<String>, i64)>>,
    promoted: RwLock<Vec<Vec<String>>>,
    fail_on: RwLock<Option<String>>,
}

impl ScriptedClient {
    /// Create an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the completed-filter snapshot.
    #[must_use]
    pub fn with_completed(mut self, torrents: Vec<Torrent>) -> Self {
        *self.completed.get_mut() = torrents;
        self
    }

    /// Seed the seeding-filter snapshot.
    #[must_use]
    pub fn with_seeding(mut self, torrents: Vec<Torrent>) -> Self {
        *self.seeding.get_mut() = torrents;
        self
    }

    /// Seed the downloading-filter snapshot.
    #[must_use]
    pub fn with_downloading(mut self, torrents: Vec<Torrent>) -> Self {
        *self.downloading.get_mut() = torrents;
        self
    }

    /// Seed the tracker list returned for `hash`.
    #[must_use]
    pub fn with_trackers(mut self, hash: &str, trackers: Vec<TrackerEntry>) -> Self {
        self.trackers.get_mut().insert(hash.to_string(), trackers);
        self
    }

    /// Seed an existing category.
    #[must_use]
    pub fn with_category(mut self, name: &str, save_path: &Path) -> Self {
        self.categories.get_mut().insert(
            name.to_string(),
            Category {
                name: name.to_string(),
                save_path: save_path.to_path_buf(),
            },
        );
        self
    }

    /// Seed an existing RSS auto-download rule name.
    #[must_use]
    pub fn with_rss_rule(mut self, name: &str) -> Self {
        self.rule_names.get_mut().push(name.to_string());
        self
    }

    /// Make the named operation fail with a scripted status error; `"*"`
    /// fails every operation.
    pub async fn fail_on(&self, operation: &str) {
        *self.fail_on.write().await = Some(operation.to_string());
    }

    /// Recorded `add_tags` calls in invocation order.
    pub async fn added_tags(&self) -> Vec<(Vec<String>, Vec<String>)> {
        self.added_tags.read().await.clone()
    }

    /// Recorded `delete_torrents` calls in invocation order.
    pub async fn deleted(&self) -> Vec<(Vec<String>, bool)> {
        self.deleted.read().await.clone()
    }

    /// Recorded `create_category` calls in invocation order.
    pub async fn created_categories(&self) -> Vec<(String, PathBuf)> {
        self.created_categories.read().await.clone()
    }

    /// Recorded `set_rss_rule` calls in invocation order.
    pub async fn rules(&self) -> Vec<(String, RssRuleDef)> {
        self.rules.read().await.clone()
    }

    /// Recorded `set_share_limits` calls in invocation order.
    pub async fn share_limits(&self) -> Vec<(Vec<String>, ShareLimits)> {
        self.share_limits.read().await.clone()
    }

    /// Recorded `set_upload_limit` calls in invocation order.
    pub async fn upload_limits(&self) -> Vec<(Vec<String>, i64)> {
        self.upload_limits.read().await.clone()
    }

    /// Recorded `top_priority` calls in invocation order.
    pub async fn promoted(&self) -> Vec<Vec<String>> {
        self.promoted.read().await.clone()
    }

    /// Current tag set of the item with `hash`, searching every snapshot.
    pub async fn tags_of(&self, hash: &str) -> Option<Vec<String>> {
        for snapshot in [&self.completed, &self.seeding, &self.downloading] {
            let guard = snapshot.read().await;
            if let Some(torrent) = guard.iter().find(|torrent| torrent.hash == hash) {
                return Some(torrent.tags.clone());
            }
        }
        None
    }

    async fn check(&self, operation: &str) -> ClientResult<()> {
        let fail_on = self.fail_on.read().await;
        match fail_on.as_deref() {
            Some(pattern) if pattern == "*" || pattern == operation => {
                Err(ClientError::Status {
                    endpoint: "scripted",
                    status: StatusCode::SERVICE_UNAVAILABLE,
                })
            }
            _ => Ok(()),
        }
    }

    async fn apply_tags(&self, hashes: &[String], tags: &[String]) {
        for snapshot in [&self.completed, &self.seeding, &self.downloading] {
            let mut guard = snapshot.write().await;
            for torrent in guard
                .iter_mut()
                .filter(|torrent| hashes.contains(&torrent.hash))
            {
                for tag in tags {
                    if !torrent.tags.contains(tag) {
                        torrent.tags.push(tag.clone());
                    }
                }
            }
        }
    }

    async fn remove_hashes(&self, hashes: &[String]) {
        for snapshot in [&self.completed, &self.seeding, &self.downloading] {
            snapshot
                .write()
                .await
                .retain(|torrent| !hashes.contains(&torrent.hash));
        }
    }
}

#[async_trait]
impl DownloadClient for ScriptedClient {
    async fn torrents(&self, filter: TorrentFilter) -> ClientResult<Vec<Torrent>> {
        self.check("torrents").await?;
        let snapshot = match filter {
            TorrentFilter::Completed => &self.completed,
            TorrentFilter::Seeding => &self.seeding,
            TorrentFilter::Downloading => &self.downloading,
        };
        Ok(snapshot.read().await.clone())
    }

    async fn trackers(&self, hash: &str) -> ClientResult<Vec<TrackerEntry>> {
        self.check("trackers").await?;
        Ok(self
            .trackers
            .read()
            .await
            .get(hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_torrents(&self, hashes: &[String], delete_files: bool) -> ClientResult<()> {
        self.check("delete_torrents").await?;
        self.deleted
            .write()
            .await
            .push((hashes.to_vec(), delete_files));
        self.remove_hashes(hashes).await;
        Ok(())
    }

    async fn add_tags(&self, hashes: &[String], tags: &[String]) -> ClientResult<()> {
        self.check("add_tags").await?;
        self.added_tags
            .write()
            .await
            .push((hashes.to_vec(), tags.to_vec()));
        self.apply_tags(hashes, tags).await;
        Ok(())
    }

    async fn categories(&self) -> ClientResult<BTreeMap<String, Category>> {
        self.check("categories").await?;
        Ok(self.categories.read().await.clone())
    }

    async fn create_category(&self, name: &str, save_path: &Path) -> ClientResult<()> {
        self.check("create_category").await?;
        self.created_categories
            .write()
            .await
            .push((name.to_string(), save_path.to_path_buf()));
        self.categories.write().await.insert(
            name.to_string(),
            Category {
                name: name.to_string(),
                save_path: save_path.to_path_buf(),
            },
        );
        Ok(())
    }

    async fn rss_rule_names(&self) -> ClientResult<Vec<String>> {
        self.check("rss_rule_names").await?;
        let mut names = self.rule_names.read().await.clone();
        names.extend(self.rules.read().await.iter().map(|(name, _)| name.clone()));
        Ok(names)
    }

    async fn set_rss_rule(&self, rule_name: &str, rule: &RssRuleDef) -> ClientResult<()> {
        self.check("set_rss_rule").await?;
        self.rules
            .write()
            .await
            .push((rule_name.to_string(), rule.clone()));
        Ok(())
    }

    async fn set_share_limits(&self, hashes: &[String], limits: ShareLimits) -> ClientResult<()> {
        self.check("set_share_limits").await?;
        self.share_limits
            .write()
            .await
            .push((hashes.to_vec(), limits));
        Ok(())
    }

    async fn set_upload_limit(&self, hashes: &[String], limit: i64) -> ClientResult<()> {
        self.check("set_upload_limit").await?;
        self.upload_limits
            .write()
            .await
            .push((hashes.to_vec(), limit));
        Ok(())
    }

    async fn top_priority(&self, hashes: &[String]) -> ClientResult<()> {
        self.check("top_priority").await?;
        self.promoted.write().await.push(hashes.to_vec());
        Ok(())
    }
}
