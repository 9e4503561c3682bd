//! Orchestrates one pass over the client's completed items.

use std::sync::Arc;

use chrono::Utc;
use stevedore_config::Settings;
use stevedore_qbit::{DownloadClient, Torrent, TorrentFilter};
use tracing::{debug, info, warn};

use crate::error::SweepResult;
use crate::reconcile::ReconcileRequest;
use crate::stage::{Classification, Stage, TAG_RECONCILED, TAG_SCANNED};
use crate::{finalize, genre, reconcile, rescan, stage};

/// Counts for one sweep pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Candidates examined: completed items no longer seeding.
    pub examined: usize,
    /// Items whose files were confirmed at the destination this pass.
    pub reconciled: usize,
    /// Items deleted from the client or tagged processed this pass.
    pub finalized: usize,
    /// Items included in this pass's library rescan batch.
    pub rescanned: usize,
    /// Items left for later: unresolved genre, too recent, already done,
    /// or held back by a per-item failure.
    pub skipped: usize,
}

/// Drives completed items through reconcile, finalize, and rescan.
pub struct Sweeper {
    settings: Arc<Settings>,
    client: Arc<dyn DownloadClient>,
}

impl Sweeper {
    /// Build a sweeper over shared settings and a client handle.
    #[must_use]
    pub fn new(settings: Arc<Settings>, client: Arc<dyn DownloadClient>) -> Self {
        Self { settings, client }
    }

    /// Run one full pass over the current client snapshot.
    ///
    /// # Errors
    /// Returns an error when the download client fails a call; filesystem
    /// trouble is scoped to the item it hit and only skips that item.
    pub async fn sweep(&self) -> SweepResult<SweepSummary> {
        let completed = self.client.torrents(TorrentFilter::Completed).await?;
        let seeding = self.client.torrents(TorrentFilter::Seeding).await?;
        let candidates = finished_candidates(completed, &seeding);

        let mut summary = SweepSummary {
            examined: candidates.len(),
            ..SweepSummary::default()
        };
        let now = Utc::now().timestamp();
        for torrent in &candidates {
            self.process_item(torrent, now, &mut summary).await?;
        }
        summary.rescanned = self.rescan_pending().await?;
        info!(
            examined = summary.examined,
            reconciled = summary.reconciled,
            finalized = summary.finalized,
            rescanned = summary.rescanned,
            skipped = summary.skipped,
            "sweep finished"
        );
        Ok(summary)
    }

    async fn process_item(
        &self,
        torrent: &Torrent,
        now: i64,
        summary: &mut SweepSummary,
    ) -> SweepResult<()> {
        let Some((genre_key, profile)) =
            genre::resolve(&self.settings, &torrent.category, &torrent.save_path)
        else {
            debug!(hash = %torrent.hash, name = %torrent.name, "no genre for item; leaving it alone");
            summary.skipped += 1;
            return Ok(());
        };

        let current = match stage::classify(torrent, now, self.settings.watch.ignore_age()) {
            Classification::TooRecent => {
                debug!(hash = %torrent.hash, name = %torrent.name, "completed too recently; deferring");
                summary.skipped += 1;
                return Ok(());
            }
            Classification::Finished => {
                summary.skipped += 1;
                return Ok(());
            }
            Classification::Eligible(current) => current,
        };

        if current == Stage::Unseen {
            let request = ReconcileRequest {
                content_path: &torrent.content_path,
                save_path: &torrent.save_path,
                destination: &profile.target_dir,
                keep_extensions: &profile.keep_extensions,
                preserve_structure: profile.preserve_structure,
            };
            let report = match reconcile::reconcile(&request) {
                Ok(report) => report,
                Err(err) if err.is_per_item() => {
                    warn!(
                        error = %err,
                        hash = %torrent.hash,
                        name = %torrent.name,
                        "reconcile failed; leaving item for the next pass"
                    );
                    summary.skipped += 1;
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            if !report.is_complete() {
                warn!(
                    hash = %torrent.hash,
                    name = %torrent.name,
                    expected = report.expected,
                    confirmed = report.confirmed,
                    "reconcile incomplete; leaving item for the next pass"
                );
                summary.skipped += 1;
                return Ok(());
            }
            self.client
                .add_tags(&[torrent.hash.clone()], &[TAG_RECONCILED.to_string()])
                .await?;
            info!(
                hash = %torrent.hash,
                name = %torrent.name,
                genre = genre_key,
                placed = report.confirmed,
                already_present = report.skipped_existing,
                "reconciled completed item"
            );
            summary.reconciled += 1;
        }

        finalize::finalize(self.client.as_ref(), torrent, genre_key, profile).await?;
        summary.finalized += 1;
        Ok(())
    }

    /// Collect unscanned items in rescan-enabled genres and scan them as
    /// one batch. Re-fetches the snapshot so items deleted during this
    /// pass drop out and freshly finalized ones are picked up.
    async fn rescan_pending(&self) -> SweepResult<usize> {
        let Some(rescan_settings) = self.settings.rescan.as_ref() else {
            return Ok(0);
        };
        let completed = self.client.torrents(TorrentFilter::Completed).await?;
        let pending: Vec<String> = completed
            .iter()
            .filter(|torrent| {
                genre::resolve(&self.settings, &torrent.category, &torrent.save_path)
                    .is_some_and(|(_, profile)| profile.scan_library)
                    && !torrent.tags.iter().any(|tag| tag == TAG_SCANNED)
            })
            .map(|torrent| torrent.hash.clone())
            .collect();
        if pending.is_empty() {
            debug!("no library rescan needed");
            return Ok(0);
        }
        let count = pending.len();
        rescan::rescan(self.client.as_ref(), rescan_settings, &pending).await?;
        Ok(count)
    }
}

fn finished_candidates(completed: Vec<Torrent>, seeding: &[Torrent]) -> Vec<Torrent> {
    completed
        .into_iter()
        .filter(|torrent| !seeding.iter().any(|seed| seed.hash == torrent.hash))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::Result;
    use stevedore_config::{ClientSettings, GenreProfile, RescanSettings, WatchSettings};
    use stevedore_qbit::ClientError;
    use stevedore_test_support::client::ScriptedClient;
    use stevedore_test_support::fixtures;
    use tempfile::TempDir;

    use super::*;
    use crate::error::SweepError;

    type TestResult<T> = Result<T>;

    fn temp_dir() -> TestResult<TempDir> {
        Ok(TempDir::new()?)
    }

    fn profile(target: &Path) -> GenreProfile {
        GenreProfile {
            target_dir: target.to_path_buf(),
            preserve_structure: false,
            keep_extensions: Vec::new(),
            scan_library: false,
            delete_from_client: false,
            on_done: None,
            rss: None,
        }
    }

    fn settings(genres: Vec<(&str, GenreProfile)>) -> Settings {
        Settings {
            client: ClientSettings {
                base_url: "http://localhost:8080".to_string(),
                username: "admin".to_string(),
                password: "adminadmin".to_string(),
                timeout_secs: 30,
            },
            watch: WatchSettings {
                incomplete_dir: PathBuf::from("/downloads/incomplete"),
                limits_settle_secs: 3,
                sweep_settle_secs: 30,
                sweep_interval_secs: 900,
                ignore_age_secs: 120,
            },
            rescan: None,
            genres: genres
                .into_iter()
                .map(|(key, profile)| (key.to_string(), profile))
                .collect(),
            limits: BTreeMap::new(),
        }
    }

    fn make_sweeper(
        settings: Settings,
        client: ScriptedClient,
    ) -> (Sweeper, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        let handle: Arc<dyn DownloadClient> = Arc::clone(&client) as Arc<dyn DownloadClient>;
        (Sweeper::new(Arc::new(settings), handle), client)
    }

    fn seed_content(save_path: &Path, name: &str) -> TestResult<()> {
        let content = save_path.join(name);
        fs::create_dir_all(&content)?;
        fs::write(content.join("episode.mkv"), "payload")?;
        Ok(())
    }

    #[tokio::test]
    async fn completed_item_is_reconciled_and_finalized() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        fs::create_dir_all(&save_path)?;
        seed_content(&save_path, "Show")?;

        let torrent = fixtures::torrent("aaa", "Show", &save_path, "tv");
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );

        let summary = sweeper.sweep().await?;

        assert_eq!(summary.examined, 1);
        assert_eq!(summary.reconciled, 1);
        assert_eq!(summary.finalized, 1);
        assert!(target.join("episode.mkv").is_file());
        assert!(!save_path.join("Show").exists());
        assert_eq!(
            client.added_tags().await,
            vec![
                (vec!["aaa".to_string()], vec!["Copied".to_string()]),
                (vec!["aaa".to_string()], vec!["Processed".to_string()]),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn still_seeding_items_are_not_candidates() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Show")?;

        let torrent = fixtures::torrent("aaa", "Show", &save_path, "tv");
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new()
                .with_completed(vec![torrent.clone()])
                .with_seeding(vec![torrent]),
        );

        let summary = sweeper.sweep().await?;

        assert_eq!(summary.examined, 0);
        assert!(client.added_tags().await.is_empty());
        assert!(save_path.join("Show/episode.mkv").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn fresh_completions_are_left_completely_untouched() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Show")?;

        let mut torrent = fixtures::torrent("aaa", "Show", &save_path, "tv");
        torrent.completion_on = Utc::now().timestamp() - 5;
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );

        let summary = sweeper.sweep().await?;

        assert_eq!(summary.skipped, 1);
        assert!(client.added_tags().await.is_empty());
        assert!(save_path.join("Show/episode.mkv").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn terminal_items_are_never_reprocessed() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Show")?;

        let torrent =
            fixtures::tagged_torrent("aaa", "Show", &save_path, "tv", &["Copied", "Processed"]);
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );

        let summary = sweeper.sweep().await?;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.finalized, 0);
        assert!(client.added_tags().await.is_empty());
        assert!(client.deleted().await.is_empty());
        assert!(
            save_path.join("Show/episode.mkv").is_file(),
            "files of finalized items stay put"
        );
        Ok(())
    }

    #[tokio::test]
    async fn second_pass_changes_nothing() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Show")?;

        let torrent = fixtures::torrent("aaa", "Show", &save_path, "tv");
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );

        sweeper.sweep().await?;
        let tag_calls = client.added_tags().await.len();
        let summary = sweeper.sweep().await?;

        assert_eq!(client.added_tags().await.len(), tag_calls);
        assert_eq!(summary.reconciled, 0);
        assert_eq!(summary.finalized, 0);
        Ok(())
    }

    #[tokio::test]
    async fn delete_genres_remove_the_record() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Show")?;

        let mut genre = profile(&target);
        genre.delete_from_client = true;
        let torrent = fixtures::torrent("aaa", "Show", &save_path, "tv");
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", genre)]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );

        sweeper.sweep().await?;

        assert_eq!(
            client.deleted().await,
            vec![(vec!["aaa".to_string()], false)]
        );
        assert_eq!(client.added_tags().await.len(), 1, "only the Copied tag");

        // The record is gone, so another pass has nothing to do.
        let summary = sweeper.sweep().await?;
        assert_eq!(summary.examined, 0);
        Ok(())
    }

    #[tokio::test]
    async fn unmatched_genre_items_are_left_alone() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Mystery")?;

        let torrent = fixtures::torrent("aaa", "Mystery", &save_path, "misc");
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );

        let summary = sweeper.sweep().await?;

        assert_eq!(summary.skipped, 1);
        assert!(client.added_tags().await.is_empty());
        assert!(save_path.join("Mystery/episode.mkv").is_file());
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn per_item_failure_skips_only_that_item() -> TestResult<()> {
        use std::os::unix::fs::PermissionsExt;

        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Broken")?;
        seed_content(&save_path, "Fine")?;
        let broken = save_path.join("Broken");
        fs::set_permissions(&broken, fs::Permissions::from_mode(0o000))?;

        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![
                fixtures::torrent("bad", "Broken", &save_path, "tv"),
                fixtures::torrent("good", "Fine", &save_path, "tv"),
            ]),
        );

        let summary = sweeper.sweep().await?;
        fs::set_permissions(&broken, fs::Permissions::from_mode(0o755))?;

        assert_eq!(summary.reconciled, 1);
        assert_eq!(summary.skipped, 1);
        let tagged: Vec<String> = client
            .added_tags()
            .await
            .into_iter()
            .flat_map(|(hashes, _)| hashes)
            .collect();
        assert!(tagged.iter().all(|hash| hash == "good"));
        Ok(())
    }

    #[tokio::test]
    async fn client_failure_aborts_the_pass() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        seed_content(&save_path, "Show")?;

        let torrent = fixtures::torrent("aaa", "Show", &save_path, "tv");
        let (sweeper, client) = make_sweeper(
            settings(vec![("tv", profile(&target))]),
            ScriptedClient::new().with_completed(vec![torrent]),
        );
        client.fail_on("add_tags").await;

        let result = sweeper.sweep().await;
        assert!(matches!(
            result,
            Err(SweepError::Client {
                source: ClientError::Status { .. }
            })
        ));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rescan_runs_once_per_batch_and_only_once_ever() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let target = root.path().join("library");
        let log = root.path().join("scan.log");

        let mut genre = profile(&target);
        genre.scan_library = true;
        let mut cfg = settings(vec![("tv", genre)]);
        cfg.rescan = Some(RescanSettings {
            command: vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                format!("echo scanned >> {}", log.display()),
            ],
            up_to_date_marker: None,
        });

        // Both items already finalized; only the rescan is outstanding.
        let (sweeper, client) = make_sweeper(
            cfg,
            ScriptedClient::new().with_completed(vec![
                fixtures::tagged_torrent("aaa", "One", &save_path, "tv", &["Processed"]),
                fixtures::tagged_torrent("bbb", "Two", &save_path, "tv", &["Processed"]),
            ]),
        );

        let summary = sweeper.sweep().await?;
        assert_eq!(summary.rescanned, 2);
        assert_eq!(fs::read_to_string(&log)?.lines().count(), 1);
        assert_eq!(
            client.added_tags().await,
            vec![(
                vec!["aaa".to_string(), "bbb".to_string()],
                vec!["Scanned".to_string()]
            )]
        );

        let summary = sweeper.sweep().await?;
        assert_eq!(summary.rescanned, 0);
        assert_eq!(fs::read_to_string(&log)?.lines().count(), 1);
        Ok(())
    }
}
