//! Share-limit assignment for new, untagged downloads.

use std::collections::BTreeMap;

use stevedore_config::{DEFAULT_LIMIT_GROUP, LimitGroup, Settings};
use stevedore_qbit::{DownloadClient, ShareLimits, TorrentFilter};
use tracing::{debug, info};

use crate::error::SweepResult;

/// Assign config-driven share limits to downloading items with no tags.
///
/// A group's tags double as its claim marker: once applied, the item is no
/// longer untagged and later passes leave it alone. Matching order per
/// item: tracker URL substrings across every group first, then the item's
/// category against each group's category list, then the default group.
///
/// # Errors
/// Returns an error when the client rejects a call. Limit groups are
/// optional; without any configured this is a no-op.
pub async fn apply_limits(client: &dyn DownloadClient, settings: &Settings) -> SweepResult<()> {
    if settings.limits.is_empty() {
        debug!("no limit groups configured");
        return Ok(());
    }
    let downloading = client.torrents(TorrentFilter::Downloading).await?;
    let mut claims: BTreeMap<&str, (Vec<String>, Vec<String>)> = BTreeMap::new();
    for torrent in &downloading {
        if !torrent.tags.is_empty() {
            continue;
        }
        let Some(group) = match_group(client, settings, &torrent.hash, &torrent.category).await?
        else {
            continue;
        };
        let (hashes, names) = claims.entry(group).or_default();
        hashes.push(torrent.hash.clone());
        names.push(torrent.name.clone());
    }

    for (name, (hashes, names)) in claims {
        let Some(group) = settings.limits.get(name) else {
            continue;
        };
        apply_group(client, name, group, &hashes).await?;
        info!(group = name, items = ?names, "share limits assigned");
    }
    Ok(())
}

/// Pick the first group whose tracker substrings match one of the item's
/// announce URLs; fall back to category lists, then the default group.
async fn match_group<'a>(
    client: &dyn DownloadClient,
    settings: &'a Settings,
    hash: &str,
    category: &str,
) -> SweepResult<Option<&'a str>> {
    let trackers = client.trackers(hash).await?;
    for (name, group) in &settings.limits {
        let matched = group.tracker_contains.iter().any(|needle| {
            trackers
                .iter()
                .any(|tracker| tracker.url.contains(needle.as_str()))
        });
        if matched {
            return Ok(Some(name.as_str()));
        }
    }
    for (name, group) in &settings.limits {
        if group.categories.iter().any(|label| label == category) {
            return Ok(Some(name.as_str()));
        }
    }
    Ok(settings
        .limits
        .get_key_value(DEFAULT_LIMIT_GROUP)
        .map(|(name, _)| name.as_str()))
}

async fn apply_group(
    client: &dyn DownloadClient,
    name: &str,
    group: &LimitGroup,
    hashes: &[String],
) -> SweepResult<()> {
    client
        .set_share_limits(
            hashes,
            ShareLimits {
                ratio_limit: group.ratio_limit,
                seeding_time_limit: group.seeding_time_limit,
            },
        )
        .await?;
    client.set_upload_limit(hashes, group.upload_limit).await?;
    client.add_tags(hashes, &group.tags).await?;
    if group.top_priority {
        client.top_priority(hashes).await?;
        info!(group = name, "promoted claimed items to the top of the queue");
    }
    Ok(())
}
