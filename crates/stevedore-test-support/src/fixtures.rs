//! Builders for tracked-item fixtures.

use std::path::Path;

use chrono::Utc;
use stevedore_qbit::Torrent;

/// Build a completed torrent whose content lives at `save_path/name`.
///
/// The completion timestamp is backdated one hour so fixtures pass the age
/// guard by default; tests exercising the guard override `completion_on`.
#[must_use]
pub fn torrent(hash: &str, name: &str, save_path: &Path, category: &str) -> Torrent {
    Torrent {
        hash: hash.to_string(),
        name: name.to_string(),
        content_path: save_path.join(name),
        save_path: save_path.to_path_buf(),
        category: category.to_string(),
        tags: Vec::new(),
        completion_on: Utc::now().timestamp() - 3600,
    }
}

/// Same as [`torrent`] with tags already applied.
#[must_use]
pub fn tagged_torrent(
    hash: &str,
    name: &str,
    save_path: &Path,
    category: &str,
    tags: &[&str],
) -> Torrent {
    let mut item = torrent(hash, name, save_path, category);
    item.tags = tags.iter().map(|tag| (*tag).to_string()).collect();
    item
}
