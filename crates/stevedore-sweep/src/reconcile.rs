//! Places completed files at their genre destination.
//!
//! Reconciliation is a move expressed as hardlink-or-copy plus source
//! removal: a file's source is only deleted once its destination copy is
//! confirmed on disk, and existing destination files are never overwritten.
//! Rerunning over a partially moved tree converges because already-placed
//! files count as confirmed and their sources are cleaned up.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{SweepError, SweepResult};

/// One item's file-placement work order.
#[derive(Debug)]
pub struct ReconcileRequest<'a> {
    /// Root of the item's content on disk; a file for single-file items.
    pub content_path: &'a Path,
    /// Directory the client downloaded into. Never removed.
    pub save_path: &'a Path,
    /// Genre destination directory.
    pub destination: &'a Path,
    /// Suffixes of files worth keeping; empty keeps everything.
    pub keep_extensions: &'a [String],
    /// Mirror the source layout under the destination instead of
    /// flattening every file into the destination root.
    pub preserve_structure: bool,
}

/// Outcome counts for one reconciliation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files selected for placement.
    pub expected: usize,
    /// Files confirmed present at the destination afterwards.
    pub confirmed: usize,
    /// Subset of `confirmed` that was already present beforehand.
    pub skipped_existing: usize,
}

impl ReconcileReport {
    /// Whether every selected file is accounted for at the destination.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.confirmed >= self.expected
    }
}

/// Move an item's files into the destination layout.
///
/// A missing content root yields an empty report: the files were disposed
/// of earlier (or by hand) and the item can advance.
///
/// # Errors
/// Returns an error when the source tree cannot be walked or a file cannot
/// be placed; the partial placement stands and a rerun picks up the rest.
pub fn reconcile(request: &ReconcileRequest<'_>) -> SweepResult<ReconcileReport> {
    if request.content_path.is_file() {
        return reconcile_single(request);
    }
    if !request.content_path.is_dir() {
        debug!(
            path = %request.content_path.display(),
            "content root missing; nothing left to reconcile"
        );
        return Ok(ReconcileReport::default());
    }
    reconcile_tree(request)
}

/// Single-file items skip the extension filter: the filter exists to strip
/// packaging noise out of multi-file trees, and a lone file is the payload.
fn reconcile_single(request: &ReconcileRequest<'_>) -> SweepResult<ReconcileReport> {
    let Some(name) = request.content_path.file_name() else {
        warn!(path = %request.content_path.display(), "content path has no file name");
        return Ok(ReconcileReport::default());
    };
    let mut report = ReconcileReport {
        expected: 1,
        ..ReconcileReport::default()
    };
    place_file(
        request.content_path,
        &request.destination.join(name),
        &mut report,
    )?;
    if let Some(parent) = request.content_path.parent() {
        if parent != request.save_path {
            remove_dir_if_empty(parent);
        }
    }
    Ok(report)
}

fn reconcile_tree(request: &ReconcileRequest<'_>) -> SweepResult<ReconcileReport> {
    if !request.keep_extensions.is_empty() {
        prune_extensions(request.content_path, request.keep_extensions)?;
    }
    let files = collect_files(request.content_path)?;
    let mut report = ReconcileReport {
        expected: files.len(),
        ..ReconcileReport::default()
    };
    for file in &files {
        let destination = if request.preserve_structure {
            match file.strip_prefix(request.content_path) {
                Ok(relative) => request.destination.join(relative),
                Err(_) => {
                    warn!(path = %file.display(), "file escaped the content root; skipping");
                    continue;
                }
            }
        } else {
            let Some(name) = file.file_name() else {
                continue;
            };
            request.destination.join(name)
        };
        place_file(file, &destination, &mut report)?;
    }
    remove_empty_dirs(request.content_path)?;
    if request.content_path != request.save_path {
        remove_dir_if_empty(request.content_path);
    }
    Ok(report)
}

/// Place one file, preferring a hardlink and falling back to a copy. The
/// source is removed only after the destination is confirmed present.
fn place_file(
    source: &Path,
    destination: &Path,
    report: &mut ReconcileReport,
) -> SweepResult<()> {
    if destination.exists() {
        debug!(
            path = %destination.display(),
            "destination already present; leaving source in place"
        );
        report.skipped_existing += 1;
        report.confirmed += 1;
        return Ok(());
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| SweepError::io("reconcile.create_parent", parent, err))?;
    }
    match fs::hard_link(source, destination) {
        Ok(()) => debug!(path = %destination.display(), "hardlinked file"),
        Err(link_err) => {
            debug!(
                error = %link_err,
                path = %source.display(),
                "hardlink failed; copying instead"
            );
            fs::copy(source, destination)
                .map_err(|err| SweepError::io("reconcile.copy", source, err))?;
        }
    }
    if destination.exists() {
        report.confirmed += 1;
        if let Err(err) = fs::remove_file(source) {
            warn!(
                error = %err,
                path = %source.display(),
                "placed file but could not remove its source"
            );
        }
    } else {
        warn!(path = %destination.display(), "placed file is missing at the destination");
    }
    Ok(())
}

/// Delete files whose names do not end in one of the configured suffixes.
/// Matching is a case-sensitive suffix test, same as the client's own
/// extension handling.
fn prune_extensions(root: &Path, keep: &[String]) -> SweepResult<()> {
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = entry.map_err(|err| SweepError::walk(root, err))?;
        if !entry.file_type().is_file() || matches_extension(entry.path(), keep) {
            continue;
        }
        fs::remove_file(entry.path())
            .map_err(|err| SweepError::io("reconcile.prune", entry.path(), err))?;
        debug!(path = %entry.path().display(), "removed file outside the keep list");
    }
    Ok(())
}

fn matches_extension(path: &Path, keep: &[String]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| keep.iter().any(|ext| name.ends_with(ext.as_str())))
}

fn collect_files(root: &Path) -> SweepResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| SweepError::walk(root, err))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Remove now-empty directories under `root`, deepest first. The root
/// itself is the caller's call.
fn remove_empty_dirs(root: &Path) -> SweepResult<()> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|err| SweepError::walk(root, err))?;
        if entry.file_type().is_dir() {
            dirs.push(entry);
        }
    }
    dirs.sort_by_key(DirEntry::depth);
    for dir in dirs.into_iter().rev() {
        remove_dir_if_empty(dir.path());
    }
    Ok(())
}

fn remove_dir_if_empty(path: &Path) {
    let empty = match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(err) => {
            warn!(error = %err, path = %path.display(), "failed to inspect directory");
            return;
        }
    };
    if !empty {
        return;
    }
    match fs::remove_dir(path) {
        Ok(()) => debug!(path = %path.display(), "removed empty directory"),
        Err(err) => {
            warn!(error = %err, path = %path.display(), "failed to remove empty directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use tempfile::TempDir;

    use super::*;

    type TestResult<T> = Result<T>;

    fn temp_dir() -> TestResult<TempDir> {
        Ok(TempDir::new()?)
    }

    fn write_file(path: &Path, contents: &str) -> TestResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn extensions(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn flatten_moves_files_into_destination_root() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("Show");
        let destination = root.path().join("library");
        write_file(&content.join("Season 1/e1.mkv"), "one")?;
        write_file(&content.join("Season 1/Extras/e2.mkv"), "two")?;
        fs::create_dir_all(&destination)?;

        let report = reconcile(&ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &[],
            preserve_structure: false,
        })?;

        assert_eq!(report.expected, 2);
        assert_eq!(report.confirmed, 2);
        assert_eq!(report.skipped_existing, 0);
        assert!(report.is_complete());
        assert!(destination.join("e1.mkv").is_file());
        assert!(destination.join("e2.mkv").is_file());
        assert!(!content.exists(), "content root should be cleaned up");
        assert!(save_path.is_dir(), "save path must survive");
        Ok(())
    }

    #[test]
    fn preserve_keeps_the_relative_layout() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("source");
        let destination = root.path().join("library");
        write_file(&content.join("X/Y/movie.mkv"), "payload")?;
        fs::create_dir_all(&destination)?;

        let report = reconcile(&ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &[],
            preserve_structure: true,
        })?;

        assert_eq!(report.confirmed, 1);
        assert!(destination.join("X/Y/movie.mkv").is_file());
        assert!(!content.exists());
        Ok(())
    }

    #[test]
    fn existing_destination_files_are_never_overwritten() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("Show");
        let destination = root.path().join("library");
        write_file(&content.join("poster.jpg"), "new poster")?;
        write_file(&destination.join("poster.jpg"), "original poster")?;

        let report = reconcile(&ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &[],
            preserve_structure: false,
        })?;

        assert_eq!(report.expected, 1);
        assert_eq!(report.confirmed, 1);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(
            fs::read_to_string(destination.join("poster.jpg"))?,
            "original poster"
        );
        // The colliding source stays put, so its directory survives too.
        assert!(content.join("poster.jpg").is_file());
        Ok(())
    }

    #[test]
    fn extension_filter_prunes_before_placing() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("Show");
        let destination = root.path().join("library");
        write_file(&content.join("a.mkv"), "keep")?;
        write_file(&content.join("b.nfo"), "drop")?;
        write_file(&content.join("Sample/c.txt"), "drop")?;

        let report = reconcile(&ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &extensions(&[".mkv"]),
            preserve_structure: false,
        })?;

        assert_eq!(report.expected, 1);
        assert_eq!(report.confirmed, 1);
        assert!(destination.join("a.mkv").is_file());
        assert!(!destination.join("b.nfo").exists());
        assert!(!destination.join("c.txt").exists());
        assert!(!content.exists(), "pruned tree should be cleaned up");
        Ok(())
    }

    #[test]
    fn single_file_bypasses_the_extension_filter() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("lone.rar");
        let destination = root.path().join("library");
        write_file(&content, "archive")?;
        fs::create_dir_all(&destination)?;

        let report = reconcile(&ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &extensions(&[".mkv"]),
            preserve_structure: false,
        })?;

        assert_eq!(report.confirmed, 1);
        assert!(destination.join("lone.rar").is_file());
        assert!(!content.exists());
        assert!(save_path.is_dir(), "save path is never removed");
        Ok(())
    }

    #[test]
    fn missing_content_root_reports_nothing_to_do() -> TestResult<()> {
        let root = temp_dir()?;
        let report = reconcile(&ReconcileRequest {
            content_path: &root.path().join("gone"),
            save_path: root.path(),
            destination: &root.path().join("library"),
            keep_extensions: &[],
            preserve_structure: false,
        })?;
        assert_eq!(report, ReconcileReport::default());
        assert!(report.is_complete());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn placement_prefers_hardlinks() -> TestResult<()> {
        use std::os::unix::fs::MetadataExt;

        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("Show");
        let destination = root.path().join("library");
        write_file(&content.join("a.mkv"), "payload")?;
        // A second link lets us prove the inode survived the move.
        let keeper = root.path().join("keeper.mkv");
        fs::hard_link(content.join("a.mkv"), &keeper)?;

        reconcile(&ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &[],
            preserve_structure: false,
        })?;

        let placed = fs::metadata(destination.join("a.mkv"))?;
        let kept = fs::metadata(&keeper)?;
        assert_eq!(placed.ino(), kept.ino());
        assert_eq!(placed.nlink(), 2);
        Ok(())
    }

    #[test]
    fn rerun_after_partial_placement_converges() -> TestResult<()> {
        let root = temp_dir()?;
        let save_path = root.path().join("downloads");
        let content = save_path.join("Show");
        let destination = root.path().join("library");
        write_file(&content.join("a.mkv"), "one")?;
        write_file(&content.join("b.mkv"), "two")?;
        // Simulate an interrupted earlier pass that placed one file but
        // did not get to remove its source.
        write_file(&destination.join("a.mkv"), "one")?;

        let request = ReconcileRequest {
            content_path: &content,
            save_path: &save_path,
            destination: &destination,
            keep_extensions: &[],
            preserve_structure: false,
        };
        let report = reconcile(&request)?;
        assert_eq!(report.expected, 2);
        assert_eq!(report.confirmed, 2);
        assert_eq!(report.skipped_existing, 1);
        assert!(destination.join("b.mkv").is_file());
        Ok(())
    }
}
