//! Tag-derived processing state for completed items.
//!
//! The external client's free-form tags are the only persisted state, so
//! the stage is recomputed from them on every pass; the constants below are
//! the serialization format.

use std::time::Duration;

use stevedore_qbit::Torrent;

/// Tag recording that an item's files are confirmed at the destination.
pub const TAG_RECONCILED: &str = "Copied";
/// Tag recording that the item's client-side lifecycle is finished.
pub const TAG_FINALIZED: &str = "Processed";
/// Tag recording that the item was part of a library rescan batch.
pub const TAG_SCANNED: &str = "Scanned";

/// Where an item sits in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// No pipeline tags yet; files still need reconciling.
    Unseen,
    /// Files placed at the destination, terminal mutation pending.
    Reconciled,
    /// Terminal client mutation done.
    Finalized,
    /// Finalized and included in a library rescan.
    Scanned,
}

impl Stage {
    /// Derive the stage from an item's tag set.
    ///
    /// A scan tag alone does not advance the stage: rescan eligibility is
    /// tracked independently of the reconcile/finalize ladder.
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Self {
        let finalized = tags.iter().any(|tag| tag == TAG_FINALIZED);
        if finalized && tags.iter().any(|tag| tag == TAG_SCANNED) {
            return Self::Scanned;
        }
        if finalized {
            return Self::Finalized;
        }
        if tags.iter().any(|tag| tag == TAG_RECONCILED) {
            return Self::Reconciled;
        }
        Self::Unseen
    }

    /// Whether the stage admits no further file or client mutation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Scanned)
    }
}

/// Eligibility decision for one completed item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Completed too recently; retry on a later pass.
    TooRecent,
    /// Already finalized; nothing left to do.
    Finished,
    /// Ready for processing at the given stage.
    Eligible(Stage),
}

/// Classify one completed item against the age guard and its tag state.
///
/// The age guard comes first: items younger than `ignore_age` are left
/// completely untouched regardless of their tags, so a pass racing the
/// client's own completion bookkeeping cannot half-process them.
#[must_use]
pub fn classify(torrent: &Torrent, now: i64, ignore_age: Duration) -> Classification {
    let age = now.saturating_sub(torrent.completion_on);
    let threshold = i64::try_from(ignore_age.as_secs()).unwrap_or(i64::MAX);
    if age < threshold {
        return Classification::TooRecent;
    }
    let stage = Stage::from_tags(&torrent.tags);
    if stage.is_terminal() {
        return Classification::Finished;
    }
    Classification::Eligible(stage)
}
