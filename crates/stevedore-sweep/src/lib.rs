#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::redundant_pub_crate
)]

//! Post-completion pipeline for tracked downloads.
//!
//! One pass classifies every finished item against its genre and tag state,
//! places its files at the genre destination, applies the terminal client
//! mutation, and batches a library rescan. All workflow state lives in the
//! client's tags, so a pass can be repeated or interrupted at any point.

mod driver;
mod error;
mod finalize;
mod genre;
mod limits;
mod provision;
mod reconcile;
mod rescan;
mod stage;

pub use driver::{SweepSummary, Sweeper};
pub use error::{SweepError, SweepResult};
pub use limits::apply_limits;
pub use provision::{ensure_category, ensure_rule};
pub use reconcile::{ReconcileReport, ReconcileRequest, reconcile};
pub use stage::{Classification, Stage, TAG_FINALIZED, TAG_RECONCILED, TAG_SCANNED, classify};
