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

//! qBittorrent Web API v2 client surface.
//!
//! The pipeline talks to the download client exclusively through the
//! [`DownloadClient`] trait so tests can inject a scripted fake;
//! [`QbitClient`] is the production implementation speaking the v2 wire
//! protocol with a session cookie. Field names and join separators follow
//! the client's contract exactly.

mod client;
mod error;
mod http;
mod model;

pub use client::DownloadClient;
pub use error::{ClientError, ClientResult};
pub use http::QbitClient;
pub use model::{Category, RssRuleDef, ShareLimits, Torrent, TorrentFilter, TrackerEntry};
